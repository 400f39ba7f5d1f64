//! HTTP boundary: `POST /probe`, `GET /history` and `GET /api/ok`.

pub mod response;
pub mod routes;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::Request;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;

pub use routes::{AppState, handle};

/// Pause after a failed `accept()` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid bind address {0:?}")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Pad or truncate `input` to exactly `width` display columns.
pub fn to_fixed_width(input: &str, width: usize) -> String {
    use unicode_truncate::UnicodeTruncateStr;

    let (truncated, _) = input.unicode_truncate(width);
    format!("{:<width$}", truncated, width = width)
}

pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|_| ServerError::InvalidAddress(addr.to_string()))?;
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Accept connections until `shutdown` resolves. Each connection is served on
/// its own task; in-flight probes keep running after the accept loop stops.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        // Errors such as EMFILE persist; back off instead of spinning.
                        log::warn!("Failed to accept connection: {e}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };

                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        handle(Arc::clone(&state), req)
                    });
                    if let Err(e) = auto::Builder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        log::debug!("Connection from {peer} ended with error: {e}");
                    }
                });
            }
            _ = &mut shutdown => {
                log::info!("Shutdown requested, no longer accepting connections");
                break;
            }
        }
    }
}
