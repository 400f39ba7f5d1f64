use std::sync::Arc;

use latencybox::config::load_config;
use latencybox::server::{self, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; it only supplies overrides.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let app_config = load_config()?;
    if let Some(source) = &app_config.source {
        log::info!("Loaded configuration from {source}");
    }
    let config = app_config.config;

    let state = Arc::new(AppState::new(&config)?);
    let recorder = state.recorder.clone();

    let listener = server::bind(&config.server.bind).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    server::serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await;

    if let Some(recorder) = recorder {
        let pending = recorder.pending();
        if pending > 0 {
            log::info!("Waiting for {pending} history writes");
        }
        recorder.drain().await;
    }

    log::info!("Stopped");
    Ok(())
}
