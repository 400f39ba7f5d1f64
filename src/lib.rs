//! latencybox - HTTP latency probing with a bounded per-target history.
//!
//! - [`validator`]: refuses loopback, private, metadata and IPv4-literal targets
//! - [`http_probe`]: one GET under a deadline, measuring TTFB and total time
//! - [`history`]: the last 200 samples per canonical URL
//! - [`server`]: the JSON HTTP boundary wiring the three together

pub mod config;
pub mod history;
pub mod http_probe;
pub mod server;
pub mod validator;
