pub mod app_config;
pub mod probe_config;

pub use app_config::{AppConfig, ConfigError, load_config};
pub use probe_config::{Config, HistoryConfig, ProbeConfig, ServerConfig};
