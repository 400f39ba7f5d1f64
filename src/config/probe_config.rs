use std::time::Duration;

use serde::Deserialize;

/// Default deadline for a single probe.
pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;

/// Largest response body a probe will read before giving up.
pub const DEFAULT_MAX_BYTES: u64 = 1_000_000;

/// The configuration file for the latencybox service.
/// Every section is optional; missing keys fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Where the HTTP boundary listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8787`.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Settings for the outbound probe client.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Deadline in milliseconds covering headers and the full body.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Body size cap in bytes, counted while streaming.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Run every redirect hop through the target validator.
    /// When disabled, redirects are followed without inspection.
    #[serde(default = "default_true")]
    pub revalidate_redirects: bool,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            user_agent: default_user_agent(),
            revalidate_redirects: true,
            max_redirects: default_max_redirects(),
        }
    }
}

/// Settings for the in-memory history window.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// When false the history store is not created and `/history` answers 501.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Number of samples returned when the caller gives no usable `limit`.
    #[serde(default = "default_history_limit")]
    pub default_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_limit: default_history_limit(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8787".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

fn default_user_agent() -> String {
    format!("latencybox/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

fn default_max_redirects() -> usize {
    10
}

fn default_history_limit() -> usize {
    25
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind, "0.0.0.0:8787");
        assert_eq!(config.probe.timeout_ms, 8_000);
        assert_eq!(config.probe.max_bytes, 1_000_000);
        assert!(config.probe.revalidate_redirects);
        assert_eq!(config.probe.max_redirects, 10);
        assert!(config.history.enabled);
        assert_eq!(config.history.default_limit, 25);
        assert!(config.probe.user_agent.starts_with("latencybox/"));
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
                    server:
                        bind: 127.0.0.1:9000
                    probe:
                        timeout_ms: 2500
                        revalidate_redirects: false
                    history:
                        enabled: false
                                    "#;

        let config: Config = serde_yaml::from_str(yaml).expect("Invalid YAML");
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.probe.timeout_ms, 2500);
        assert_eq!(config.probe.timeout(), Duration::from_millis(2500));
        assert!(!config.probe.revalidate_redirects);
        // untouched keys keep their defaults
        assert_eq!(config.probe.max_bytes, 1_000_000);
        assert!(!config.history.enabled);
        assert_eq!(config.history.default_limit, 25);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").expect("Invalid YAML");
        assert_eq!(config.probe.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.history.enabled);
    }
}
