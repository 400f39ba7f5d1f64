use std::env;
use std::str::FromStr;

use super::probe_config::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    Override { key: &'static str, value: String },
}

pub struct AppConfig {
    pub config: Config,
    /// The file the configuration was read from, if one existed.
    pub source: Option<String>,
}

/// Load the application configuration from a YAML file and environment variables
/// This function reads the configuration file specified by the `CONFIG_FILE` environment variable,
/// parses it into a `Config` struct, and overrides certain values with environment variables.
/// A missing file is not an error; the defaults are used instead.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let config_file_location =
        env::var("CONFIG_FILE").unwrap_or_else(|_| "config.yml".to_string());

    let (config, source) = match std::fs::read_to_string(&config_file_location) {
        Ok(config_str) => {
            let config = parse_config(&config_str, &config_file_location)?;
            (config, Some(config_file_location))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No config file at {config_file_location}, using defaults");
            (Config::default(), None)
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: config_file_location,
                source,
            });
        }
    };

    let config = apply_overrides(config, |key| env::var(key).ok())?;

    log::info!(
        "Probe timeout: {}ms, max body: {} bytes, history: {}",
        config.probe.timeout_ms,
        config.probe.max_bytes,
        if config.history.enabled { "enabled" } else { "disabled" }
    );

    Ok(AppConfig { config, source })
}

fn parse_config(config_str: &str, path: &str) -> Result<Config, ConfigError> {
    // An empty file deserializes to YAML null; treat it as "all defaults".
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(config_str).map_err(|source| ConfigError::Yaml {
        path: path.to_string(),
        source,
    })
}

/// Apply environment overrides on top of the file configuration.
/// `lookup` is `std::env::var` in production and a map in tests.
pub fn apply_overrides<F>(mut config: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bind) = lookup("BIND_ADDRESS") {
        config.server.bind = bind.trim().to_string();
    }
    if let Some(value) = lookup("PROBE_TIMEOUT_MS") {
        config.probe.timeout_ms = parse_override("PROBE_TIMEOUT_MS", &value)?;
    }
    if let Some(value) = lookup("PROBE_MAX_BYTES") {
        config.probe.max_bytes = parse_override("PROBE_MAX_BYTES", &value)?;
    }
    if let Some(value) = lookup("HISTORY_ENABLED") {
        config.history.enabled = parse_override("HISTORY_ENABLED", &value)?;
    }
    Ok(config)
}

fn parse_override<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Override {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let config = apply_overrides(
            Config::default(),
            lookup_from(&[
                ("BIND_ADDRESS", " 127.0.0.1:1234 "),
                ("PROBE_TIMEOUT_MS", "1500"),
                ("HISTORY_ENABLED", "false"),
            ]),
        )
        .expect("overrides should apply");

        assert_eq!(config.server.bind, "127.0.0.1:1234");
        assert_eq!(config.probe.timeout_ms, 1500);
        assert_eq!(config.probe.max_bytes, 1_000_000);
        assert!(!config.history.enabled);
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let err = apply_overrides(
            Config::default(),
            lookup_from(&[("PROBE_MAX_BYTES", "lots")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Override {
                key: "PROBE_MAX_BYTES",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_config_rejects_bad_yaml() {
        let err = parse_config("probe: [unterminated", "bad.yml").unwrap_err();
        assert!(err.to_string().contains("bad.yml"));
    }

    #[test]
    fn test_parse_config_accepts_empty_file() {
        let config = parse_config("\n", "empty.yml").expect("empty file is fine");
        assert_eq!(config.probe.timeout_ms, 8_000);
    }
}
