use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 2567;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 1 and 65535, got {0:?}")]
    InvalidPort(String),
    #[error("STATIC_DIR {0} does not contain index.html")]
    MissingIndex(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            None => DEFAULT_PORT,
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => return Err(ConfigError::InvalidPort(raw)),
            },
        };

        let static_dir = match lookup("STATIC_DIR") {
            Some(raw) => {
                let path = PathBuf::from(raw);
                if !path.join("index.html").is_file() {
                    return Err(ConfigError::MissingIndex(path));
                }
                Some(path)
            }
            None => probe_static_dir(),
        };

        let log_filter = lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            port,
            static_dir,
            log_filter,
        })
    }
}

fn probe_static_dir() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("dist/client"),
        PathBuf::from("../../dist/client"),
    ];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).expect("defaults are valid");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn port_and_log_filter_are_read() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("PORT", " 8080 "), ("RUST_LOG", "debug")]))
                .expect("config should parse");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn invalid_port_is_an_error() {
        for raw in ["abc", "0", "70000", "-1"] {
            let result = ServerConfig::from_lookup(lookup_from(&[("PORT", raw)]));
            assert!(matches!(result, Err(ConfigError::InvalidPort(_))), "{raw}");
        }
    }

    #[test]
    fn static_dir_without_index_is_an_error() {
        let dir = std::env::temp_dir().join(format!(
            "treechop-config-test-{}",
            std::process::id()
        ));
        let result = ServerConfig::from_lookup(lookup_from(&[(
            "STATIC_DIR",
            dir.to_string_lossy().as_ref(),
        )]));
        assert!(matches!(result, Err(ConfigError::MissingIndex(_))));
    }

    #[test]
    fn static_dir_with_index_is_accepted() {
        let dir = std::env::temp_dir().join(format!(
            "treechop-config-index-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        std::fs::write(dir.join("index.html"), "<html></html>").expect("write index");
        let result = ServerConfig::from_lookup(lookup_from(&[(
            "STATIC_DIR",
            dir.to_string_lossy().as_ref(),
        )]));
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(result.expect("config should parse").static_dir, Some(dir));
    }
}
