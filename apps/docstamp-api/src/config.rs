//! Server configuration from environment variables

use std::path::PathBuf;

use docstamp_core::SigningOptions;
use tracing::warn;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    /// Directory documents are stored in and served from
    pub upload_dir: PathBuf,
    /// Request body limit for uploads and signature payloads
    pub max_upload_bytes: usize,
    /// Allowed CORS origins; empty allows any origin (`CORS_ORIGINS=*`)
    pub cors_origins: Vec<String>,
    pub signing: SigningOptions,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            signing: SigningOptions::default(),
        }
    }
}

impl ApiConfig {
    /// Read `PORT`, `UPLOAD_DIR`, `MAX_UPLOAD_BYTES` and `CORS_ORIGINS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = parse_or("PORT", lookup("PORT"), defaults.port);
        let max_upload_bytes = match parse_or(
            "MAX_UPLOAD_BYTES",
            lookup("MAX_UPLOAD_BYTES"),
            defaults.max_upload_bytes,
        ) {
            0 => {
                warn!("MAX_UPLOAD_BYTES must be positive, using {}", DEFAULT_MAX_UPLOAD_BYTES);
                DEFAULT_MAX_UPLOAD_BYTES
            }
            n => n,
        };
        let upload_dir = lookup("UPLOAD_DIR")
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);
        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(origins) if origins.trim() == "*" => Vec::new(),
            Some(origins) => {
                let list: Vec<String> = origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect();
                if list.is_empty() {
                    defaults.cors_origins
                } else {
                    list
                }
            }
            None => defaults.cors_origins,
        };

        Self {
            port,
            upload_dir,
            max_upload_bytes,
            cors_origins,
            signing: defaults.signing,
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid {}={:?}, using {}", key, raw, default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ApiConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_cors_wildcard_and_blank() {
        assert!(config_from(&[("CORS_ORIGINS", " * ")]).cors_origins.is_empty());
        assert_eq!(
            config_from(&[("CORS_ORIGINS", " , ")]).cors_origins,
            vec!["http://localhost:3000"]
        );
    }

    #[test]
    fn test_values_from_env() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("UPLOAD_DIR", "/srv/docs"),
            ("MAX_UPLOAD_BYTES", "2048"),
            ("CORS_ORIGINS", "http://localhost:3000, https://sign.example.com,"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_dir, PathBuf::from("/srv/docs"));
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://sign.example.com"]
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("MAX_UPLOAD_BYTES", "0"),
            ("UPLOAD_DIR", "  "),
        ]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
    }
}
