use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_STORE_URI: &str = "mongodb://localhost:27017";
const DEFAULT_BUCKET: &str = "my_bucket";
const DEFAULT_COLLECTION: &str = "_default";
const DEFAULT_TIMEOUT_MS: u64 = 2500;

#[derive(Debug, Clone, Deserialize)]
pub struct UserServiceConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub uri: String,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    /// Database holding the users collection.
    pub bucket: String,
    pub collection: String,
    /// Applied to both server selection and connection establishment.
    pub timeout_ms: u64,
    /// Start serving before the store is reachable; `/users` answers 503 until it is.
    pub connect_in_background: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongodb,
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Mongodb,
            uri: DEFAULT_STORE_URI.to_string(),
            username: None,
            password: None,
            bucket: DEFAULT_BUCKET.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_in_background: false,
        }
    }
}

impl UserServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(UserServiceConfig {
            common: common_config,
            store: StoreConfig::from_lookup(|key| env::var(key).ok(), is_prod)?,
        })
    }
}

impl StoreConfig {
    /// Reads `STORE_*` settings through `lookup`. In production only
    /// `STORE_URI` loses its default.
    pub fn from_lookup<F>(lookup: F, is_prod: bool) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_env = |key: &str, default: Option<&str>, required_in_prod: bool| {
            resolve(key, lookup(key), default, is_prod && required_in_prod)
        };

        Ok(StoreConfig {
            backend: get_env("STORE_BACKEND", Some("mongodb"), false)?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            uri: get_env("STORE_URI", Some(DEFAULT_STORE_URI), true)?,
            username: lookup("STORE_USERNAME"),
            password: lookup("STORE_PASSWORD").map(Secret::new),
            bucket: get_env("STORE_BUCKET", Some(DEFAULT_BUCKET), false)?,
            collection: get_env("STORE_COLLECTION", Some(DEFAULT_COLLECTION), false)?,
            timeout_ms: parse_env(
                "STORE_TIMEOUT_MS",
                &get_env("STORE_TIMEOUT_MS", Some("2500"), false)?,
            )?,
            connect_in_background: parse_env(
                "STORE_CONNECT_IN_BACKGROUND",
                &get_env("STORE_CONNECT_IN_BACKGROUND", Some("false"), false)?,
            )?,
        })
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::Mongodb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn resolve(
    key: &str,
    value: Option<String>,
    default: Option<&str>,
    is_prod: bool,
) -> Result<String, AppError> {
    match value {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value {:?}: {}", key, raw, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("MongoDB".parse::<StoreBackend>(), Ok(StoreBackend::Mongodb));
        assert!("couchbase".parse::<StoreBackend>().is_err());
    }

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn production_needs_only_the_uri() {
        let store = StoreConfig::from_lookup(lookup(&[("STORE_URI", "mongodb://db:27017")]), true)
            .unwrap();

        assert_eq!(store.backend, StoreBackend::Mongodb);
        assert_eq!(store.uri, "mongodb://db:27017");
        assert_eq!(store.collection, "_default");
    }

    #[test]
    fn production_without_uri_fails() {
        let err = StoreConfig::from_lookup(lookup(&[("STORE_BACKEND", "mongodb")]), true)
            .unwrap_err();

        assert!(err.to_string().contains("STORE_URI is required in production"));
    }

    #[test]
    fn reads_store_settings() {
        let store = StoreConfig::from_lookup(
            lookup(&[
                ("STORE_BACKEND", "memory"),
                ("STORE_USERNAME", "admin"),
                ("STORE_PASSWORD", "123456"),
                ("STORE_TIMEOUT_MS", "100"),
                ("STORE_CONNECT_IN_BACKGROUND", "true"),
            ]),
            false,
        )
        .unwrap();

        assert_eq!(store.backend, StoreBackend::Memory);
        assert_eq!(store.username.as_deref(), Some("admin"));
        assert!(store.password.is_some());
        assert_eq!(store.timeout_ms, 100);
        assert!(store.connect_in_background);
    }

    #[test]
    fn parse_env_reports_key() {
        let err = parse_env::<u64>("STORE_TIMEOUT_MS", "soon").unwrap_err();

        assert!(err.to_string().contains("STORE_TIMEOUT_MS"));
        assert!(parse_env::<bool>("STORE_CONNECT_IN_BACKGROUND", " true ").unwrap());
    }

    #[test]
    fn default_store_points_at_local_mongodb() {
        let store = StoreConfig::default();

        assert_eq!(store.backend, StoreBackend::Mongodb);
        assert_eq!(store.uri, "mongodb://localhost:27017");
        assert_eq!(store.bucket, "my_bucket");
        assert!(!store.connect_in_background);
    }

    #[test]
    fn debug_output_redacts_password() {
        let store = StoreConfig {
            password: Some(Secret::new("123456".to_string())),
            ..StoreConfig::default()
        };

        assert!(!format!("{:?}", store).contains("123456"));
    }
}
