use anyhow::{Context, Result};

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Config pointing at the given database with defaults everywhere else.
    pub fn for_url(database_url: impl Into<String>) -> Self {
        Config {
            database_url: database_url.into(),
            max_connections: 10,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_env_reports_missing_key() {
        let err = require_env("DATASTORE_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(err.to_string().contains("DATASTORE_TEST_UNSET_VARIABLE"));
    }

    #[test]
    fn test_for_url_defaults() {
        let config = Config::for_url("postgres://localhost/career");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.rust_log, "info");
    }
}
