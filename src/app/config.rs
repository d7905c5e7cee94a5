use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

use crate::services::orders::StatusPolicy;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct CartConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct OrderConfig {
    pub tracking_code_attempts: u32,
    pub status_policy: StatusPolicy,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub cart: CartConfig,
    pub orders: OrderConfig,
}

/// Reads the configuration from the process environment (after `.env` has been loaded).
pub fn load() -> Result<AppConfig> {
    AppConfig::from_lookup(|key| env::var(key).ok())
}

impl AppConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = get_or("SERVER_PORT", "3000")
            .parse::<u16>()
            .context("Invalid SERVER_PORT")?;
        let pool_size = get_or("DATABASE_POOL_SIZE", "10")
            .parse::<u32>()
            .context("Invalid DATABASE_POOL_SIZE")?;
        let connect_timeout = get_or("DATABASE_CONNECT_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .context("Invalid DATABASE_CONNECT_TIMEOUT_SECS")?;
        let tracking_code_attempts = get_or("TRACKING_CODE_ATTEMPTS", "5")
            .parse::<u32>()
            .context("Invalid TRACKING_CODE_ATTEMPTS")?;
        let strict = get_or("STRICT_STATUS_TRANSITIONS", "false")
            .parse::<bool>()
            .context("Invalid STRICT_STATUS_TRANSITIONS")?;

        if tracking_code_attempts == 0 {
            anyhow::bail!("TRACKING_CODE_ATTEMPTS must be at least 1");
        }

        let config = Self {
            server: ServerConfig {
                host: get_or("SERVER_HOST", "0.0.0.0"),
                port,
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").context("Missing environment variable 'DATABASE_URL'")?,
                pool_size,
                connect_timeout: Duration::from_secs(connect_timeout),
            },
            identity: IdentityConfig {
                url: get_or("AUTH_URL", "http://localhost:9999")
                    .trim_end_matches('/')
                    .to_string(),
                api_key: get_or("AUTH_API_KEY", ""),
            },
            cart: CartConfig {
                dir: PathBuf::from(get_or("CART_DIR", "./data/carts")),
            },
            orders: OrderConfig {
                tracking_code_attempts,
                status_policy: if strict {
                    StatusPolicy::Strict
                } else {
                    StatusPolicy::Permissive
                },
            },
        };

        tracing::info!("Application configuration loaded successfully");
        Ok(config)
    }
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
    fn applies_defaults() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/hh")]))
                .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.pool_size, 10);
        assert_eq!(config.database.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.orders.tracking_code_attempts, 5);
        assert_eq!(config.orders.status_policy, StatusPolicy::Permissive);
        assert_eq!(config.cart.dir, PathBuf::from("./data/carts"));
    }

    #[test]
    fn database_url_is_required() {
        assert!(AppConfig::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/hh"),
            ("SERVER_PORT", "8081"),
            ("AUTH_URL", "https://auth.example.com/auth/v1/"),
            ("STRICT_STATUS_TRANSITIONS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.identity.url, "https://auth.example.com/auth/v1");
        assert_eq!(config.orders.status_policy, StatusPolicy::Strict);
    }

    #[test]
    fn rejects_malformed_values() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/hh"),
            ("SERVER_PORT", "eighty"),
        ]));
        assert!(result.is_err());

        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/hh"),
            ("TRACKING_CODE_ATTEMPTS", "0"),
        ]));
        assert!(result.is_err());
    }
}
