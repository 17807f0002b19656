use std::{env, num::NonZeroU32, path::PathBuf};

use anyhow::{Context, Result};

/// Runtime settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub bind_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub media_dir: PathBuf,
    pub media_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = var("PORT", "3000");
        let port = port
            .parse::<u16>()
            .with_context(|| format!("PORT must be a port number, got {port}"))?;
        let db_max_connections = var("DB_MAX_CONNECTIONS", "5");
        let db_max_connections = db_max_connections
            .parse::<NonZeroU32>()
            .with_context(|| {
                format!("DB_MAX_CONNECTIONS must be a positive integer, got {db_max_connections}")
            })?
            .get();

        Ok(Self {
            port,
            bind_addr: var("BIND_ADDR", "0.0.0.0"),
            database_url: var("DATABASE_URL", "sqlite://data/pressroom.db"),
            db_max_connections,
            media_dir: PathBuf::from(var("MEDIA_DIR", "data/media")),
            media_base_url: var("MEDIA_BASE_URL", "/media")
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
