use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Mark the session cookie `Secure`. Enable when served over HTTPS.
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("VOWS_DB_PATH").unwrap_or_else(|| "vows.db".into()).into();
        let host = lookup("VOWS_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup("VOWS_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("VOWS_PORT must be a port number")?;
        let secure_cookies = lookup("VOWS_SECURE_COOKIES")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            db_path,
            host,
            port,
            secure_cookies,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
