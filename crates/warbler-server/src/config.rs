use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

/// Server settings, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub session_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("WARBLER_DB_PATH").unwrap_or_else(|| "warbler.db".into());
        let host = lookup("WARBLER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("WARBLER_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("WARBLER_PORT must be a port number")?;

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let session_secret = match lookup("WARBLER_SESSION_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("WARBLER_SESSION_SECRET not set; generated one, sessions end on restart");
                warbler_crypto::keys::generate_session_secret()
            }
        };

        Ok(Self {
            db_path: PathBuf::from(db_path),
            addr,
            session_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("warbler.db"));
        assert_eq!(cfg.addr.port(), 3000);
        assert!(!cfg.session_secret.is_empty());
    }

    #[test]
    fn explicit_values_win() {
        let cfg = config(&[
            ("WARBLER_DB_PATH", "/tmp/w.db"),
            ("WARBLER_HOST", "127.0.0.1"),
            ("WARBLER_PORT", "8080"),
            ("WARBLER_SESSION_SECRET", "s3cret"),
        ])
        .unwrap();

        assert_eq!(cfg.db_path, PathBuf::from("/tmp/w.db"));
        assert_eq!(cfg.addr.to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.session_secret, "s3cret");
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(config(&[("WARBLER_PORT", "http")]).is_err());
    }
}
