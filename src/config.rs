use anyhow::{Context, Result};

use crate::errors::AuthError;

/// Process configuration, read once from the environment at startup.
///
/// Environment variables:
/// - `AUTHGATE_HOST`: bind address (default 0.0.0.0)
/// - `AUTHGATE_PORT`: bind port (default 8080)
/// - `AUTHGATE_JWT_SECRET`: symmetric signing key, required and non-empty
/// - `DATABASE_URL`: Postgres connection string; in-memory registry if unset
/// - `AUTHGATE_ALERT_WEBHOOK`: URL for security alert delivery, optional
/// - `AUTHGATE_REVOKE_ON_IP_MISMATCH`: "true"/"1" retires a session when a
///   refresh arrives from an address other than the one the access token
///   was minted for; default is notify-only
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub database_url: Option<String>,
    pub alert_webhook: Option<String>,
    pub revoke_on_ip_mismatch: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("AUTHGATE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match std::env::var("AUTHGATE_PORT") {
            Ok(raw) => raw.parse::<u16>().context("parsing AUTHGATE_PORT")?,
            Err(_) => 8080,
        };
        let jwt_secret = std::env::var("AUTHGATE_JWT_SECRET")
            .map_err(|_| AuthError::Configuration("AUTHGATE_JWT_SECRET is not set".to_string()))?;
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let alert_webhook = std::env::var("AUTHGATE_ALERT_WEBHOOK")
            .ok()
            .filter(|v| !v.is_empty());
        let revoke_on_ip_mismatch = std::env::var("AUTHGATE_REVOKE_ON_IP_MISMATCH")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            jwt_secret,
            database_url,
            alert_webhook,
            revoke_on_ip_mismatch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    // Env-var tests share process state; serialize them.
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        }
    }

    fn clear_env() {
        for key in [
            "AUTHGATE_HOST",
            "AUTHGATE_PORT",
            "AUTHGATE_JWT_SECRET",
            "DATABASE_URL",
            "AUTHGATE_ALERT_WEBHOOK",
            "AUTHGATE_REVOKE_ON_IP_MISMATCH",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults() {
        let _g = lock_env();
        clear_env();
        std::env::set_var("AUTHGATE_JWT_SECRET", "test-secret");

        let config = Config::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_secret, "test-secret");
        assert!(config.database_url.is_none());
        assert!(config.alert_webhook.is_none());
        assert!(!config.revoke_on_ip_mismatch);
    }

    #[test]
    fn test_missing_secret_rejected() {
        let _g = lock_env();
        clear_env();

        let result = Config::from_env();
        assert!(result.is_err());
    }

    #[test]
    fn test_full_environment() {
        let _g = lock_env();
        clear_env();
        std::env::set_var("AUTHGATE_HOST", "127.0.0.1");
        std::env::set_var("AUTHGATE_PORT", "9000");
        std::env::set_var("AUTHGATE_JWT_SECRET", "k");
        std::env::set_var("DATABASE_URL", "postgres://localhost/authgate");
        std::env::set_var("AUTHGATE_ALERT_WEBHOOK", "http://alerts.local/hook");
        std::env::set_var("AUTHGATE_REVOKE_ON_IP_MISMATCH", "true");

        let config = Config::from_env().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/authgate")
        );
        assert_eq!(config.alert_webhook.as_deref(), Some("http://alerts.local/hook"));
        assert!(config.revoke_on_ip_mismatch);
        clear_env();
    }

    #[test]
    fn test_invalid_port_rejected() {
        let _g = lock_env();
        clear_env();
        std::env::set_var("AUTHGATE_JWT_SECRET", "k");
        std::env::set_var("AUTHGATE_PORT", "not-a-port");

        assert!(Config::from_env().is_err());
        clear_env();
    }
}
