use std::env;

use actix_web::cookie::Key;

use crate::errors::AppError;

/// Minimum key material `Key::from` accepts.
const SESSION_KEY_MIN_LEN: usize = 64;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub session_key: Key,
    pub host: String,
    pub port: u16,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://dompet.db".to_owned());

        let key_str = lookup("SESSION_KEY")
            .ok_or_else(|| AppError::ConfigError("SESSION_KEY is not set".into()))?;
        if key_str.len() < SESSION_KEY_MIN_LEN {
            return Err(AppError::ConfigError(format!(
                "SESSION_KEY must be at least {} bytes",
                SESSION_KEY_MIN_LEN
            )));
        }

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = match lookup("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| AppError::ConfigError(format!("PORT is not a valid port: {p}")))?,
            None => 8080,
        };
        let cookie_secure = match lookup("COOKIE_SECURE").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(AppError::ConfigError(format!(
                    "COOKIE_SECURE must be true or false, got {other}"
                )))
            }
        };

        Ok(Config {
            database_url,
            session_key: Key::from(key_str.as_bytes()),
            host,
            port,
            cookie_secure,
        })
    }
}
