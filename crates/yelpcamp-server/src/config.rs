use std::path::PathBuf;

use thiserror::Error;

/// Used when `SECRET` is unset. Fine for local development only.
pub const INSECURE_SECRET: &str = "thisshouldbeabettersecret!";

const TOUCH_AFTER: &str = "SESSION_TOUCH_AFTER_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub secret: String,
    /// True when `secret` is [`INSECURE_SECRET`].
    pub secret_is_default: bool,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub touch_after_secs: i64,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let db_url = get("DB_URL").ok_or(ConfigError::Missing("DB_URL"))?;
        let touch_after_secs = parse_or(get(TOUCH_AFTER), TOUCH_AFTER, 86_400)?;
        if touch_after_secs < 0 {
            return Err(ConfigError::Invalid {
                name: TOUCH_AFTER,
                value: touch_after_secs.to_string(),
            });
        }
        let (secret, secret_is_default) = match get("SECRET") {
            Some(secret) => (secret, false),
            None => (INSECURE_SECRET.to_string(), true),
        };

        Ok(Self {
            db_url,
            secret,
            secret_is_default,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", 3000)?,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "public".to_string()).into(),
            touch_after_secs,
            cookie_secure: parse_bool(get("COOKIE_SECURE"), "COOKIE_SECURE")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn parse_bool(raw: Option<String>, name: &'static str) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(false);
    };
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}
