use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_clock_per_min: u32,

    pub api_prefix: String,
    /// Days of history returned by `/attendance/history` when no `days` is given
    pub history_default_days: u32,
    pub log_dir: String,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so parsing can be exercised
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingVar(key.into()));

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,
            rate_clock_per_min: parse_or(&lookup, "RATE_CLOCK_PER_MIN", 30)?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            history_default_days: parse_or(&lookup, "HISTORY_DEFAULT_DAYS", 5)?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "mysql://localhost/attendance_test".into(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        rate_protected_per_min: 1000,
        rate_clock_per_min: 30,
        api_prefix: "/api".into(),
        history_default_days: 5,
        log_dir: "logs".into(),
        run_migrations: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SERVER_ADDR", "0.0.0.0:8080"),
        ("DATABASE_URL", "mysql://root@localhost/attendance"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply_when_optional_keys_are_absent() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.rate_protected_per_min, 1000);
        assert_eq!(config.rate_clock_per_min, 30);
        assert_eq!(config.history_default_days, 5);
        assert!(config.run_migrations);
    }

    #[test]
    fn missing_required_key_is_reported_by_name() {
        let err = Config::from_lookup(lookup_from(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref k) if k == "JWT_SECRET"));
    }

    #[test]
    fn unparsable_number_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RATE_CLOCK_PER_MIN", "lots"));

        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "RATE_CLOCK_PER_MIN"));
    }

    #[test]
    fn overrides_are_read() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("API_PREFIX", "/v2"));
        pairs.push(("RUN_MIGRATIONS", "false"));
        pairs.push(("HISTORY_DEFAULT_DAYS", " 14 "));

        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.api_prefix, "/v2");
        assert!(!config.run_migrations);
        assert_eq!(config.history_default_days, 14);
    }
}
