use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::{Difficulty, GameMode, RoundConfig};

const DEV_TOKEN_SECRET: &str = "change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub initial_round: RoundConfig,
    pub request_timeout: Duration,
    pub bind_addr: String,
    pub token_secret: String,
    pub catalog_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_settings(&settings, &env)
    }

    fn from_settings(settings: &config::Config, env: &str) -> Result<Self, config::ConfigError> {
        let backend_url = lookup(settings, "client.backend_url", "BACKEND_URL")
            .unwrap_or_else(|| "http://127.0.0.1:8002".to_string());

        let game_mode = match lookup(settings, "client.game_mode", "GAME_MODE") {
            Some(raw) => raw
                .parse::<GameMode>()
                .map_err(|e| config::ConfigError::Message(e.to_string()))?,
            None => GameMode::IdentifySubject,
        };

        let difficulty = match lookup(settings, "client.difficulty", "DIFFICULTY") {
            Some(raw) => raw
                .parse::<Difficulty>()
                .map_err(|e| config::ConfigError::Message(e.to_string()))?,
            None => Difficulty::default(),
        };

        let request_timeout_ms = match lookup(settings, "client.request_timeout_ms", "REQUEST_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                config::ConfigError::Message(format!("request_timeout_ms '{}' is not a number", raw))
            })?,
            None => 5000,
        };

        let bind_addr = lookup(settings, "server.bind_addr", "BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8002".to_string());

        let token_secret = match lookup(settings, "server.token_secret", "TOKEN_SECRET") {
            Some(secret) => secret,
            None if env == "prod" => {
                return Err(config::ConfigError::Message(
                    "TOKEN_SECRET must be set in production".to_string(),
                ))
            }
            None => {
                tracing::warn!("Using default token secret (dev mode only)");
                DEV_TOKEN_SECRET.to_string()
            }
        };

        let catalog_path = lookup(settings, "server.catalog_path", "CATALOG_PATH").map(PathBuf::from);

        let log_format = match lookup(settings, "log.format", "LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(config::ConfigError::Message(format!(
                    "unknown log format '{}'",
                    other
                )))
            }
        };

        Ok(Config {
            backend_url,
            initial_round: RoundConfig::new(game_mode, difficulty),
            request_timeout: Duration::from_millis(request_timeout_ms),
            bind_addr,
            token_secret,
            catalog_path,
            log_format,
        })
    }
}

/// Layered key first, then the plain environment variable.
fn lookup(settings: &config::Config, key: &str, env_fallback: &str) -> Option<String> {
    settings
        .get_string(key)
        .or_else(|_| env::var(env_fallback))
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "BACKEND_URL",
        "GAME_MODE",
        "DIFFICULTY",
        "TOKEN_SECRET",
        "LOG_FORMAT",
        "REQUEST_TIMEOUT_MS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn empty_settings() -> config::Config {
        config::Config::builder().build().unwrap()
    }

    #[test]
    #[serial]
    fn defaults_apply_without_overrides() {
        clear_env();
        let config = Config::from_settings(&empty_settings(), "dev").unwrap();

        assert_eq!(config.backend_url, "http://127.0.0.1:8002");
        assert_eq!(config.initial_round, RoundConfig::default());
        assert_eq!(config.request_timeout, Duration::from_millis(5000));
        assert_eq!(config.token_secret, DEV_TOKEN_SECRET);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    #[serial]
    fn env_fallbacks_are_parsed() {
        clear_env();
        env::set_var("GAME_MODE", "mixed");
        env::set_var("DIFFICULTY", "6");
        env::set_var("LOG_FORMAT", "json");

        let config = Config::from_settings(&empty_settings(), "dev").unwrap();
        assert_eq!(config.initial_round.game_mode, GameMode::Mixed);
        assert_eq!(config.initial_round.difficulty.value(), 6);
        assert_eq!(config.log_format, LogFormat::Json);
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_difficulty_is_a_config_error() {
        clear_env();
        env::set_var("DIFFICULTY", "9");
        assert!(Config::from_settings(&empty_settings(), "dev").is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn prod_requires_token_secret() {
        clear_env();
        assert!(Config::from_settings(&empty_settings(), "prod").is_err());
        env::set_var("TOKEN_SECRET", "s3cret");
        let config = Config::from_settings(&empty_settings(), "prod").unwrap();
        assert_eq!(config.token_secret, "s3cret");
        clear_env();
    }
}
