// src/config.rs

use std::{env, fmt::Display, str::FromStr, time::Duration};

use dotenvy::dotenv;

use crate::{service::LeaderboardSettings, store::RetentionPolicy};

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it the service keeps scores in memory.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub rust_log: String,
    pub log_dir: String,
    pub port: u16,
    pub default_limit: i64,
    pub max_limit: usize,
    pub retention: RetentionPolicy,
    pub request_timeout: Duration,

    /// Env values that failed to parse and were replaced by defaults.
    /// Logged by the caller once tracing is up.
    pub warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: 5,
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            port: 3000,
            default_limit: 10,
            max_limit: 100,
            retention: RetentionPolicy::LatestWins,
            request_timeout: Duration::from_millis(5000),
            warnings: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();
        let mut warnings = Vec::new();

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let rust_log = env::var("RUST_LOG").unwrap_or(defaults.rust_log);
        let log_dir = env::var("LOG_DIR").unwrap_or(defaults.log_dir);

        let max_limit =
            parse_var("LEADERBOARD_MAX_LIMIT", defaults.max_limit, &mut warnings).max(1);
        let default_limit =
            parse_var("LEADERBOARD_DEFAULT_LIMIT", defaults.default_limit, &mut warnings)
                .clamp(1, i64::try_from(max_limit).unwrap_or(i64::MAX));

        let db_max_connections =
            parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections, &mut warnings);
        let port = parse_var("PORT", defaults.port, &mut warnings);
        let retention = parse_var("LEADERBOARD_RETENTION", defaults.retention, &mut warnings);
        let request_timeout = Duration::from_millis(parse_var(
            "REQUEST_TIMEOUT_MS",
            defaults.request_timeout.as_millis() as u64,
            &mut warnings,
        ));

        Self {
            database_url,
            db_max_connections,
            rust_log,
            log_dir,
            port,
            default_limit,
            max_limit,
            retention,
            request_timeout,
            warnings,
        }
    }

    pub fn leaderboard_settings(&self) -> LeaderboardSettings {
        LeaderboardSettings {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
            retention: self.retention,
            deadline: self.request_timeout,
        }
    }
}

/// Reads `key` and parses it, falling back to `default` when unset or invalid.
/// Invalid values are reported through `warnings`.
fn parse_var<T>(key: &str, default: T, warnings: &mut Vec<String>) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                warnings.push(format!(
                    "Ignoring invalid {}={:?} ({}), using {}",
                    key, raw, e, default
                ));
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let config = Config {
            default_limit: 25,
            max_limit: 50,
            retention: RetentionPolicy::KeepBest,
            request_timeout: Duration::from_millis(750),
            ..Config::default()
        };

        let settings = config.leaderboard_settings();
        assert_eq!(settings.default_limit, 25);
        assert_eq!(settings.max_limit, 50);
        assert_eq!(settings.retention, RetentionPolicy::KeepBest);
        assert_eq!(settings.deadline, Duration::from_millis(750));
    }

    #[test]
    fn parse_var_falls_back_on_garbage() {
        // Unique names so parallel tests do not race on the environment.
        let mut warnings = Vec::new();
        assert_eq!(parse_var("QUIZ_LEADERBOARD_TEST_UNSET", 42u16, &mut warnings), 42);
        assert!(warnings.is_empty());

        unsafe { env::set_var("QUIZ_LEADERBOARD_TEST_GOOD", " 12 ") };
        assert_eq!(parse_var("QUIZ_LEADERBOARD_TEST_GOOD", 7u32, &mut warnings), 12);
        assert!(warnings.is_empty());

        unsafe { env::set_var("QUIZ_LEADERBOARD_TEST_BAD", "not-a-number") };
        assert_eq!(parse_var("QUIZ_LEADERBOARD_TEST_BAD", 7u32, &mut warnings), 7);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("QUIZ_LEADERBOARD_TEST_BAD"));
        assert!(warnings[0].contains("not-a-number"));
    }
}
