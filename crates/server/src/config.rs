// crates/server/src/config.rs
//! Environment-driven server configuration.

use std::path::PathBuf;
use std::time::Duration;

use taskmill_engine::EngineConfig;

/// Default port for the server.
const DEFAULT_PORT: u16 = 8080;

/// Runtime configuration, read once at startup from `TASKMILL_*` variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port.
    pub port: u16,
    /// SQLite database path. `None` falls back to the per-user cache dir.
    pub db_path: Option<PathBuf>,
    /// Worker pool and time-budget settings.
    pub engine: EngineConfig,
}

impl Config {
    /// Read configuration from the environment, falling back to defaults
    /// for anything absent or unparseable.
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();
        Self {
            port: get_port(),
            db_path: std::env::var("TASKMILL_DB").ok().map(PathBuf::from),
            engine: EngineConfig {
                workers: env_parse("TASKMILL_WORKERS", defaults.workers),
                prefetch: env_parse("TASKMILL_PREFETCH", defaults.prefetch),
                max_jobs_per_worker: env_parse(
                    "TASKMILL_MAX_JOBS_PER_WORKER",
                    defaults.max_jobs_per_worker,
                ),
                soft_time_limit: env_secs("TASKMILL_SOFT_TIME_LIMIT_SECS", defaults.soft_time_limit),
                time_limit: env_secs("TASKMILL_TIME_LIMIT_SECS", defaults.time_limit),
                result_ttl: env_secs("TASKMILL_RESULT_TTL_SECS", defaults.result_ttl),
            },
        }
    }
}

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    std::env::var("TASKMILL_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_env_parse_falls_back_on_missing() {
        assert_eq!(env_parse("TASKMILL_TEST_UNSET_KEY", 42u16), 42);
        assert_eq!(
            env_secs("TASKMILL_TEST_UNSET_KEY", Duration::from_secs(7)),
            Duration::from_secs(7)
        );
    }

    #[test]
    fn test_from_env_engine_defaults() {
        // None of the TASKMILL_* variables are set in the test environment,
        // so this exercises the default path end to end.
        let config = Config::from_env();
        assert_eq!(config.engine.workers, 4);
        assert_eq!(config.engine.prefetch, 4);
        assert_eq!(config.engine.max_jobs_per_worker, 1000);
        assert_eq!(config.engine.soft_time_limit, Duration::from_secs(270));
        assert_eq!(config.engine.time_limit, Duration::from_secs(300));
        assert_eq!(config.engine.result_ttl, Duration::from_secs(86_400));
        assert!(config.db_path.is_none());
    }
}
