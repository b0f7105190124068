//! Client configuration from environment variables.
//!
//! ```bash
//! # Countdown length; deployments have shipped 30 and 15.
//! PERK_AD_DURATION_SECS=30
//!
//! # Simulated ad-load latency in milliseconds.
//! PERK_AD_LOAD_MILLIS=2000
//!
//! # Profile store path (defaults to ~/.perk/profiles.json).
//! PERK_STORE_PATH=/tmp/profiles.json
//! ```

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_AD_DURATION_SECS: u32 = 30;
const DEFAULT_AD_LOAD_MILLIS: u64 = 2000;

/// Client configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Countdown length in seconds.
    pub ad_duration_secs: u32,
    /// Simulated ad-load latency in milliseconds.
    pub ad_load_millis: u64,
    /// Profile store path; None means the default home-dir location.
    pub store_path: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ad_duration_secs: DEFAULT_AD_DURATION_SECS,
            ad_load_millis: DEFAULT_AD_LOAD_MILLIS,
            store_path: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} (expected a positive integer)")]
    InvalidNumber { var: &'static str, value: String },
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let ad_duration_secs = match env::var("PERK_AD_DURATION_SECS") {
            Ok(value) => value
                .parse::<u32>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigError::InvalidNumber {
                    var: "PERK_AD_DURATION_SECS",
                    value,
                })?,
            Err(_) => DEFAULT_AD_DURATION_SECS,
        };

        let ad_load_millis = match env::var("PERK_AD_LOAD_MILLIS") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "PERK_AD_LOAD_MILLIS",
                    value,
                })?,
            Err(_) => DEFAULT_AD_LOAD_MILLIS,
        };

        let store_path = env::var("PERK_STORE_PATH").ok().map(PathBuf::from);

        Ok(Self {
            ad_duration_secs,
            ad_load_millis,
            store_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: &[&str] = &[
        "PERK_AD_DURATION_SECS",
        "PERK_AD_LOAD_MILLIS",
        "PERK_STORE_PATH",
    ];

    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
    }

    impl<'a> EnvGuard<'a> {
        fn new() -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            for var in ENV_VARS {
                env::remove_var(var);
            }
            Self { _lock: lock }
        }

        fn set(&self, key: &str, value: &str) {
            env::set_var(key, value);
        }
    }

    impl<'a> Drop for EnvGuard<'a> {
        fn drop(&mut self) {
            for var in ENV_VARS {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let _guard = EnvGuard::new();

        let config = CliConfig::from_env().unwrap();
        assert_eq!(config.ad_duration_secs, 30);
        assert_eq!(config.ad_load_millis, 2000);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn short_deployment_duration() {
        let guard = EnvGuard::new();
        guard.set("PERK_AD_DURATION_SECS", "15");

        let config = CliConfig::from_env().unwrap();
        assert_eq!(config.ad_duration_secs, 15);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let guard = EnvGuard::new();
        guard.set("PERK_AD_DURATION_SECS", "0");

        assert!(matches!(
            CliConfig::from_env(),
            Err(ConfigError::InvalidNumber { var: "PERK_AD_DURATION_SECS", .. })
        ));
    }

    #[test]
    fn garbage_duration_is_rejected() {
        let guard = EnvGuard::new();
        guard.set("PERK_AD_DURATION_SECS", "thirty");

        assert!(matches!(
            CliConfig::from_env(),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn zero_load_latency_is_allowed() {
        let guard = EnvGuard::new();
        guard.set("PERK_AD_LOAD_MILLIS", "0");

        let config = CliConfig::from_env().unwrap();
        assert_eq!(config.ad_load_millis, 0);
    }

    #[test]
    fn store_path_is_picked_up() {
        let guard = EnvGuard::new();
        guard.set("PERK_STORE_PATH", "/tmp/perk-test.json");

        let config = CliConfig::from_env().unwrap();
        assert_eq!(
            config.store_path,
            Some(PathBuf::from("/tmp/perk-test.json"))
        );
    }
}
