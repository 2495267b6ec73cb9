//! Crate constants and environment-driven settings.

use std::env;

/// Maximum IPv4 prefix length.
pub const MAX_LENGTH: u8 = 32;

/// log4rs configuration file used when `SUBNET_LOG_CONFIG` is unset.
pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";

/// Plan file used when neither an argument nor `SUBNET_PLAN_FILE` is given.
pub const DEFAULT_PLAN_FILE: &str = "plan.json";

/// Runtime settings for the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Path of the JSON plan to allocate.
    pub plan_file: String,
    /// Path of the log4rs configuration.
    pub log_config: String,
}

impl AppConfig {
    /// Read settings from the environment; `plan_arg` wins over `SUBNET_PLAN_FILE`.
    ///
    /// Call `dotenv::dotenv()` first so values from `.env` are visible.
    pub fn from_env(plan_arg: Option<String>) -> AppConfig {
        let plan_file = plan_arg
            .or_else(|| env::var("SUBNET_PLAN_FILE").ok())
            .unwrap_or_else(|| DEFAULT_PLAN_FILE.to_string());
        let log_config =
            env::var("SUBNET_LOG_CONFIG").unwrap_or_else(|_| DEFAULT_LOG_CONFIG.to_string());
        AppConfig {
            plan_file,
            log_config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_arg_wins() {
        let config = AppConfig::from_env(Some("custom.json".to_string()));
        assert_eq!(config.plan_file, "custom.json");
    }
}
