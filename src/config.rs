//! Configuration management.
//!
//! Loads settings from environment variables and .env file.

use std::path::Path;
use std::str::FromStr;

/// Replay configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Settings {
    // Input
    /// NDJSON capture to replay; stdin when unset.
    pub replay_path: Option<String>,

    // Output
    pub output_mode: OutputMode,
    pub emit_unknown: bool,

    // Feed health
    pub stats_interval: usize,

    // Logging
    pub log_level: String,
    pub log_json: bool,
}

/// What the replay writes to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One line per decoded content container.
    Containers,
    /// One line per notification, batch intact.
    Notifications,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "containers" => Ok(Self::Containers),
            "notifications" => Ok(Self::Notifications),
            _ => Err(format!("Invalid output mode: {s}")),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Settings {
    /// Load settings from environment variables (and .env file).
    pub fn from_env() -> Self {
        // Try to load .env file (ignore if not found).
        let _ = dotenvy::dotenv();

        Self {
            replay_path: env_opt("FEED_REPLAY_PATH"),

            output_mode: env_str("FEED_OUTPUT", "containers")
                .parse()
                .unwrap_or(OutputMode::Containers),
            emit_unknown: env_bool("FEED_EMIT_UNKNOWN", false),

            stats_interval: env_usize("FEED_STATS_INTERVAL", 1000),

            log_level: env_str("LOG_LEVEL", "info"),
            log_json: env_bool("LOG_JSON", false),
        }
    }

    /// Validate configuration for critical requirements.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Some(path) = &self.replay_path {
            if !Path::new(path).is_file() {
                errors.push(format!("FEED_REPLAY_PATH does not point to a file: {path}"));
            }
        }

        if self.stats_interval == 0 {
            errors.push("FEED_STATS_INTERVAL must be at least 1".to_string());
        }

        // Bare levels only; per-target directives go through RUST_LOG.
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!("LOG_LEVEL must be one of {}", LOG_LEVELS.join(", ")));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            replay_path: None,
            output_mode: OutputMode::Containers,
            emit_unknown: false,
            stats_interval: 1000,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_helpers() {
        std::env::set_var("LCF_TEST_BOOL", "YES");
        std::env::set_var("LCF_TEST_USIZE", "not a number");
        std::env::set_var("LCF_TEST_OPT", "   ");

        assert!(env_bool("LCF_TEST_BOOL", false));
        assert!(env_bool("LCF_TEST_MISSING", true));
        assert_eq!(env_usize("LCF_TEST_USIZE", 7), 7);
        assert_eq!(env_opt("LCF_TEST_OPT"), None);
        assert_eq!(env_str("LCF_TEST_MISSING", "fallback"), "fallback");
    }

    #[test]
    fn test_output_mode_parse() {
        assert_eq!("Notifications".parse::<OutputMode>(), Ok(OutputMode::Notifications));
        assert!("xml".parse::<OutputMode>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Settings::default().validate().is_ok());

        let settings = Settings {
            replay_path: Some("/definitely/not/here.ndjson".to_string()),
            stats_interval: 0,
            log_level: "loud".to_string(),
            ..Settings::default()
        };
        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
