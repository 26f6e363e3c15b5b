//! Configuration management for the to-do application.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file in the working directory is read first when present.

use crate::notification::DEFAULT_TTL;
use crate::types::UserId;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the remote collection service (`TODOS_API_URL`).
    ///
    /// `None` runs against an in-memory collection.
    pub api_url: Option<String>,
    /// Owner of the list (`TODOS_USER_ID`); zero means unset
    pub user_id: UserId,
    /// Notification time-to-live (`TODOS_NOTIFICATION_TTL_MS`, default: 3000)
    pub notification_ttl: Duration,
    /// Per-request timeout (`TODOS_REQUEST_TIMEOUT_SECS`, default: 30)
    pub request_timeout: Duration,
    /// Graceful shutdown timeout (`TODOS_SHUTDOWN_TIMEOUT_SECS`, default: 10)
    pub shutdown_timeout: Duration,
    /// Log filter (`RUST_LOG`, default: `todomvc=info,todomvc_runtime=info`)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            user_id: UserId::default(),
            notification_ttl: DEFAULT_TTL,
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(10),
            log_level: "todomvc=info,todomvc_runtime=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`).
    ///
    /// Missing or unparsable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            api_url: lookup("TODOS_API_URL").filter(|url| !url.trim().is_empty()),
            user_id: parsed("TODOS_USER_ID").map_or(defaults.user_id, UserId::new),
            notification_ttl: parsed("TODOS_NOTIFICATION_TTL_MS")
                .map_or(defaults.notification_ttl, Duration::from_millis),
            request_timeout: parsed("TODOS_REQUEST_TIMEOUT_SECS")
                .map_or(defaults.request_timeout, Duration::from_secs),
            shutdown_timeout: parsed("TODOS_SHUTDOWN_TIMEOUT_SECS")
                .map_or(defaults.shutdown_timeout, Duration::from_secs),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }
}
