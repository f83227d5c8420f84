//! Configuration types for jarshield-client

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration for [`ObfuscatorController`](crate::controller::ObfuscatorController)
///
/// All fields have sensible defaults; a zero-configuration controller talks to
/// a service on localhost and uses the stock timings (2 s poll cadence, 0.5 s
/// auto-retrieve delay, 5 s notification lifetime).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the obfuscation service API (default: "http://127.0.0.1:8080/api")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Required artifact extension, without the dot (default: "jar")
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,

    /// Fixed interval between status queries (default: 2 s)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Delay before the automatic retrieval trigger fires after completion (default: 500 ms)
    #[serde(default = "default_auto_retrieve_delay")]
    pub auto_retrieve_delay: Duration,

    /// How long a notification stays in the feed before it is discarded (default: 5 s)
    #[serde(default = "default_notification_ttl")]
    pub notification_ttl: Duration,

    /// Interval between backend health checks (default: 30 s)
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval: Duration,

    /// Event broadcast buffer size (default: 1000)
    ///
    /// Subscribers that fall further behind than this receive a
    /// `RecvError::Lagged` and miss the overwritten events.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            artifact_extension: default_artifact_extension(),
            poll_interval: default_poll_interval(),
            auto_retrieve_delay: default_auto_retrieve_delay(),
            notification_ttl: default_notification_ttl(),
            health_check_interval: default_health_check_interval(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// Checks that the base URL parses, the artifact extension is non-blank,
    /// and the timer intervals are non-zero.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| Error::Config {
            message: format!("invalid base_url '{}': {e}", self.base_url),
            key: Some("base_url".to_string()),
        })?;

        if self.artifact_extension.trim().is_empty() {
            return Err(Error::Config {
                message: "artifact_extension must not be blank".to_string(),
                key: Some("artifact_extension".to_string()),
            });
        }

        if self.poll_interval.is_zero() {
            return Err(Error::Config {
                message: "poll_interval must be non-zero".to_string(),
                key: Some("poll_interval".to_string()),
            });
        }

        if self.health_check_interval.is_zero() {
            return Err(Error::Config {
                message: "health_check_interval must be non-zero".to_string(),
                key: Some("health_check_interval".to_string()),
            });
        }

        if self.event_buffer == 0 {
            return Err(Error::Config {
                message: "event_buffer must be at least 1".to_string(),
                key: Some("event_buffer".to_string()),
            });
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080/api".to_string()
}

fn default_artifact_extension() -> String {
    "jar".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_auto_retrieve_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_notification_ttl() -> Duration {
    Duration::from_secs(5)
}

fn default_health_check_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_event_buffer() -> usize {
    1000
}
