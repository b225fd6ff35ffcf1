//! Change-notification job configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the delayed change-notification job fired after a
/// document is added to a dataroom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether change-notification jobs are triggered at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Queue the job is placed on.
    #[serde(default = "default_queue")]
    pub queue: String,
    /// Delay before the job becomes runnable, in seconds.
    #[serde(default = "default_delay")]
    pub change_notification_delay_seconds: u64,
    /// Maximum execution attempts for the job.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
}

impl NotificationConfig {
    /// The configured delay as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.change_notification_delay_seconds)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue: default_queue(),
            change_notification_delay_seconds: default_delay(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_queue() -> String {
    "notifications".to_string()
}

fn default_delay() -> u64 {
    600
}

fn default_max_attempts() -> i32 {
    3
}
