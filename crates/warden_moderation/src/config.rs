//! Moderation settings.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the moderation engine and its chat commands.
///
/// # Example
///
/// ```
/// use warden_moderation::ModerationConfig;
/// use std::time::Duration;
///
/// let config = ModerationConfig::default().with_restore_delay_secs(2);
/// assert_eq!(config.restore_delay(), Duration::from_secs(2));
/// assert_eq!(config.quarantine_command(), "/quarantine");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default, setter(into))]
pub struct ModerationConfig {
    /// Delay between removing a member and lifting the removal (seconds)
    #[serde(default = "default_restore_delay_secs")]
    restore_delay_secs: u64,

    /// Admin command that quarantines the author of the replied-to message
    #[serde(default = "default_quarantine_command")]
    quarantine_command: String,

    /// Admin command that releases the author of the replied-to message
    #[serde(default = "default_release_command")]
    release_command: String,
}

fn default_restore_delay_secs() -> u64 {
    5
}

fn default_quarantine_command() -> String {
    "/quarantine".to_string()
}

fn default_release_command() -> String {
    "/release".to_string()
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            restore_delay_secs: default_restore_delay_secs(),
            quarantine_command: default_quarantine_command(),
            release_command: default_release_command(),
        }
    }
}

impl ModerationConfig {
    /// Restore delay as a duration.
    pub fn restore_delay(&self) -> Duration {
        Duration::from_secs(self.restore_delay_secs)
    }
}
