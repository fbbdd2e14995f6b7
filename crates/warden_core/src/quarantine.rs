//! Per-user quarantine records.

use crate::{ChatId, UserId};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Display name fields captured when a user is quarantined.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_", strip_option, into)]
pub struct DisplayName {
    /// First name
    pub first_name: String,
    /// Last name, if set
    #[serde(default)]
    pub last_name: Option<String>,
    /// Username without the `@`, if set
    #[serde(default)]
    pub username: Option<String>,
}

impl DisplayName {
    /// Name with only a first name.
    pub fn new(first_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            ..Self::default()
        }
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.first_name)?;
        if let Some(last) = &self.last_name {
            write!(f, " {}", last)?;
        }
        if let Some(username) = &self.username {
            write!(f, " (@{})", username)?;
        }
        Ok(())
    }
}

/// Lifecycle state of a user's quarantine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuarantineState {
    /// No record exists
    Free,
    /// Quarantined with the given home group
    Quarantined(ChatId),
    /// Previously quarantined, now released
    Released,
}

impl QuarantineState {
    /// State for an optional record.
    pub fn of(record: Option<&QuarantineRecord>) -> Self {
        record.map_or(Self::Free, QuarantineRecord::state)
    }

    /// Home group, if quarantined.
    pub fn home_group(&self) -> Option<ChatId> {
        match self {
            Self::Quarantined(group) => Some(*group),
            Self::Free | Self::Released => None,
        }
    }
}

/// One user's quarantine record.
///
/// There is one record per user. It is mutated in place on transfer and on
/// release, and never deleted.
///
/// # Examples
///
/// ```
/// use warden_core::{ChatId, DisplayName, QuarantineRecord, QuarantineState, UserId};
///
/// let mut record = QuarantineRecord::new(UserId(7), ChatId(-1), DisplayName::new("Ann"));
/// assert_eq!(record.state(), QuarantineState::Quarantined(ChatId(-1)));
///
/// record.transfer_to(ChatId(-2));
/// assert_eq!(*record.current_group_id(), ChatId(-2));
///
/// record.release();
/// assert_eq!(record.state(), QuarantineState::Released);
/// assert!(record.ended_at().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct QuarantineRecord {
    user_id: UserId,
    current_group_id: ChatId,
    is_quarantined: bool,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    display: DisplayName,
}

impl QuarantineRecord {
    /// Fresh record, quarantined in `group` as of now.
    pub fn new(user_id: UserId, group: ChatId, display: DisplayName) -> Self {
        Self {
            user_id,
            current_group_id: group,
            is_quarantined: true,
            started_at: Utc::now(),
            ended_at: None,
            display,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> QuarantineState {
        if self.is_quarantined {
            QuarantineState::Quarantined(self.current_group_id)
        } else {
            QuarantineState::Released
        }
    }

    /// Make `group` the home group and (re)activate the quarantine.
    ///
    /// Used both for transfers between groups and for re-triggering after a
    /// release. The start time is reset.
    pub fn transfer_to(&mut self, group: ChatId) {
        self.current_group_id = group;
        self.is_quarantined = true;
        self.started_at = Utc::now();
        self.ended_at = None;
    }

    /// Mark the quarantine released as of now.
    pub fn release(&mut self) {
        self.is_quarantined = false;
        self.ended_at = Some(Utc::now());
    }

    /// Replace the stored display name.
    pub fn set_display(&mut self, display: DisplayName) {
        self.display = display;
    }
}
