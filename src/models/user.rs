use std::fmt::{Debug, Display};

use chrono::{NaiveTime, TimeDelta};

use crate::clock::format_time;

use super::ConversationState;

pub type UserId = i64;
pub type SpreadsheetId = String;

/// Opaque authorization blob handed out by the credential exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Allowed clock-in range, time of day only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Display for AccessWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", format_time(self.start), format_time(self.end))
    }
}

pub fn default_nominal_work_duration() -> TimeDelta {
    TimeDelta::hours(7) + TimeDelta::minutes(42)
}

pub fn default_overtime_threshold() -> TimeDelta {
    TimeDelta::minutes(19) + TimeDelta::seconds(59)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub first_name: String,
    pub state: ConversationState,
    pub time_zone: Option<chrono_tz::Tz>,
    pub access_window: Option<AccessWindow>,
    pub nominal_work_duration: TimeDelta,
    pub overtime_threshold: TimeDelta,
    pub spreadsheet_id: Option<SpreadsheetId>,
    pub credential: Option<Credential>,
}

impl UserRecord {
    pub fn new(id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            state: ConversationState::Main,
            time_zone: None,
            access_window: None,
            nominal_work_duration: default_nominal_work_duration(),
            overtime_threshold: default_overtime_threshold(),
            spreadsheet_id: None,
            credential: None,
        }
    }

    /// Time zone, credential and spreadsheet are all in place.
    pub fn can_track_time(&self) -> bool {
        self.time_zone.is_some() && self.spreadsheet_id.is_some() && self.credential.is_some()
    }
}
