use chrono::{DateTime, Utc};

use crate::geo::Location;
use crate::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Enter,
    Exit,
    Settings,
}

/// One inbound chat message, already stripped of transport details.
///
/// `user_id` identifies the sender; replies go to `chat_id`, which differs
/// from it in group chats.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub chat_id: i64,
    pub first_name: String,
    pub text: Option<String>,
    pub command: Option<Command>,
    pub location: Option<Location>,
    pub timestamp: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(user_id: UserId, first_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            chat_id: user_id,
            first_name: first_name.into(),
            text: None,
            command: None,
            location: None,
            timestamp,
        }
    }

    pub fn in_chat(mut self, chat_id: i64) -> Self {
        self.chat_id = chat_id;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Trimmed text, `None` when absent or blank.
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}
