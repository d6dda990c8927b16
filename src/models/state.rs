use std::{fmt::Display, str::FromStr};

use thiserror::Error;

/// Where a user is in the conversation. Stored by its stable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversationState {
    #[default]
    Main,
    Enter,
    Exit,
    Settings,
    SetAccessTime,
    SetTimezone,
    UserSetupAccessTime,
    UserSetupClientSecret,
    UserSetupTimezone,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conversation state '{0}' is unknown")]
pub struct UnknownStateError(pub String);

impl ConversationState {
    pub const ALL: [ConversationState; 9] = [
        ConversationState::Main,
        ConversationState::Enter,
        ConversationState::Exit,
        ConversationState::Settings,
        ConversationState::SetAccessTime,
        ConversationState::SetTimezone,
        ConversationState::UserSetupAccessTime,
        ConversationState::UserSetupClientSecret,
        ConversationState::UserSetupTimezone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Main => "main",
            ConversationState::Enter => "enter",
            ConversationState::Exit => "exit",
            ConversationState::Settings => "settings",
            ConversationState::SetAccessTime => "set_access_time",
            ConversationState::SetTimezone => "set_timezone",
            ConversationState::UserSetupAccessTime => "user_setup_access_time",
            ConversationState::UserSetupClientSecret => "user_setup_client_secret",
            ConversationState::UserSetupTimezone => "user_setup_timezone",
        }
    }

    /// First-time setup steps, as opposed to their change-setting counterparts.
    pub fn is_onboarding(&self) -> bool {
        matches!(
            self,
            ConversationState::UserSetupTimezone
                | ConversationState::UserSetupClientSecret
                | ConversationState::UserSetupAccessTime
        )
    }
}

impl Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationState {
    type Err = UnknownStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConversationState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownStateError(s.to_string()))
    }
}
