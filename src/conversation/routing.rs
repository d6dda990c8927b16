use crate::models::ConversationState;

use super::event::{Command, InboundEvent};
use super::labels;

/// State a message jumps to regardless of the current one. Routed messages
/// are consumed: the target state only runs its entry action.
pub fn route(event: &InboundEvent) -> Option<ConversationState> {
    if let Some(command) = event.command {
        return Some(match command {
            Command::Start => ConversationState::UserSetupTimezone,
            Command::Enter => ConversationState::Enter,
            Command::Exit => ConversationState::Exit,
            Command::Settings => ConversationState::Settings,
        });
    }

    let text = event.text()?;
    match text {
        labels::ENTER => Some(ConversationState::Enter),
        labels::EXIT => Some(ConversationState::Exit),
        labels::SETTINGS => Some(ConversationState::Settings),
        labels::BACK => Some(ConversationState::Main),
        _ if text.starts_with(labels::CHANGE_ACCESS_TIME) => {
            Some(ConversationState::SetAccessTime)
        }
        _ if text.starts_with(labels::CHANGE_TIME_ZONE) => Some(ConversationState::SetTimezone),
        _ => None,
    }
}
