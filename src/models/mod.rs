pub mod day_entry;
pub mod state;
pub mod user;

pub use day_entry::{DayEntryRow, ExitFields};
pub use state::{ConversationState, UnknownStateError};
pub use user::{AccessWindow, Credential, SpreadsheetId, UserId, UserRecord};
