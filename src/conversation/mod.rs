pub mod access_window;
pub mod event;
pub mod labels;
pub mod reply;
pub mod routing;


use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::CredentialExchange;
use crate::clock::{format_signed_duration, format_time};
use crate::geo::TimeZoneResolver;
use crate::models::{ConversationState, DayEntryRow, UserRecord};
use crate::sheets::{SheetError, SpreadsheetClient, SpreadsheetProvider};
use crate::tracking::{self, TrackingError};

use access_window::{parse_access_window, picker_keyboard};
use event::InboundEvent;
use labels::{location_keyboard, main_keyboard, settings_keyboard};
use reply::Reply;

/// Upper bound on chained entry actions triggered by a single message.
const MAX_ENTRY_ACTIONS: usize = 8;

pub const FINISH_SETUP: &str = "You have not finished setting up yet. Send /start to begin.";

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("Entry actions did not settle, last state was {0}")]
    TransitionLoop(ConversationState),
}

/// What a handler wants to happen after it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    AwaitInput,
    EnterState(ConversationState),
}

/// Working copy of a user for the duration of one message.
pub struct Turn<'a> {
    pub user: UserRecord,
    pub sheet_client: &'a mut Option<Arc<dyn SpreadsheetClient>>,
    pub outbox: Vec<Reply>,
}

impl<'a> Turn<'a> {
    pub fn new(user: UserRecord, sheet_client: &'a mut Option<Arc<dyn SpreadsheetClient>>) -> Self {
        Self {
            user,
            sheet_client,
            outbox: Vec::new(),
        }
    }

    fn say(&mut self, text: impl Into<String>) {
        self.outbox.push(Reply::text(text));
    }

    fn send(&mut self, reply: Reply) {
        self.outbox.push(reply);
    }
}

pub struct ConversationMachine {
    time_zones: Arc<dyn TimeZoneResolver>,
    credentials: Arc<dyn CredentialExchange>,
    spreadsheets: Arc<dyn SpreadsheetProvider>,
}

impl ConversationMachine {
    pub fn new(
        time_zones: Arc<dyn TimeZoneResolver>,
        credentials: Arc<dyn CredentialExchange>,
        spreadsheets: Arc<dyn SpreadsheetProvider>,
    ) -> Self {
        Self {
            time_zones,
            credentials,
            spreadsheets,
        }
    }

    /// Feeds one message to the machine. On error the turn must be discarded.
    pub async fn handle(
        &self,
        turn: &mut Turn<'_>,
        event: &InboundEvent,
    ) -> Result<(), ConversationError> {
        let next = match routing::route(event) {
            Some(state) => Next::EnterState(state),
            None => self.on_input(turn, event).await?,
        };

        self.settle(turn, event.timestamp, next).await
    }

    async fn settle(
        &self,
        turn: &mut Turn<'_>,
        at: DateTime<Utc>,
        mut next: Next,
    ) -> Result<(), ConversationError> {
        for _ in 0..MAX_ENTRY_ACTIONS {
            match next {
                Next::AwaitInput => return Ok(()),
                Next::EnterState(state) => {
                    log::debug!("User {}: {} -> {}", turn.user.id, turn.user.state, state);
                    turn.user.state = state;
                    next = self.on_enter(turn, at).await?;
                }
            }
        }

        Err(ConversationError::TransitionLoop(turn.user.state))
    }

    /// State entry action: renders the prompt or runs the automatic step.
    async fn on_enter(
        &self,
        turn: &mut Turn<'_>,
        at: DateTime<Utc>,
    ) -> Result<Next, ConversationError> {
        match turn.user.state {
            ConversationState::Main => {
                turn.send(Reply::text("Choose an operation.").with_keyboard(main_keyboard()));
                Ok(Next::AwaitInput)
            }
            ConversationState::Enter => self.enter(turn, at).await,
            ConversationState::Exit => self.exit(turn, at).await,
            ConversationState::Settings => {
                let keyboard = settings_keyboard(turn.user.access_window, turn.user.time_zone);
                turn.send(Reply::text("Which setting do you want to change?").with_keyboard(keyboard));
                Ok(Next::AwaitInput)
            }
            ConversationState::UserSetupTimezone => {
                let greeting = format!("Hi {}!", turn.user.first_name);
                turn.say(greeting);
                turn.send(
                    Reply::text("To begin, send me your location so I can work out your time zone.")
                        .with_keyboard(location_keyboard()),
                );
                Ok(Next::AwaitInput)
            }
            ConversationState::SetTimezone => {
                turn.send(Reply::text("Please send me your location.").with_keyboard(location_keyboard()));
                Ok(Next::AwaitInput)
            }
            ConversationState::UserSetupClientSecret => {
                let url = self.credentials.authorization_url();
                turn.say("To record your working hours I need access to your spreadsheet.");
                turn.say(format!(
                    "Please visit this link and send me the authorization code: {url}"
                ));
                Ok(Next::AwaitInput)
            }
            ConversationState::UserSetupAccessTime => {
                turn.send(Reply::text("Finally, choose your access time.").with_keyboard(picker_keyboard()));
                Ok(Next::AwaitInput)
            }
            ConversationState::SetAccessTime => {
                turn.send(Reply::text("Please choose your access time.").with_keyboard(picker_keyboard()));
                Ok(Next::AwaitInput)
            }
        }
    }

    /// Consumes a message that was not routed elsewhere.
    async fn on_input(
        &self,
        turn: &mut Turn<'_>,
        event: &InboundEvent,
    ) -> Result<Next, ConversationError> {
        match turn.user.state {
            // Automatic states never wait for input; a stray message lands on the menu.
            ConversationState::Main | ConversationState::Enter | ConversationState::Exit => {
                Ok(Next::EnterState(ConversationState::Main))
            }
            ConversationState::Settings => Ok(Next::EnterState(ConversationState::Settings)),
            ConversationState::UserSetupTimezone | ConversationState::SetTimezone => {
                self.receive_location(turn, event).await
            }
            ConversationState::UserSetupClientSecret => self.receive_auth_code(turn, event).await,
            ConversationState::UserSetupAccessTime | ConversationState::SetAccessTime => {
                Ok(receive_access_window(turn, event))
            }
        }
    }

    async fn enter(
        &self,
        turn: &mut Turn<'_>,
        at: DateTime<Utc>,
    ) -> Result<Next, ConversationError> {
        if !turn.user.can_track_time() {
            turn.say(FINISH_SETUP);
            return Ok(Next::EnterState(ConversationState::Main));
        }

        let sheet = self.sheet_client(turn).await?;
        match tracking::record_entry(sheet.as_ref(), &turn.user, at).await {
            Ok(row) => turn.say(entry_confirmation(&row)),
            Err(err) if err.is_business_outcome() => turn.say(outcome_message(&err)),
            Err(err) => return Err(err.into()),
        }

        Ok(Next::EnterState(ConversationState::Main))
    }

    async fn exit(
        &self,
        turn: &mut Turn<'_>,
        at: DateTime<Utc>,
    ) -> Result<Next, ConversationError> {
        if !turn.user.can_track_time() {
            turn.say(FINISH_SETUP);
            return Ok(Next::EnterState(ConversationState::Main));
        }

        let sheet = self.sheet_client(turn).await?;
        match tracking::record_exit(sheet.as_ref(), &turn.user, at).await {
            Ok(row) => turn.say(exit_confirmation(&row)),
            Err(err) if err.is_business_outcome() => turn.say(outcome_message(&err)),
            Err(err) => return Err(err.into()),
        }

        Ok(Next::EnterState(ConversationState::Main))
    }

    async fn receive_location(
        &self,
        turn: &mut Turn<'_>,
        event: &InboundEvent,
    ) -> Result<Next, ConversationError> {
        let Some(location) = event.location else {
            turn.send(Reply::text("Please send me your location.").with_keyboard(location_keyboard()));
            return Ok(Next::AwaitInput);
        };

        let time_zone = match self.time_zones.resolve_time_zone(location).await {
            Ok(time_zone) => time_zone,
            Err(err) => {
                log::warn!("Could not resolve time zone for user {}: {}", turn.user.id, err);
                turn.send(
                    Reply::text("I could not work out a time zone from that location, please try again.")
                        .with_keyboard(location_keyboard()),
                );
                return Ok(Next::AwaitInput);
            }
        };

        turn.user.time_zone = Some(time_zone);
        turn.say(format!("Thanks! Your time zone is '{time_zone}'."));

        Ok(Next::EnterState(match turn.user.state {
            ConversationState::UserSetupTimezone => ConversationState::UserSetupClientSecret,
            _ => ConversationState::Main,
        }))
    }

    async fn receive_auth_code(
        &self,
        turn: &mut Turn<'_>,
        event: &InboundEvent,
    ) -> Result<Next, ConversationError> {
        let Some(code) = event.text() else {
            return Ok(Next::EnterState(ConversationState::UserSetupClientSecret));
        };

        let credential = match self.credentials.exchange_auth_code(code).await {
            Ok(credential) => credential,
            Err(err) => {
                log::warn!("Authorization failed for user {}: {}", turn.user.id, err);
                turn.say("Could not obtain the authorization. Please try again.");
                return Ok(Next::EnterState(ConversationState::UserSetupClientSecret));
            }
        };

        let client = self.spreadsheets.connect(&credential).await?;
        turn.user.credential = Some(credential);
        *turn.sheet_client = Some(client.clone());
        turn.say("Authorization successful!");

        if let Some(spreadsheet_id) = &turn.user.spreadsheet_id {
            log::info!(
                "User {} re-authorized, keeping spreadsheet {}",
                turn.user.id,
                spreadsheet_id
            );
            turn.say("Your existing spreadsheet will keep being used.");
            return Ok(Next::EnterState(ConversationState::UserSetupAccessTime));
        }

        turn.say("Now I am creating a new spreadsheet for you. It may take a few seconds...");
        let sheet = client.provision(&turn.user).await?;
        turn.user.spreadsheet_id = Some(sheet.id);
        turn.say("Done!");
        turn.say(format!("You will find your recorded hours at: {}", sheet.url));

        Ok(Next::EnterState(ConversationState::UserSetupAccessTime))
    }

    /// Session-cached client, connected on first use.
    async fn sheet_client(
        &self,
        turn: &mut Turn<'_>,
    ) -> Result<Arc<dyn SpreadsheetClient>, ConversationError> {
        if let Some(client) = turn.sheet_client.as_ref() {
            return Ok(client.clone());
        }

        let credential = turn
            .user
            .credential
            .as_ref()
            .ok_or(SheetError::Unauthorized)?;
        let client = self.spreadsheets.connect(credential).await?;
        *turn.sheet_client = Some(client.clone());

        Ok(client)
    }
}

fn receive_access_window(turn: &mut Turn<'_>, event: &InboundEvent) -> Next {
    let Some(window) = event.text().and_then(parse_access_window) else {
        turn.send(
            Reply::text("I can't understand what you wrote, please try again.")
                .with_keyboard(picker_keyboard()),
        );
        return Next::AwaitInput;
    };

    turn.user.access_window = Some(window);
    turn.say(format!("Thanks! You chose the time slot {window}."));
    if turn.user.state.is_onboarding() {
        let congratulations = format!(
            "Congratulations {}, you can now start tracking your working hours!",
            turn.user.first_name
        );
        turn.say(congratulations);
    }

    Next::EnterState(ConversationState::Main)
}

/// What the user is told when tracking refuses an entry or exit.
fn outcome_message(err: &TrackingError) -> String {
    match err {
        TrackingError::DuplicateEntry(_) => {
            "You have already entered today. How many times do you want to come in?".to_string()
        }
        TrackingError::NoOpenEntry(_) => {
            "You have not entered today yet. You need to come in before you can leave!".to_string()
        }
        TrackingError::DuplicateExit(_) => {
            "You have already left today. Enjoy your evening!".to_string()
        }
        other => other.to_string(),
    }
}

fn entry_confirmation(row: &DayEntryRow) -> String {
    format!(
        "Entry recorded at {}. Your theoretical exit time is {}.",
        format_time(row.actual_entry_time),
        format_time(row.theoretical_exit_time)
    )
}

fn exit_confirmation(row: &DayEntryRow) -> String {
    let total = row.total_duration.unwrap_or_default();
    let overtime = row.overtime_duration.unwrap_or_default();

    format!(
        "Exit recorded successfully. You worked {} with an overtime of {}. Have a nice evening!",
        format_signed_duration(total),
        format_signed_duration(overtime)
    )
}
