mod transport;

use std::sync::Arc;

use teloxide::{macros::BotCommands, prelude::*};

use crate::conversation::event::{Command, InboundEvent};
use crate::dispatcher::ConversationDispatcher;
use crate::geo::Location;

pub use transport::TelegramChatTransport;

type HandlerResult = anyhow::Result<()>;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum TelegramCommand {
    /// Set up time zone, spreadsheet and access time.
    Start,
    /// Record today's entry.
    Enter,
    /// Record today's exit.
    Exit,
    /// Change your settings.
    Settings,
}

impl From<TelegramCommand> for Command {
    fn from(value: TelegramCommand) -> Self {
        match value {
            TelegramCommand::Start => Command::Start,
            TelegramCommand::Enter => Command::Enter,
            TelegramCommand::Exit => Command::Exit,
            TelegramCommand::Settings => Command::Settings,
        }
    }
}

pub struct TelegramInteractionInterface;
impl TelegramInteractionInterface {
    pub async fn start(bot: Bot, dispatcher: Arc<ConversationDispatcher>) {
        log::info!("Starting Telegram interaction interface");

        let command_handler =
            teloxide::filter_command::<TelegramCommand, _>().endpoint(on_command);

        let schema = Update::filter_message()
            .branch(command_handler)
            .branch(dptree::endpoint(on_message));

        Dispatcher::builder(bot, schema)
            .dependencies(dptree::deps![dispatcher])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await
    }
}

/// The sender identifies the user; replies go back to the chat, which is a
/// group for group messages. Messages without a sender are skipped.
fn inbound_event(msg: &Message) -> Option<InboundEvent> {
    let Some(sender) = msg.from.as_ref() else {
        log::debug!("Ignoring message {} in chat {} without a sender", msg.id.0, msg.chat.id.0);
        return None;
    };
    let Ok(user_id) = i64::try_from(sender.id.0) else {
        log::warn!("Ignoring message from out-of-range user id {}", sender.id.0);
        return None;
    };

    let mut event = InboundEvent::new(user_id, sender.first_name.clone(), msg.date)
        .in_chat(msg.chat.id.0);
    event.text = msg.text().map(str::to_string);
    event.location = msg.location().map(|location| Location {
        latitude: location.latitude,
        longitude: location.longitude,
    });

    Some(event)
}

async fn on_command(
    msg: Message,
    command: TelegramCommand,
    dispatcher: Arc<ConversationDispatcher>,
) -> HandlerResult {
    match inbound_event(&msg) {
        Some(event) => handle(&dispatcher, event.with_command(command.into())).await,
        None => Ok(()),
    }
}

async fn on_message(msg: Message, dispatcher: Arc<ConversationDispatcher>) -> HandlerResult {
    match inbound_event(&msg) {
        Some(event) => handle(&dispatcher, event).await,
        None => Ok(()),
    }
}

/// One user's failure must not stop the bot for everyone else.
async fn handle(dispatcher: &ConversationDispatcher, event: InboundEvent) -> HandlerResult {
    let user_id = event.user_id;
    if let Err(err) = dispatcher.handle(event).await {
        log::error!("Could not handle message from user {}: {}", user_id, err);
    }

    Ok(())
}
