use std::sync::Arc;

use anyhow::Context;
use chrono_tz::Tz;
use teloxide::Bot;
use workday_bot::{
    auth::LocalCredentialExchange,
    conversation::ConversationMachine,
    dispatcher::{ConversationDispatcher, SESSION_IDLE_TIMEOUT, SESSION_SWEEP_PERIOD},
    geo::BoundaryTimeZoneResolver,
    settings::{AppSettings, SpreadsheetBackend},
    sheets::{InMemoryWorkbook, SpreadsheetProvider, SqliteWorkbook},
    storage::{self, SqliteUserStorage},
    telegram::{TelegramChatTransport, TelegramInteractionInterface},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load().context("Failed to load application settings")?;
    let pool = storage::open_database(&settings.database.url)
        .await
        .context("Failed to open the database")?;

    let spreadsheets: Arc<dyn SpreadsheetProvider> = match settings.spreadsheet.backend {
        SpreadsheetBackend::Sqlite => Arc::new(SqliteWorkbook::new(
            pool.clone(),
            settings.spreadsheet.base_url.clone(),
        )),
        SpreadsheetBackend::Memory => {
            log::warn!("Using the in-memory workbook, recorded hours are lost on restart");
            Arc::new(InMemoryWorkbook::new(settings.spreadsheet.base_url.clone()))
        }
    };

    let fallback_time_zone = settings
        .geocoding
        .fallback_time_zone
        .as_deref()
        .map(str::parse::<Tz>)
        .transpose()
        .map_err(|err| anyhow::anyhow!("Invalid fallback time zone: {err}"))?;

    let machine = ConversationMachine::new(
        Arc::new(BoundaryTimeZoneResolver::new(fallback_time_zone)),
        Arc::new(LocalCredentialExchange::new(settings.authorization.url.clone())),
        spreadsheets,
    );

    let bot = Bot::new(settings.telegram.token.clone());
    let dispatcher = Arc::new(ConversationDispatcher::new(
        Arc::new(SqliteUserStorage::new(pool)),
        machine,
        Arc::new(TelegramChatTransport::new(bot.clone())),
    ));
    let sweeper = dispatcher.spawn_session_sweeper(SESSION_IDLE_TIMEOUT, SESSION_SWEEP_PERIOD);

    TelegramInteractionInterface::start(bot, dispatcher).await;
    sweeper.abort();

    Ok(())
}
