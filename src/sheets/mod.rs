mod in_memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use thiserror::Error;

use crate::clock::MonthKey;
use crate::models::{Credential, DayEntryRow, ExitFields, SpreadsheetId, UserId, UserRecord};

pub use in_memory::InMemoryWorkbook;
pub use sqlite::SqliteWorkbook;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Credential was rejected by the spreadsheet provider")]
    Unauthorized,

    #[error("Spreadsheet '{0}' does not exist")]
    UnknownSpreadsheet(SpreadsheetId),

    #[error("Row {index} of {month} does not exist in spreadsheet '{spreadsheet_id}'")]
    RowNotFound {
        spreadsheet_id: SpreadsheetId,
        month: MonthKey,
        index: usize,
    },

    #[error("User {0} has no time zone, cannot provision a spreadsheet")]
    MissingTimeZone(UserId),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedSheet {
    pub id: SpreadsheetId,
    pub url: String,
}

/// Hands out clients authorized by a user's credential.
#[async_trait]
pub trait SpreadsheetProvider: Send + Sync {
    async fn connect(
        &self,
        credential: &Credential,
    ) -> Result<Arc<dyn SpreadsheetClient>, SheetError>;
}

/// Month-scoped, append-only log of day-entry rows. Row indexes are the
/// physical append order within a month.
#[async_trait]
pub trait SpreadsheetClient: Send + Sync {
    async fn provision(&self, user: &UserRecord) -> Result<ProvisionedSheet, SheetError>;

    async fn append_row(
        &self,
        spreadsheet_id: &str,
        month: MonthKey,
        row: &DayEntryRow,
    ) -> Result<(), SheetError>;

    async fn update_row(
        &self,
        spreadsheet_id: &str,
        month: MonthKey,
        index: usize,
        fields: ExitFields,
    ) -> Result<(), SheetError>;

    async fn read_rows(
        &self,
        spreadsheet_id: &str,
        month: MonthKey,
    ) -> Result<Vec<DayEntryRow>, SheetError>;
}

fn workbook_title() -> String {
    format!("Workbook {}", Utc::now().year())
}

fn workbook_url(base_url: &str, id: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), id)
}

fn ensure_authorized(credential: &Credential) -> Result<(), SheetError> {
    if credential.expose().trim().is_empty() {
        Err(SheetError::Unauthorized)
    } else {
        Ok(())
    }
}
