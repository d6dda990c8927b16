pub mod policy;


use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::clock::{MonthKey, to_local, truncate_to_minute};
use crate::models::{DayEntryRow, UserId, UserRecord};
use crate::sheets::{SheetError, SpreadsheetClient};

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Entry for {0} was already recorded")]
    DuplicateEntry(NaiveDate),

    #[error("No entry recorded for {0}")]
    NoOpenEntry(NaiveDate),

    #[error("Exit for {0} was already recorded")]
    DuplicateExit(NaiveDate),

    #[error("User {0} has no time zone")]
    MissingTimeZone(UserId),

    #[error("User {0} has no spreadsheet")]
    NotProvisioned(UserId),

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

impl TrackingError {
    /// Expected outcomes the user is told about, as opposed to faults.
    pub fn is_business_outcome(&self) -> bool {
        matches!(
            self,
            TrackingError::DuplicateEntry(_)
                | TrackingError::NoOpenEntry(_)
                | TrackingError::DuplicateExit(_)
        )
    }
}

fn locate(user: &UserRecord, at: DateTime<Utc>) -> Result<(&str, NaiveDateTime), TrackingError> {
    let time_zone = user
        .time_zone
        .ok_or(TrackingError::MissingTimeZone(user.id))?;
    let spreadsheet_id = user
        .spreadsheet_id
        .as_deref()
        .ok_or(TrackingError::NotProvisioned(user.id))?;

    Ok((spreadsheet_id, to_local(at, time_zone)))
}

/// Appends today's row unless the month already has one for today.
pub async fn record_entry(
    sheet: &dyn SpreadsheetClient,
    user: &UserRecord,
    at: DateTime<Utc>,
) -> Result<DayEntryRow, TrackingError> {
    let (spreadsheet_id, local) = locate(user, at)?;
    let today = local.date();
    let month = MonthKey::of(today);

    let rows = sheet.read_rows(spreadsheet_id, month).await?;
    if rows.iter().any(|row| row.date == today) {
        return Err(TrackingError::DuplicateEntry(today));
    }

    let entry = truncate_to_minute(local.time());
    let row = DayEntryRow {
        date: today,
        actual_entry_time: entry,
        theoretical_exit_time: policy::theoretical_exit(entry, user.nominal_work_duration),
        actual_exit_time: None,
        total_duration: None,
        overtime_duration: None,
    };
    sheet.append_row(spreadsheet_id, month, &row).await?;
    log::info!("User {} entered at {} on {}", user.id, entry, today);

    Ok(row)
}

/// Closes today's row in place, wherever it sits in the month. Rows can be
/// out of date order once the user's time zone changes.
pub async fn record_exit(
    sheet: &dyn SpreadsheetClient,
    user: &UserRecord,
    at: DateTime<Utc>,
) -> Result<DayEntryRow, TrackingError> {
    let (spreadsheet_id, local) = locate(user, at)?;
    let today = local.date();
    let month = MonthKey::of(today);

    let mut rows = sheet.read_rows(spreadsheet_id, month).await?;
    let Some(index) = rows.iter().rposition(|row| row.date == today) else {
        return Err(TrackingError::NoOpenEntry(today));
    };
    let mut row = rows.swap_remove(index);
    if !row.is_open() {
        return Err(TrackingError::DuplicateExit(today));
    }

    let fields = policy::exit_fields(
        &row,
        truncate_to_minute(local.time()),
        user.nominal_work_duration,
        user.overtime_threshold,
    );
    sheet
        .update_row(spreadsheet_id, month, index, fields)
        .await?;
    row.apply_exit(fields);
    log::info!(
        "User {} exited at {} on {}, overtime {}",
        user.id,
        fields.actual_exit_time,
        today,
        fields.overtime_duration
    );

    Ok(row)
}
