mod model;

use std::sync::Arc;

use async_trait::async_trait;
use model::DayEntryStorageModel;

use crate::clock::MonthKey;
use crate::models::{Credential, DayEntryRow, ExitFields, UserRecord};

use super::{
    ProvisionedSheet, SheetError, SpreadsheetClient, SpreadsheetProvider, ensure_authorized,
    workbook_title, workbook_url,
};

/// Workbook backend persisting day-entry rows next to the user store.
#[derive(Clone)]
pub struct SqliteWorkbook {
    pool: sqlx::SqlitePool,
    base_url: String,
}

impl SqliteWorkbook {
    pub fn new(pool: sqlx::SqlitePool, base_url: impl Into<String>) -> Self {
        Self {
            pool,
            base_url: base_url.into(),
        }
    }

    async fn workbook_key(&self, spreadsheet_id: &str) -> Result<i64, SheetError> {
        let unknown = || SheetError::UnknownSpreadsheet(spreadsheet_id.to_string());
        let id: i64 = spreadsheet_id.parse().map_err(|_| unknown())?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM workbooks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        exists.ok_or_else(unknown)
    }
}

#[async_trait]
impl SpreadsheetProvider for SqliteWorkbook {
    async fn connect(
        &self,
        credential: &Credential,
    ) -> Result<Arc<dyn SpreadsheetClient>, SheetError> {
        ensure_authorized(credential)?;
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl SpreadsheetClient for SqliteWorkbook {
    async fn provision(&self, user: &UserRecord) -> Result<ProvisionedSheet, SheetError> {
        let time_zone = user
            .time_zone
            .ok_or(SheetError::MissingTimeZone(user.id))?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO workbooks (owner_id, title, time_zone)
             VALUES (?, ?, ?)
             RETURNING id",
        )
        .bind(user.id)
        .bind(workbook_title())
        .bind(time_zone.name())
        .fetch_one(&self.pool)
        .await?;

        let id = id.to_string();
        log::info!("Provisioned workbook {} for user {}", id, user.id);

        Ok(ProvisionedSheet {
            url: workbook_url(&self.base_url, &id),
            id,
        })
    }

    async fn append_row(
        &self,
        spreadsheet_id: &str,
        month: MonthKey,
        row: &DayEntryRow,
    ) -> Result<(), SheetError> {
        let workbook_id = self.workbook_key(spreadsheet_id).await?;
        let DayEntryStorageModel {
            date,
            entry_time,
            theoretical_exit_time,
            exit_time,
            total_seconds,
            overtime_seconds,
        } = row.into();

        sqlx::query(
            "INSERT INTO day_entries (
                workbook_id, month_key, row_index, date, entry_time,
                theoretical_exit_time, exit_time, total_seconds, overtime_seconds
             )
             VALUES (
                ?1, ?2,
                (SELECT COALESCE(MAX(row_index) + 1, 0) FROM day_entries
                 WHERE workbook_id = ?1 AND month_key = ?2),
                ?3, ?4, ?5, ?6, ?7, ?8
             )",
        )
        .bind(workbook_id)
        .bind(month.to_string())
        .bind(date)
        .bind(entry_time)
        .bind(theoretical_exit_time)
        .bind(exit_time)
        .bind(total_seconds)
        .bind(overtime_seconds)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_row(
        &self,
        spreadsheet_id: &str,
        month: MonthKey,
        index: usize,
        fields: ExitFields,
    ) -> Result<(), SheetError> {
        let workbook_id = self.workbook_key(spreadsheet_id).await?;
        let row_index = i64::try_from(index).unwrap_or(i64::MAX);

        let result = sqlx::query(
            "UPDATE day_entries
             SET exit_time = ?,
                 total_seconds = ?,
                 overtime_seconds = ?
             WHERE workbook_id = ? AND month_key = ? AND row_index = ?",
        )
        .bind(fields.actual_exit_time)
        .bind(fields.total_duration.num_seconds())
        .bind(fields.overtime_duration.num_seconds())
        .bind(workbook_id)
        .bind(month.to_string())
        .bind(row_index)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SheetError::RowNotFound {
                spreadsheet_id: spreadsheet_id.to_string(),
                month,
                index,
            });
        }

        Ok(())
    }

    async fn read_rows(
        &self,
        spreadsheet_id: &str,
        month: MonthKey,
    ) -> Result<Vec<DayEntryRow>, SheetError> {
        let workbook_id = self.workbook_key(spreadsheet_id).await?;

        let rows = sqlx::query_as::<_, DayEntryStorageModel>(
            "SELECT date, entry_time, theoretical_exit_time, exit_time,
                    total_seconds, overtime_seconds
             FROM day_entries
             WHERE workbook_id = ? AND month_key = ?
             ORDER BY row_index",
        )
        .bind(workbook_id)
        .bind(month.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, TimeDelta};

    use crate::test_utils::memory_pool;

    use super::*;

    fn user() -> UserRecord {
        let mut user = UserRecord::new(5, "Grace");
        user.time_zone = Some(chrono_tz::Europe::Rome);
        user
    }

    fn open_row(day: u32) -> DayEntryRow {
        DayEntryRow {
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            actual_entry_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            theoretical_exit_time: NaiveTime::from_hms_opt(16, 42, 0).unwrap(),
            actual_exit_time: None,
            total_duration: None,
            overtime_duration: None,
        }
    }

    #[tokio::test]
    async fn provisioned_workbook_gets_an_url() {
        let workbook = SqliteWorkbook::new(memory_pool().await, "https://sheets.test");

        let sheet = workbook.provision(&user()).await.unwrap();

        assert_eq!(sheet.url, format!("https://sheets.test/{}", sheet.id));
    }

    #[tokio::test]
    async fn appended_rows_are_read_back_in_order() {
        let workbook = SqliteWorkbook::new(memory_pool().await, "https://sheets.test");
        let sheet = workbook.provision(&user()).await.unwrap();
        let march = MonthKey::of(open_row(1).date);

        workbook.append_row(&sheet.id, march, &open_row(3)).await.unwrap();
        workbook.append_row(&sheet.id, march, &open_row(4)).await.unwrap();

        let rows = workbook.read_rows(&sheet.id, march).await.unwrap();
        assert_eq!(rows, vec![open_row(3), open_row(4)]);
    }

    #[tokio::test]
    async fn second_row_for_the_same_date_is_refused() {
        let workbook = SqliteWorkbook::new(memory_pool().await, "https://sheets.test");
        let sheet = workbook.provision(&user()).await.unwrap();
        let march = MonthKey::of(open_row(1).date);
        workbook.append_row(&sheet.id, march, &open_row(3)).await.unwrap();
        workbook.append_row(&sheet.id, march, &open_row(4)).await.unwrap();

        let result = workbook.append_row(&sheet.id, march, &open_row(3)).await;

        assert!(matches!(result, Err(SheetError::Sqlx(_))));
        let rows = workbook.read_rows(&sheet.id, march).await.unwrap();
        assert_eq!(rows, vec![open_row(3), open_row(4)]);
    }

    #[tokio::test]
    async fn update_row_persists_exit_fields() {
        let workbook = SqliteWorkbook::new(memory_pool().await, "https://sheets.test");
        let sheet = workbook.provision(&user()).await.unwrap();
        let march = MonthKey::of(open_row(1).date);
        workbook.append_row(&sheet.id, march, &open_row(3)).await.unwrap();
        workbook.append_row(&sheet.id, march, &open_row(4)).await.unwrap();
        let fields = ExitFields {
            actual_exit_time: NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
            total_duration: TimeDelta::minutes(450),
            overtime_duration: TimeDelta::minutes(-12),
        };

        workbook.update_row(&sheet.id, march, 1, fields).await.unwrap();

        let rows = workbook.read_rows(&sheet.id, march).await.unwrap();
        assert!(rows[0].is_open());
        assert_eq!(rows[1].actual_exit_time, Some(fields.actual_exit_time));
        assert_eq!(rows[1].total_duration, Some(TimeDelta::minutes(450)));
        assert_eq!(rows[1].overtime_duration, Some(TimeDelta::minutes(-12)));
    }

    #[tokio::test]
    async fn update_of_missing_row_fails() {
        let workbook = SqliteWorkbook::new(memory_pool().await, "https://sheets.test");
        let sheet = workbook.provision(&user()).await.unwrap();
        let march = MonthKey::of(open_row(1).date);
        let fields = ExitFields {
            actual_exit_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            total_duration: TimeDelta::hours(8),
            overtime_duration: TimeDelta::zero(),
        };

        let result = workbook.update_row(&sheet.id, march, 0, fields).await;

        assert!(matches!(result, Err(SheetError::RowNotFound { index: 0, .. })));
    }

    #[tokio::test]
    async fn unknown_or_malformed_spreadsheet_ids_are_rejected() {
        let workbook = SqliteWorkbook::new(memory_pool().await, "https://sheets.test");
        let march = MonthKey::of(open_row(1).date);

        let unknown = workbook.read_rows("999", march).await;
        let malformed = workbook.append_row("not-a-number", march, &open_row(3)).await;

        assert!(matches!(unknown, Err(SheetError::UnknownSpreadsheet(_))));
        assert!(matches!(malformed, Err(SheetError::UnknownSpreadsheet(_))));
    }
}
