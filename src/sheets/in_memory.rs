use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::clock::MonthKey;
use crate::models::{Credential, DayEntryRow, ExitFields, SpreadsheetId, UserId, UserRecord};

use super::{
    ProvisionedSheet, SheetError, SpreadsheetClient, SpreadsheetProvider, ensure_authorized,
    workbook_title, workbook_url,
};

struct Workbook {
    owner: UserId,
    title: String,
    months: HashMap<MonthKey, Vec<DayEntryRow>>,
}

#[derive(Default)]
struct WorkbookStore {
    next_id: u64,
    workbooks: HashMap<SpreadsheetId, Workbook>,
}

/// Volatile workbook backend. Everything is lost on restart.
#[derive(Clone)]
pub struct InMemoryWorkbook {
    base_url: String,
    store: Arc<RwLock<WorkbookStore>>,
}

impl InMemoryWorkbook {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            store: Arc::new(RwLock::new(WorkbookStore::default())),
        }
    }

    pub async fn workbook_count(&self) -> usize {
        self.store.read().await.workbooks.len()
    }
}

#[async_trait]
impl SpreadsheetProvider for InMemoryWorkbook {
    async fn connect(
        &self,
        credential: &Credential,
    ) -> Result<Arc<dyn SpreadsheetClient>, SheetError> {
        ensure_authorized(credential)?;
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl SpreadsheetClient for InMemoryWorkbook {
    async fn provision(&self, user: &UserRecord) -> Result<ProvisionedSheet, SheetError> {
        if user.time_zone.is_none() {
            return Err(SheetError::MissingTimeZone(user.id));
        }

        let mut store = self.store.write().await;
        let id = format!("mem-{}", store.next_id);
        store.next_id += 1;

        let workbook = Workbook {
            owner: user.id,
            title: workbook_title(),
            months: HashMap::new(),
        };
        log::info!(
            "Provisioned in-memory workbook '{}' ({}) for user {}",
            id,
            workbook.title,
            workbook.owner
        );
        store.workbooks.insert(id.clone(), workbook);

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
        let mut store = self.store.write().await;
        let workbook = store
            .workbooks
            .get_mut(spreadsheet_id)
            .ok_or_else(|| SheetError::UnknownSpreadsheet(spreadsheet_id.to_string()))?;

        workbook.months.entry(month).or_default().push(row.clone());
        Ok(())
    }

    async fn update_row(
        &self,
        spreadsheet_id: &str,
        month: MonthKey,
        index: usize,
        fields: ExitFields,
    ) -> Result<(), SheetError> {
        let mut store = self.store.write().await;
        let workbook = store
            .workbooks
            .get_mut(spreadsheet_id)
            .ok_or_else(|| SheetError::UnknownSpreadsheet(spreadsheet_id.to_string()))?;

        let row = workbook
            .months
            .get_mut(&month)
            .and_then(|rows| rows.get_mut(index))
            .ok_or_else(|| SheetError::RowNotFound {
                spreadsheet_id: spreadsheet_id.to_string(),
                month,
                index,
            })?;

        row.apply_exit(fields);
        Ok(())
    }

    async fn read_rows(
        &self,
        spreadsheet_id: &str,
        month: MonthKey,
    ) -> Result<Vec<DayEntryRow>, SheetError> {
        let store = self.store.read().await;
        let workbook = store
            .workbooks
            .get(spreadsheet_id)
            .ok_or_else(|| SheetError::UnknownSpreadsheet(spreadsheet_id.to_string()))?;

        Ok(workbook.months.get(&month).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, TimeDelta};

    use super::*;

    fn user() -> UserRecord {
        let mut user = UserRecord::new(1, "Ada");
        user.time_zone = Some(chrono_tz::Europe::Rome);
        user
    }

    fn row(day: u32) -> DayEntryRow {
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
    async fn rejects_empty_credential() {
        let workbook = InMemoryWorkbook::new("https://sheets.test");

        let result = workbook.connect(&Credential::new("  ")).await;

        assert!(matches!(result, Err(SheetError::Unauthorized)));
    }

    #[tokio::test]
    async fn provision_requires_time_zone() {
        let workbook = InMemoryWorkbook::new("https://sheets.test");

        let result = workbook.provision(&UserRecord::new(1, "Ada")).await;

        assert!(matches!(result, Err(SheetError::MissingTimeZone(1))));
        assert_eq!(workbook.workbook_count().await, 0);
    }

    #[tokio::test]
    async fn rows_are_kept_per_month_in_append_order() {
        let workbook = InMemoryWorkbook::new("https://sheets.test/");
        let sheet = workbook.provision(&user()).await.unwrap();
        let march = MonthKey::of(row(1).date);

        workbook.append_row(&sheet.id, march, &row(3)).await.unwrap();
        workbook.append_row(&sheet.id, march, &row(4)).await.unwrap();

        let rows = workbook.read_rows(&sheet.id, march).await.unwrap();
        assert_eq!(sheet.url, format!("https://sheets.test/{}", sheet.id));
        assert_eq!(rows, vec![row(3), row(4)]);

        let april = MonthKey::of(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert!(workbook.read_rows(&sheet.id, april).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_fills_exit_fields_of_the_indexed_row() {
        let workbook = InMemoryWorkbook::new("https://sheets.test");
        let sheet = workbook.provision(&user()).await.unwrap();
        let march = MonthKey::of(row(1).date);
        workbook.append_row(&sheet.id, march, &row(3)).await.unwrap();
        let fields = ExitFields {
            actual_exit_time: NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
            total_duration: TimeDelta::minutes(510),
            overtime_duration: TimeDelta::minutes(48),
        };

        workbook.update_row(&sheet.id, march, 0, fields).await.unwrap();
        let missing = workbook.update_row(&sheet.id, march, 1, fields).await;

        let rows = workbook.read_rows(&sheet.id, march).await.unwrap();
        assert_eq!(rows[0].actual_exit_time, Some(fields.actual_exit_time));
        assert_eq!(rows[0].overtime_duration, Some(TimeDelta::minutes(48)));
        assert!(matches!(missing, Err(SheetError::RowNotFound { index: 1, .. })));
    }

    #[tokio::test]
    async fn unknown_spreadsheet_is_an_error() {
        let workbook = InMemoryWorkbook::new("https://sheets.test");
        let march = MonthKey::of(row(1).date);

        let result = workbook.read_rows("mem-42", march).await;

        assert!(matches!(result, Err(SheetError::UnknownSpreadsheet(id)) if id == "mem-42"));
    }
}
