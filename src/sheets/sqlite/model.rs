use chrono::{NaiveDate, NaiveTime, TimeDelta};

use crate::models::DayEntryRow;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DayEntryStorageModel {
    pub date: NaiveDate,
    pub entry_time: NaiveTime,
    pub theoretical_exit_time: NaiveTime,
    pub exit_time: Option<NaiveTime>,
    pub total_seconds: Option<i64>,
    pub overtime_seconds: Option<i64>,
}

impl From<&DayEntryRow> for DayEntryStorageModel {
    fn from(value: &DayEntryRow) -> Self {
        Self {
            date: value.date,
            entry_time: value.actual_entry_time,
            theoretical_exit_time: value.theoretical_exit_time,
            exit_time: value.actual_exit_time,
            total_seconds: value.total_duration.map(|d| d.num_seconds()),
            overtime_seconds: value.overtime_duration.map(|d| d.num_seconds()),
        }
    }
}

impl From<DayEntryStorageModel> for DayEntryRow {
    fn from(value: DayEntryStorageModel) -> Self {
        Self {
            date: value.date,
            actual_entry_time: value.entry_time,
            theoretical_exit_time: value.theoretical_exit_time,
            actual_exit_time: value.exit_time,
            total_duration: value.total_seconds.map(TimeDelta::seconds),
            overtime_duration: value.overtime_seconds.map(TimeDelta::seconds),
        }
    }
}
