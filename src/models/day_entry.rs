use chrono::{NaiveDate, NaiveTime, TimeDelta};

/// One row per user and local calendar day. A row without exit time is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntryRow {
    pub date: NaiveDate,
    pub actual_entry_time: NaiveTime,
    pub theoretical_exit_time: NaiveTime,
    pub actual_exit_time: Option<NaiveTime>,
    pub total_duration: Option<TimeDelta>,
    pub overtime_duration: Option<TimeDelta>,
}

/// Fields filled in, once, when the exit is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitFields {
    pub actual_exit_time: NaiveTime,
    pub total_duration: TimeDelta,
    pub overtime_duration: TimeDelta,
}

impl DayEntryRow {
    pub fn is_open(&self) -> bool {
        self.actual_exit_time.is_none()
    }

    pub fn apply_exit(&mut self, fields: ExitFields) {
        self.actual_exit_time = Some(fields.actual_exit_time);
        self.total_duration = Some(fields.total_duration);
        self.overtime_duration = Some(fields.overtime_duration);
    }
}
