use std::sync::LazyLock;

use chrono::{NaiveTime, TimeDelta};
use regex::Regex;

use crate::clock::{format_time, parse_time_of_day};
use crate::models::AccessWindow;

use super::reply::{Button, Keyboard};

static ACCESS_WINDOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}:\d{2})\s*-\s*(\d{1,2}:\d{2})\s*$")
        .expect("access window pattern is valid")
});

const PICKER_SIZE: i32 = 5;
const PICKER_STEP_MINUTES: i64 = 30;

/// Parses `"<start> - <end>"`. Start and end are not compared.
pub fn parse_access_window(text: &str) -> Option<AccessWindow> {
    let captures = ACCESS_WINDOW.captures(text)?;

    Some(AccessWindow {
        start: parse_time_of_day(&captures[1])?,
        end: parse_time_of_day(&captures[2])?,
    })
}

/// Half-hour windows starting at 08:00.
pub fn picker_keyboard() -> Keyboard {
    let step = TimeDelta::minutes(PICKER_STEP_MINUTES);
    let first = NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN);

    (0..PICKER_SIZE)
        .map(|slot| {
            let start = first + step * slot;
            let end = start + step;
            format!("{} - {}", format_time(start), format_time(end))
        })
        .fold(Keyboard::default().one_time(), |keyboard, label| {
            keyboard.row([Button::Text(label)])
        })
}
