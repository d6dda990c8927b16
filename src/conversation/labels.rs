use chrono_tz::Tz;

use crate::models::AccessWindow;

use super::reply::{Button, Keyboard};

pub const ENTER: &str = "Enter";
pub const EXIT: &str = "Exit";
pub const SETTINGS: &str = "🔧 Settings";
pub const BACK: &str = "🔙";
pub const CHANGE_ACCESS_TIME: &str = "🕙 Change access time";
pub const CHANGE_TIME_ZONE: &str = "🌍 Change time zone";
pub const SEND_LOCATION: &str = "🌍 Send location";

pub fn change_access_time(window: Option<AccessWindow>) -> String {
    match window {
        Some(window) => format!("{CHANGE_ACCESS_TIME} (from {window})"),
        None => CHANGE_ACCESS_TIME.to_string(),
    }
}

pub fn change_time_zone(time_zone: Option<Tz>) -> String {
    match time_zone {
        Some(time_zone) => format!("{CHANGE_TIME_ZONE} (from {time_zone})"),
        None => CHANGE_TIME_ZONE.to_string(),
    }
}

pub fn main_keyboard() -> Keyboard {
    Keyboard::default().row([
        Button::Text(ENTER.to_string()),
        Button::Text(EXIT.to_string()),
        Button::Text(SETTINGS.to_string()),
    ])
}

pub fn settings_keyboard(window: Option<AccessWindow>, time_zone: Option<Tz>) -> Keyboard {
    Keyboard::default()
        .row([Button::Text(BACK.to_string())])
        .row([Button::Text(change_access_time(window))])
        .row([Button::Text(change_time_zone(time_zone))])
        .one_time()
}

pub fn location_keyboard() -> Keyboard {
    Keyboard::default()
        .row([Button::RequestLocation(SEND_LOCATION.to_string())])
        .one_time()
}
