pub mod auth;
pub mod clock;
pub mod conversation;
pub mod dispatcher;
pub mod geo;
pub mod models;
pub mod settings;
pub mod sheets;
pub mod storage;
pub mod telegram;
pub mod tracking;

#[cfg(test)]
mod test_utils;
