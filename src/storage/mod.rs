pub mod user_storage;

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use thiserror::Error;

use crate::models::{UserId, UserRecord};

pub use user_storage::{SqliteUserStorage, UserModelError};

pub static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Error)]
pub enum UserStorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Model(#[from] UserModelError),

    #[error("User {0} does not exist")]
    NotFound(UserId),
}

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, UserStorageError>;
    async fn insert(&self, user: &UserRecord) -> Result<(), UserStorageError>;
    async fn update(&self, user: &UserRecord) -> Result<(), UserStorageError>;
}

/// Opens (creating if needed) the SQLite database and applies migrations.
pub async fn open_database(url: &str) -> Result<sqlx::SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    MIGRATOR.run(&pool).await?;
    log::info!("Database at {} is ready", url);

    Ok(pool)
}
