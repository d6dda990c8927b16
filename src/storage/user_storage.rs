mod model;

use async_trait::async_trait;
use model::UserStorageModel;

use crate::models::{UserId, UserRecord};

use super::{UserStorage, UserStorageError};

pub use model::UserModelError;

pub struct SqliteUserStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteUserStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStorage for SqliteUserStorage {
    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, UserStorageError> {
        let user = sqlx::query_as::<_, UserStorageModel>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user.map(UserRecord::try_from).transpose()?)
    }

    async fn insert(&self, user: &UserRecord) -> Result<(), UserStorageError> {
        let UserStorageModel {
            id,
            first_name,
            state,
            time_zone,
            access_window_start,
            access_window_end,
            nominal_work_seconds,
            overtime_threshold_seconds,
            spreadsheet_id,
            credential,
        } = user.into();

        sqlx::query(
            "INSERT INTO users (
                id, first_name, state, time_zone, access_window_start, access_window_end,
                nominal_work_seconds, overtime_threshold_seconds, spreadsheet_id, credential
             )
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(first_name)
        .bind(state)
        .bind(time_zone)
        .bind(access_window_start)
        .bind(access_window_end)
        .bind(nominal_work_seconds)
        .bind(overtime_threshold_seconds)
        .bind(spreadsheet_id)
        .bind(credential)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, user: &UserRecord) -> Result<(), UserStorageError> {
        let UserStorageModel {
            id,
            first_name,
            state,
            time_zone,
            access_window_start,
            access_window_end,
            nominal_work_seconds,
            overtime_threshold_seconds,
            spreadsheet_id,
            credential,
        } = user.into();

        let result = sqlx::query(
            "UPDATE users
             SET first_name = ?,
                 state = ?,
                 time_zone = ?,
                 access_window_start = ?,
                 access_window_end = ?,
                 nominal_work_seconds = ?,
                 overtime_threshold_seconds = ?,
                 spreadsheet_id = ?,
                 credential = ?
             WHERE id = ?",
        )
        .bind(first_name)
        .bind(state)
        .bind(time_zone)
        .bind(access_window_start)
        .bind(access_window_end)
        .bind(nominal_work_seconds)
        .bind(overtime_threshold_seconds)
        .bind(spreadsheet_id)
        .bind(credential)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserStorageError::NotFound(id));
        }

        Ok(())
    }
}
