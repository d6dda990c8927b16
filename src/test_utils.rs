use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono_tz::Tz;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::auth::{CredentialError, CredentialExchange};
use crate::clock::MonthKey;
use crate::conversation::reply::Reply;
use crate::dispatcher::{ChatTransport, TransportError};
use crate::geo::{GeocodingError, Location, TimeZoneResolver};
use crate::models::{Credential, DayEntryRow, ExitFields, UserId, UserRecord};
use crate::sheets::{ProvisionedSheet, SheetError, SpreadsheetClient, SpreadsheetProvider};
use crate::storage::{MIGRATOR, UserStorage, UserStorageError};

/// Single-connection in-memory database with every migration applied.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

/// Remembers every reply together with the chat it went to.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(i64, Reply)>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<(i64, Reply)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|(_, reply)| reply.text)
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push((chat_id, reply.clone()));
        Ok(())
    }
}

/// Accepts exactly one code.
pub struct ScriptedCredentialExchange {
    accepted: String,
}

impl ScriptedCredentialExchange {
    pub fn accepting(code: &str) -> Self {
        Self {
            accepted: code.to_string(),
        }
    }
}

#[async_trait]
impl CredentialExchange for ScriptedCredentialExchange {
    fn authorization_url(&self) -> String {
        "https://auth.test/authorize".to_string()
    }

    async fn exchange_auth_code(&self, code: &str) -> Result<Credential, CredentialError> {
        if code == self.accepted {
            Ok(Credential::new(format!("credential-for-{code}")))
        } else {
            Err(CredentialError::Rejected)
        }
    }
}

/// Resolves every location to the same zone, or fails when none is set.
pub struct FixedTimeZoneResolver(pub Option<Tz>);

#[async_trait]
impl TimeZoneResolver for FixedTimeZoneResolver {
    async fn resolve_time_zone(&self, location: Location) -> Result<Tz, GeocodingError> {
        self.0.ok_or(GeocodingError::NoTimeZone {
            latitude: location.latitude,
            longitude: location.longitude,
        })
    }
}

/// Connects fine, then fails every operation like a closed pool would.
pub struct FailingSpreadsheetProvider;

fn closed() -> SheetError {
    SheetError::Sqlx(sqlx::Error::PoolClosed)
}

#[async_trait]
impl SpreadsheetProvider for FailingSpreadsheetProvider {
    async fn connect(
        &self,
        _credential: &Credential,
    ) -> Result<Arc<dyn SpreadsheetClient>, SheetError> {
        Ok(Arc::new(FailingSpreadsheetProvider))
    }
}

#[async_trait]
impl SpreadsheetClient for FailingSpreadsheetProvider {
    async fn provision(&self, _user: &UserRecord) -> Result<ProvisionedSheet, SheetError> {
        Err(closed())
    }

    async fn append_row(
        &self,
        _spreadsheet_id: &str,
        _month: MonthKey,
        _row: &DayEntryRow,
    ) -> Result<(), SheetError> {
        Err(closed())
    }

    async fn update_row(
        &self,
        _spreadsheet_id: &str,
        _month: MonthKey,
        _index: usize,
        _fields: ExitFields,
    ) -> Result<(), SheetError> {
        Err(closed())
    }

    async fn read_rows(
        &self,
        _spreadsheet_id: &str,
        _month: MonthKey,
    ) -> Result<Vec<DayEntryRow>, SheetError> {
        Err(closed())
    }
}

/// User store without a database, for tests that pause the clock.
#[derive(Default)]
pub struct InMemoryUserStorage {
    users: Mutex<HashMap<UserId, UserRecord>>,
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, UserStorageError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, user: &UserRecord) -> Result<(), UserStorageError> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &UserRecord) -> Result<(), UserStorageError> {
        match self.users.lock().unwrap().get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(UserStorageError::NotFound(user.id)),
        }
    }
}

/// Takes `delay` to refuse every connection and remembers how many
/// connections were ever attempted at once.
pub struct SlowRefusingProvider {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowRefusingProvider {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpreadsheetProvider for SlowRefusingProvider {
    async fn connect(
        &self,
        _credential: &Credential,
    ) -> Result<Arc<dyn SpreadsheetClient>, SheetError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Err(SheetError::Unauthorized)
    }
}
