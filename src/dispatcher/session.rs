use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::Instant};

use crate::models::UserId;
use crate::sheets::SpreadsheetClient;

/// Per-user state cached between messages.
pub struct UserSession {
    pub sheet_client: Option<Arc<dyn SpreadsheetClient>>,
    last_used: Instant,
}

impl Default for UserSession {
    fn default() -> Self {
        Self {
            sheet_client: None,
            last_used: Instant::now(),
        }
    }
}

impl UserSession {
    pub fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    /// Forgets cached collaborators after a fault. The session itself, and
    /// with it the user's lock, stays registered.
    pub fn reset(&mut self) {
        self.sheet_client = None;
    }
}

/// Hands out one session per user. Holding a session's lock serializes
/// that user's messages.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<UserId, Arc<Mutex<UserSession>>>>,
}

impl SessionRegistry {
    pub async fn session(&self, user_id: UserId) -> Arc<Mutex<UserSession>> {
        self.sessions
            .lock()
            .await
            .entry(user_id)
            .or_default()
            .clone()
    }

    /// Drops sessions idle for at least `max_idle`. Sessions are only cloned
    /// under the registry lock, so one referenced by the map alone has no
    /// holder and no waiter.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();

        sessions.retain(|user_id, session| {
            if Arc::strong_count(session) > 1 {
                return true;
            }

            let idle = session
                .try_lock()
                .map(|session| session.last_used.elapsed() >= max_idle)
                .unwrap_or(false);
            if idle {
                log::debug!("Evicted idle session of user {}", user_id);
            }
            !idle
        });

        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
