mod session;


use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::conversation::{ConversationError, ConversationMachine, Turn, event::InboundEvent, reply::Reply};
use crate::models::{UnknownStateError, UserRecord};
use crate::storage::{UserModelError, UserStorage, UserStorageError};

pub use session::{SessionRegistry, UserSession};

pub const APOLOGY: &str = "Something went wrong on my side. Please try again later.";
pub const UNKNOWN_STATE: &str =
    "Your conversation is in a state I do not know. Please send /start to set things up again.";

/// Sessions unused for this long are dropped by the sweeper.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Chat transport failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TransportError>;
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Storage(#[from] UserStorageError),

    #[error(transparent)]
    Conversation(#[from] ConversationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    UnknownState(UnknownStateError),
}

/// Runs each inbound event through the conversation machine for its user.
pub struct ConversationDispatcher {
    users: Arc<dyn UserStorage>,
    machine: ConversationMachine,
    transport: Arc<dyn ChatTransport>,
    sessions: SessionRegistry,
}

impl ConversationDispatcher {
    pub fn new(
        users: Arc<dyn UserStorage>,
        machine: ConversationMachine,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            users,
            machine,
            transport,
            sessions: SessionRegistry::default(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Periodically drops idle sessions. The task ends once the dispatcher
    /// is gone.
    pub fn spawn_session_sweeper(
        self: &Arc<Self>,
        max_idle: Duration,
        period: Duration,
    ) -> JoinHandle<()> {
        let dispatcher: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(dispatcher) = dispatcher.upgrade() else {
                    break;
                };

                let evicted = dispatcher.sessions.evict_idle(max_idle).await;
                if evicted > 0 {
                    log::info!("Dropped {} idle sessions", evicted);
                }
            }
        })
    }

    /// The stored user only changes when the whole event was handled.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), DispatchError> {
        let user_id = event.user_id;
        let session = self.sessions.session(user_id).await;
        let mut guard = session.lock().await;
        guard.touch();

        let user = match self.load_or_create(&event).await {
            Ok(user) => user,
            Err(UserStorageError::Model(UserModelError::UnknownState(err))) => {
                log::error!("User {} is stored in an unknown state: {}", user_id, err);
                guard.reset();
                self.transport
                    .send_message(event.chat_id, &Reply::text(UNKNOWN_STATE))
                    .await?;
                return Err(DispatchError::UnknownState(err));
            }
            Err(err) => return Err(self.fail(&event, &mut guard, err.into()).await),
        };

        log::debug!(
            "User {} in state {} sent {:?} (command {:?}, location {})",
            user_id,
            user.state,
            event.text,
            event.command,
            event.location.is_some()
        );

        let mut turn = Turn::new(user, &mut guard.sheet_client);
        let outcome = self.machine.handle(&mut turn, &event).await;
        let Turn { user, outbox, .. } = turn;
        if let Err(err) = outcome {
            return Err(self.fail(&event, &mut guard, err.into()).await);
        }

        if let Err(err) = self.users.update(&user).await {
            return Err(self.fail(&event, &mut guard, err.into()).await);
        }

        for reply in &outbox {
            self.transport.send_message(event.chat_id, reply).await?;
        }

        Ok(())
    }

    async fn load_or_create(&self, event: &InboundEvent) -> Result<UserRecord, UserStorageError> {
        if let Some(user) = self.users.get(event.user_id).await? {
            return Ok(user);
        }

        let user = UserRecord::new(event.user_id, event.first_name.clone());
        self.users.insert(&user).await?;
        log::info!("Registered new user {} ({})", user.id, user.first_name);

        Ok(user)
    }

    /// Resets the session so the next event starts clean and apologizes.
    /// The caller still holds the session lock, so queued events of the
    /// same user keep waiting on it.
    async fn fail(
        &self,
        event: &InboundEvent,
        session: &mut UserSession,
        err: DispatchError,
    ) -> DispatchError {
        log::error!("Failed to handle event of user {}: {}", event.user_id, err);
        session.reset();

        if let Err(send_err) = self
            .transport
            .send_message(event.chat_id, &Reply::text(APOLOGY))
            .await
        {
            log::warn!("Could not apologize to user {}: {}", event.user_id, send_err);
        }

        err
    }
}
