//! Read-side lookups across the three collections

use std::sync::Arc;

use tracing::debug;

use dropline_core::error::{Error, Result};
use dropline_core::message::Message;
use dropline_core::notification::Notification;
use dropline_core::session::{find_by_counterparty, Session, SessionId};
use dropline_core::storage::Storage;
use dropline_core::types::UserId;

use crate::config::StoreConfig;

/// Read-only lookups, plus the mark-as-read side effect of viewing a session
pub struct QueryLayer<S> {
    storage: Arc<S>,
    config: StoreConfig,
}

impl<S: Storage> QueryLayer<S> {
    /// Create a query layer over the given substrate
    pub fn new(storage: Arc<S>, config: StoreConfig) -> Self {
        Self { storage, config }
    }

    /// Return the full ordered history of the caller's session with
    /// `counterparty`, clearing every notification the caller holds for
    /// that session id along the way.
    pub fn view_messages(&self, caller: &UserId, counterparty: &UserId) -> Result<Vec<Message>> {
        let id = self.session_id(caller, counterparty)?;
        let log = self
            .storage
            .message_log(id)?
            .ok_or_else(|| Error::NotFound(format!("no message log for session {id}")))?;

        if let Some(mut queue) = self.storage.notifications(caller)? {
            let before = queue.len();
            queue.retain(|n| n.session_id != id);
            if queue.len() != before {
                self.storage.put_notifications(caller, &queue)?;
                debug!(
                    "cleared {} notifications for {} on session {}",
                    before - queue.len(),
                    caller,
                    id
                );
            }
        }

        Ok(log)
    }

    /// The caller's pending notifications, oldest first. A pure read:
    /// nothing is cleared, and an absent queue reads as empty.
    pub fn view_notifications(&self, caller: &UserId) -> Result<Vec<Notification>> {
        Ok(self.storage.notifications(caller)?.unwrap_or_default())
    }

    /// Resolve the session id for the caller's session with `counterparty`
    pub fn session_id(&self, caller: &UserId, counterparty: &UserId) -> Result<SessionId> {
        let sessions = self
            .storage
            .directory(caller)?
            .ok_or_else(|| Error::NoSession(format!("caller {caller} has no sessions")))?;
        find_by_counterparty(&sessions, counterparty)
            .map(|s| s.id)
            .ok_or_else(|| {
                Error::NotFound(format!("caller {caller} has no session with {counterparty}"))
            })
    }

    /// The caller's full session list
    pub fn sessions(&self, caller: &UserId) -> Result<Vec<Session>> {
        self.storage
            .directory(caller)?
            .ok_or_else(|| Error::NoSession(format!("caller {caller} has no sessions")))
    }

    /// How many sessions the caller holds; zero when no directory entry
    /// exists, never an error.
    pub fn total_sessions(&self, caller: &UserId) -> Result<usize> {
        Ok(self
            .storage
            .directory(caller)?
            .map(|sessions| sessions.len())
            .unwrap_or(0))
    }

    /// How many messages the caller's session with `counterparty` holds
    pub fn total_session_messages(
        &self,
        caller: &UserId,
        counterparty: &UserId,
    ) -> Result<usize> {
        let id = self.session_id(caller, counterparty)?;
        let log = self
            .storage
            .message_log(id)?
            .ok_or_else(|| Error::NotFound(format!("no message log for session {id}")))?;
        Ok(log.len())
    }

    /// Configured cap on sessions per caller
    pub fn max_sessions(&self) -> usize {
        self.config.max_sessions
    }

    /// Configured cap on messages per session log
    pub fn max_session_messages(&self) -> usize {
        self.config.max_session_messages
    }
}
