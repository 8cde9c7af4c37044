//! Session lifecycle: creation, removal, cascade cleanup
//!
//! A conversation is two unilateral directory records sharing one id.
//! Either side can drop its record alone; the shared message log and the
//! pending notifications for that id survive until neither side lists the
//! session. Whether the counterparty still holds a record is re-derived by
//! scanning their current list at removal time, never cached.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

use dropline_core::error::{Error, Result};
use dropline_core::session::{find_by_counterparty, Session, SessionId};
use dropline_core::storage::Storage;
use dropline_core::types::UserId;
use dropline_core::SESSION_ID_BOUND;

use crate::config::StoreConfig;

/// Creates and removes sessions, with cascade cleanup of shared state
pub struct SessionManager<S> {
    storage: Arc<S>,
    config: StoreConfig,
}

impl<S: Storage> SessionManager<S> {
    /// Create a manager over the given substrate
    pub fn new(storage: Arc<S>, config: StoreConfig) -> Self {
        Self { storage, config }
    }

    /// Establish a session between `caller` and `counterparty`.
    ///
    /// Writes a directory record on both sides plus an empty message log,
    /// and returns the freshly generated session id. Rejects when the
    /// caller is at capacity, or when either side already lists the other.
    pub fn create_session(&self, caller: &UserId, counterparty: &UserId) -> Result<SessionId> {
        let mut sessions = self.storage.directory(caller)?.unwrap_or_default();

        if sessions.len() >= self.config.max_sessions {
            return Err(Error::MaxSessionsReached(format!(
                "caller {} already holds {} sessions",
                caller,
                sessions.len()
            )));
        }
        if find_by_counterparty(&sessions, counterparty).is_some() {
            return Err(Error::DuplicateAttempt(format!(
                "caller {caller} already has a session with {counterparty}"
            )));
        }

        // The counterparty may still hold a record from a session the
        // caller removed unilaterally; a second record for the same pair
        // would break list uniqueness on their side.
        let peer_sessions = if counterparty == caller {
            None
        } else {
            self.storage.directory(counterparty)?
        };
        if let Some(peer) = &peer_sessions {
            if find_by_counterparty(peer, caller).is_some() {
                return Err(Error::DuplicateAttempt(format!(
                    "{counterparty} still holds a session with {caller}"
                )));
            }
        }

        let id = self.unused_session_id()?;

        sessions.push(Session {
            id,
            counterparty: counterparty.clone(),
        });
        self.storage.put_directory(caller, &sessions)?;

        if counterparty != caller {
            let mut peer = peer_sessions.unwrap_or_default();
            peer.push(Session {
                id,
                counterparty: caller.clone(),
            });
            self.storage.put_directory(counterparty, &peer)?;
        }

        self.storage.put_message_log(id, &[])?;

        info!("created session {} between {} and {}", id, caller, counterparty);
        Ok(id)
    }

    /// Drop the caller's record for the session with `counterparty`.
    ///
    /// The caller's shortened list is persisted first; shared state is then
    /// cleaned up if the counterparty no longer reciprocates. A second call
    /// for the same counterparty returns `NotFound`.
    pub fn remove_session(&self, caller: &UserId, counterparty: &UserId) -> Result<()> {
        let mut sessions = self
            .storage
            .directory(caller)?
            .ok_or_else(|| Error::NoSession(format!("caller {caller} has no sessions")))?;

        let index = sessions
            .iter()
            .position(|s| s.counterparty == *counterparty)
            .ok_or_else(|| {
                Error::NotFound(format!("caller {caller} has no session with {counterparty}"))
            })?;
        let removed = sessions.remove(index);
        self.storage.put_directory(caller, &sessions)?;

        self.cascade(caller, &removed)?;

        info!("removed session {} for {}", removed.id, caller);
        Ok(())
    }

    /// Drop every session record the caller holds, cascading each one.
    ///
    /// The caller's list is emptied first, mirroring `remove_session`'s
    /// persist-then-cascade order; the directory entry itself remains.
    pub fn remove_all_sessions(&self, caller: &UserId) -> Result<()> {
        let sessions = self
            .storage
            .directory(caller)?
            .ok_or_else(|| Error::NoSession(format!("caller {caller} has no sessions")))?;

        self.storage.put_directory(caller, &[])?;
        for session in &sessions {
            self.cascade(caller, session)?;
        }

        info!("removed all {} sessions for {}", sessions.len(), caller);
        Ok(())
    }

    /// Draw random ids until one is free in the message log.
    ///
    /// Collisions are rare in a 53-bit space but the loop is required for
    /// correctness, not speed. The range starts at 1; zero never names a
    /// session.
    fn unused_session_id(&self) -> Result<SessionId> {
        let mut rng = rand::thread_rng();
        loop {
            let id = SessionId::from_u64(rng.gen_range(1..SESSION_ID_BOUND));
            if !self.storage.contains_message_log(id)? {
                return Ok(id);
            }
        }
    }

    /// Delete the shared log and pending notifications for a removed
    /// session, unless the counterparty's list still references the caller.
    fn cascade(&self, caller: &UserId, removed: &Session) -> Result<()> {
        let peer = &removed.counterparty;
        let reciprocated = self
            .storage
            .directory(peer)?
            .map(|list| find_by_counterparty(&list, caller).is_some())
            .unwrap_or(false);

        if reciprocated {
            debug!("session {} still listed by {}, log kept", removed.id, peer);
            return Ok(());
        }

        self.storage.remove_message_log(removed.id)?;
        self.purge_notifications(caller, removed.id)?;
        if peer != caller {
            self.purge_notifications(peer, removed.id)?;
        }

        debug!(
            "session {} dropped by both sides, log and notifications purged",
            removed.id
        );
        Ok(())
    }

    fn purge_notifications(&self, recipient: &UserId, id: SessionId) -> Result<()> {
        if let Some(mut queue) = self.storage.notifications(recipient)? {
            queue.retain(|n| n.session_id != id);
            self.storage.put_notifications(recipient, &queue)?;
        }
        Ok(())
    }
}
