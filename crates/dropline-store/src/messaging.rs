//! Message delivery: log append and notification enqueue

use std::sync::Arc;

use tracing::debug;

use dropline_core::error::{Error, Result};
use dropline_core::message::Message;
use dropline_core::notification::Notification;
use dropline_core::session::find_by_counterparty;
use dropline_core::storage::Storage;
use dropline_core::types::{Timestamp, UserId};

use crate::config::StoreConfig;

/// Appends messages to session logs and enqueues unread notifications
pub struct MessagingEngine<S> {
    storage: Arc<S>,
    config: StoreConfig,
}

impl<S: Storage> MessagingEngine<S> {
    /// Create an engine over the given substrate
    pub fn new(storage: Arc<S>, config: StoreConfig) -> Self {
        Self { storage, config }
    }

    /// Deliver `text` from `caller` into their session with `receiver`.
    ///
    /// The log append and the notification enqueue are two independent key
    /// writes committing in that order; a fault between them leaves the
    /// message durably recorded but the receiver unnotified.
    ///
    /// The log is rejected as full only once it already holds more than
    /// `max_session_messages` entries, so a log can reach cap+1 messages
    /// before sends start failing.
    pub fn send_message(
        &self,
        caller: &UserId,
        receiver: &UserId,
        text: impl Into<String>,
    ) -> Result<()> {
        let sessions = self
            .storage
            .directory(caller)?
            .ok_or_else(|| Error::NoSession(format!("caller {caller} has no sessions")))?;
        let session = find_by_counterparty(&sessions, receiver).ok_or_else(|| {
            Error::NotFound(format!("caller {caller} has no session with {receiver}"))
        })?;
        let id = session.id;

        let mut log = self
            .storage
            .message_log(id)?
            .ok_or_else(|| Error::NotFound(format!("no message log for session {id}")))?;
        if log.len() > self.config.max_session_messages {
            return Err(Error::MaxMessageReached(format!(
                "session {} holds {} messages",
                id,
                log.len()
            )));
        }

        let timestamp = Timestamp::now();
        log.push(Message {
            sender: caller.clone(),
            receiver: receiver.clone(),
            text: text.into(),
            timestamp,
        });
        self.storage.put_message_log(id, &log)?;

        let mut queue = self.storage.notifications(receiver)?.unwrap_or_default();
        queue.push(Notification {
            sender: caller.clone(),
            session_id: id,
            timestamp,
        });
        self.storage.put_notifications(receiver, &queue)?;

        debug!("message from {} to {} appended to session {}", caller, receiver, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::SessionManager;
    use dropline_core::storage::memory::MemoryStorage;
    use dropline_core::storage::{MessageLogStore, NotificationStore};

    fn fixture(
        config: StoreConfig,
    ) -> (
        Arc<MemoryStorage>,
        SessionManager<MemoryStorage>,
        MessagingEngine<MemoryStorage>,
    ) {
        let storage = Arc::new(MemoryStorage::new());
        let manager = SessionManager::new(storage.clone(), config);
        let engine = MessagingEngine::new(storage.clone(), config);
        (storage, manager, engine)
    }

    #[test]
    fn test_send_requires_directory() {
        let (_, _, engine) = fixture(StoreConfig::default());
        let alice = UserId::from_string("alice");
        let bob = UserId::from_string("bob");

        let err = engine.send_message(&alice, &bob, "hi").unwrap_err();
        assert!(matches!(err, Error::NoSession(_)));
    }

    #[test]
    fn test_send_requires_session_with_receiver() {
        let (_, manager, engine) = fixture(StoreConfig::default());
        let alice = UserId::from_string("alice");
        let bob = UserId::from_string("bob");
        let carol = UserId::from_string("carol");

        manager.create_session(&alice, &bob).unwrap();
        let err = engine.send_message(&alice, &carol, "hi").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_send_appends_and_notifies() {
        let (storage, manager, engine) = fixture(StoreConfig::default());
        let alice = UserId::from_string("alice");
        let bob = UserId::from_string("bob");

        let id = manager.create_session(&alice, &bob).unwrap();
        engine.send_message(&alice, &bob, "hi").unwrap();

        let log = storage.message_log(id).unwrap().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].text, "hi");
        assert_eq!(log[0].sender, alice);

        let queue = storage.notifications(&bob).unwrap().unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].sender, alice);
        assert_eq!(queue[0].session_id, id);
    }

    #[test]
    fn test_notifications_accumulate_per_send() {
        let (storage, manager, engine) = fixture(StoreConfig::default());
        let alice = UserId::from_string("alice");
        let bob = UserId::from_string("bob");

        manager.create_session(&alice, &bob).unwrap();
        engine.send_message(&alice, &bob, "one").unwrap();
        engine.send_message(&alice, &bob, "two").unwrap();

        assert_eq!(storage.notifications(&bob).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_message_cap_boundary() {
        let config = StoreConfig {
            max_session_messages: 3,
            ..Default::default()
        };
        let (_, manager, engine) = fixture(config);
        let alice = UserId::from_string("alice");
        let bob = UserId::from_string("bob");

        manager.create_session(&alice, &bob).unwrap();

        // The length check runs before the append, so cap+1 sends land
        for i in 0..4 {
            engine.send_message(&alice, &bob, format!("msg-{i}")).unwrap();
        }
        let err = engine.send_message(&alice, &bob, "overflow").unwrap_err();
        assert!(matches!(err, Error::MaxMessageReached(_)));
    }

    #[test]
    fn test_receiver_can_reply() {
        let (storage, manager, engine) = fixture(StoreConfig::default());
        let alice = UserId::from_string("alice");
        let bob = UserId::from_string("bob");

        let id = manager.create_session(&alice, &bob).unwrap();
        engine.send_message(&alice, &bob, "ping").unwrap();
        engine.send_message(&bob, &alice, "pong").unwrap();

        let log = storage.message_log(id).unwrap().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].sender, bob);
        assert_eq!(storage.notifications(&alice).unwrap().unwrap().len(), 1);
    }
}
