use crate::models::storage_event::StorageEvent;
use crate::models::tab_id::TabId;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::trace;

/// Stand-in for the browser's `storage` event: every session subscribes, every write is broadcast.
#[derive(Debug, Clone)]
pub struct StorageBus {
    sender: broadcast::Sender<StorageEvent>,
}

impl StorageBus {
    pub fn new(capacity: usize) -> Self {
        // broadcast panics on zero capacity
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: StorageEvent) {
        trace!("storage event on {} from {}", event.key, event.origin);
        // nobody listening is fine.
        let _ = self.sender.send(event);
    }

    /// Receive events for `key`, skipping the ones `tab` published itself.
    pub fn subscribe(&self, key: &str, tab: TabId) -> StorageEvents {
        StorageEvents {
            receiver: self.sender.subscribe(),
            key: key.to_owned(),
            tab,
        }
    }
}

/// Result of polling [`StorageEvents::try_next`].
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Event(StorageEvent),
    /// Events were dropped because we fell behind. Re-read the storage to catch up.
    Lagged(u64),
    Empty,
    Closed,
}

/// Key scoped receiver for one session.
#[derive(Debug)]
pub struct StorageEvents {
    receiver: broadcast::Receiver<StorageEvent>,
    key: String,
    tab: TabId,
}

impl StorageEvents {
    pub fn key(&self) -> &str {
        &self.key
    }

    fn wanted(&self, event: &StorageEvent) -> bool {
        event.key == self.key && event.origin != self.tab
    }

    /// Non blocking. Skips events for other keys or from ourselves.
    pub fn try_next(&mut self) -> Received {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.wanted(&event) => return Received::Event(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(n)) => return Received::Lagged(n),
                Err(TryRecvError::Empty) => return Received::Empty,
                Err(TryRecvError::Closed) => return Received::Closed,
            }
        }
    }

    /// Wait for the next event. Never returns `Empty`.
    pub async fn next(&mut self) -> Received {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.wanted(&event) => return Received::Event(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => return Received::Lagged(n),
                Err(RecvError::Closed) => return Received::Closed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_key_and_origin() {
        let bus = StorageBus::new(8);
        let me = TabId::new();
        let other = TabId::new();
        let mut events = bus.subscribe("savedJobs", me);

        bus.publish(StorageEvent::new("somethingElse", Some("1".into()), other));
        bus.publish(StorageEvent::new("savedJobs", Some("2".into()), me));
        bus.publish(StorageEvent::new("savedJobs", Some("3".into()), other));

        assert_eq!(
            events.try_next(),
            Received::Event(StorageEvent::new("savedJobs", Some("3".into()), other))
        );
        assert_eq!(events.try_next(), Received::Empty);
    }

    #[test]
    fn reports_lag_when_overrun() {
        let bus = StorageBus::new(2);
        let mut events = bus.subscribe("k", TabId::new());
        for i in 0..5 {
            bus.publish(StorageEvent::new("k", Some(i.to_string()), TabId::EXTERNAL));
        }
        assert!(matches!(events.try_next(), Received::Lagged(_)));
        // after the lag we get the tail of the buffer
        assert!(matches!(events.try_next(), Received::Event(_)));
    }

    #[tokio::test]
    async fn next_waits_for_event() {
        let bus = StorageBus::new(8);
        let mut events = bus.subscribe("k", TabId::new());
        let publisher = bus.clone();
        tokio::spawn(async move {
            publisher.publish(StorageEvent::new("k", None, TabId::EXTERNAL));
        });
        match events.next().await {
            Received::Event(event) => assert!(event.is_cleared()),
            other => panic!("unexpected {other:?}"),
        }
    }
}
