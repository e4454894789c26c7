//! In-process change feed. Handlers publish a typed event after each write
//! that live views care about; consumers hold a [`Subscription`] and read
//! from it. Dropping the handle is the unsubscribe; there are no ambient
//! listeners to forget about.

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    CheckInRecorded {
        record_id: u64,
        employee_id: u64,
        verified: bool,
    },
    LeaveDecided {
        leave_id: u64,
        employee_id: u64,
        status: String,
    },
    ExpenseDecided {
        claim_id: u64,
        employee_id: u64,
        status: String,
    },
    NoticePublished {
        notice_id: u64,
        audience: String,
    },
    ChatMessageSent {
        message_id: u64,
        from_user_id: u64,
        to_user_id: u64,
    },
    CandidateMoved {
        candidate_id: u64,
        status: String,
    },
}

const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx }
    }

    /// Fan the event out to current subscribers. With nobody listening the
    /// event is simply dropped; publishing never fails the write that
    /// triggered it.
    pub fn publish(&self, event: DomainEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live handle onto the feed. Unsubscribes when dropped.
pub struct Subscription {
    rx: broadcast::Receiver<DomainEvent>,
}

impl Subscription {
    /// Next event, or `None` once the bus is gone. A slow reader that missed
    /// events skips ahead rather than erroring out.
    pub async fn next(&mut self) -> Option<DomainEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event subscriber lagged, skipping ahead");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();

        bus.publish(DomainEvent::CheckInRecorded {
            record_id: 1,
            employee_id: 1000,
            verified: true,
        });

        match sub.next().await {
            Some(DomainEvent::CheckInRecorded { record_id, .. }) => assert_eq!(record_id, 1),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropping_the_handle_unsubscribes() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);

        // publishing to nobody is fine
        bus.publish(DomainEvent::NoticePublished {
            notice_id: 1,
            audience: "all".into(),
        });
    }

    #[tokio::test]
    async fn each_subscriber_gets_its_own_copy() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(DomainEvent::ChatMessageSent {
            message_id: 5,
            from_user_id: 1,
            to_user_id: 2,
        });

        assert!(matches!(a.next().await, Some(DomainEvent::ChatMessageSent { .. })));
        assert!(matches!(b.next().await, Some(DomainEvent::ChatMessageSent { .. })));
    }
}
