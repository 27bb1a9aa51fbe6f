//! Fire-and-forget event delivery.
//!
//! [`channel`] returns a connected [`EventPublisher`] / [`EventDispatcher`]
//! pair. Publishing pushes onto an unbounded queue and returns immediately;
//! the dispatcher, usually running in its own task, appends queued events to
//! an [`EventLog`]. Delivery failures are logged by the dispatcher and never
//! reach the code that published the event.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::traits::EventLog;

/// Create a connected publisher/dispatcher pair delivering into `log`.
pub fn channel<E>(log: Arc<dyn EventLog<E>>) -> (EventPublisher<E>, EventDispatcher<E>)
where
    E: Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventPublisher { tx },
        EventDispatcher {
            rx,
            log,
            shutdown: CancellationToken::new(),
        },
    )
}

/// Sending half of the delivery queue. Cheap to clone.
pub struct EventPublisher<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> Clone for EventPublisher<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> EventPublisher<E> {
    /// Queue an event for delivery.
    ///
    /// Never blocks. If the dispatcher is gone the event is dropped and a
    /// warning is logged.
    pub fn publish_later(&self, event: E) {
        if self.tx.send(event).is_err() {
            warn!("event dispatcher is not running, dropping event");
        }
    }

    /// Queue several events in order.
    pub fn publish_all(&self, events: impl IntoIterator<Item = E>) {
        for event in events {
            self.publish_later(event);
        }
    }

    /// Whether the dispatcher side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of the delivery queue.
pub struct EventDispatcher<E> {
    rx: mpsc::UnboundedReceiver<E>,
    log: Arc<dyn EventLog<E>>,
    shutdown: CancellationToken,
}

impl<E> EventDispatcher<E>
where
    E: Send + 'static,
{
    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Drain the queue into the event log.
    ///
    /// Returns once every publisher has been dropped and the queue is empty,
    /// or when the shutdown token is cancelled. Returns the number of events
    /// appended.
    pub async fn run(mut self) -> u64 {
        info!("event dispatcher started");
        let mut delivered = 0u64;

        loop {
            let next = tokio::select! {
                biased;
                event = self.rx.recv() => event,
                _ = self.shutdown.cancelled() => {
                    debug!("event dispatcher cancelled");
                    None
                }
            };

            let Some(event) = next else { break };

            match self.log.append(event).await {
                Ok(offset) => {
                    delivered += 1;
                    debug!(offset, "event delivered");
                }
                Err(e) => error!(error = %e, "failed to deliver event"),
            }
        }

        info!(delivered, "event dispatcher stopped");
        delivered
    }

    /// Run the dispatcher on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<u64> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEventLog;

    #[tokio::test]
    async fn dispatcher_drains_queue_into_log() {
        let log = Arc::new(InMemoryEventLog::<String>::new());
        let (publisher, dispatcher) = channel::<String>(log.clone());

        publisher.publish_later("one".to_string());
        publisher.publish_all(vec!["two".to_string(), "three".to_string()]);
        drop(publisher);

        let delivered = dispatcher.run().await;

        assert_eq!(delivered, 3);
        assert_eq!(log.events().await, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn publishing_after_dispatcher_drop_does_not_panic() {
        let log = Arc::new(InMemoryEventLog::<String>::new());
        let (publisher, dispatcher) = channel::<String>(log.clone());
        drop(dispatcher);

        assert!(publisher.is_closed());
        publisher.publish_later("lost".to_string());
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn cancelled_dispatcher_stops_while_publishers_remain() {
        let log = Arc::new(InMemoryEventLog::<String>::new());
        let (publisher, dispatcher) = channel::<String>(log.clone());
        let token = dispatcher.shutdown_token();
        let handle = dispatcher.spawn();

        publisher.publish_later("before".to_string());
        tokio::task::yield_now().await;
        token.cancel();

        let delivered = handle.await.unwrap();
        assert!(delivered <= 1);
        drop(publisher);
    }
}
