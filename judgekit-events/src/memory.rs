//! In-memory EventLog implementation.
//!
//! Events are kept in a shared Vec without persistence. Consumers read the
//! live log, so events appended after a consumer was created are visible to it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};

use crate::error::Result;
use crate::traits::{EventBatch, EventConsumer, EventLog, Offset, SeekPosition};

/// State shared between the log and its consumers.
struct SharedState<E> {
    events: RwLock<Vec<E>>,
    // Mirrors `events.len()`; updated while the write lock is held.
    len: AtomicU64,
    consumer_offsets: RwLock<HashMap<String, Offset>>,
    notify: Notify,
}

/// In-memory implementation of EventLog.
pub struct InMemoryEventLog<E> {
    shared: Arc<SharedState<E>>,
}

impl<E> InMemoryEventLog<E>
where
    E: Clone + Send + Sync + 'static,
{
    /// Create a new in-memory event log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SharedState {
                events: RwLock::new(Vec::new()),
                len: AtomicU64::new(0),
                consumer_offsets: RwLock::new(HashMap::new()),
                notify: Notify::new(),
            }),
        }
    }

    /// Get the number of events in the log.
    pub async fn len(&self) -> usize {
        self.shared.events.read().await.len()
    }

    /// Check if the log is empty.
    pub async fn is_empty(&self) -> bool {
        self.shared.events.read().await.is_empty()
    }

    /// Snapshot of every stored event, oldest first.
    pub async fn events(&self) -> Vec<E> {
        self.shared.events.read().await.clone()
    }
}

impl<E> Default for InMemoryEventLog<E>
where
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> EventLog<E> for InMemoryEventLog<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn append(&self, event: E) -> Result<Offset> {
        let offset = {
            let mut events = self.shared.events.write().await;
            events.push(event);
            self.shared.len.store(events.len() as Offset, Ordering::SeqCst);
            (events.len() - 1) as Offset
        };
        self.shared.notify.notify_waiters();
        Ok(offset)
    }

    async fn append_batch(&self, events: Vec<E>) -> Result<Offset> {
        let last = {
            let mut stored = self.shared.events.write().await;
            stored.extend(events);
            self.shared.len.store(stored.len() as Offset, Ordering::SeqCst);
            (stored.len() as Offset).saturating_sub(1)
        };
        self.shared.notify.notify_waiters();
        Ok(last)
    }

    async fn consumer(&self, group: &str) -> Result<Box<dyn EventConsumer<E>>> {
        let offset = self
            .shared
            .consumer_offsets
            .read()
            .await
            .get(group)
            .copied()
            .unwrap_or(0);

        Ok(Box::new(InMemoryConsumer {
            group: group.to_string(),
            shared: Arc::clone(&self.shared),
            current_offset: offset,
            committed_offset: offset,
        }))
    }

    fn high_water_mark(&self) -> Offset {
        self.shared.len.load(Ordering::SeqCst)
    }
}

/// In-memory consumer implementation.
struct InMemoryConsumer<E> {
    group: String,
    shared: Arc<SharedState<E>>,
    current_offset: Offset,
    committed_offset: Offset,
}

impl<E: Clone> InMemoryConsumer<E> {
    async fn read_from_current(&mut self, max_count: usize) -> EventBatch<E> {
        let events = self.shared.events.read().await;
        let start = self.current_offset as usize;
        if start >= events.len() {
            return EventBatch::empty();
        }
        let end = std::cmp::min(start + max_count, events.len());

        let batch: Vec<(Offset, E)> = events[start..end]
            .iter()
            .enumerate()
            .map(|(i, e)| ((start + i) as Offset, e.clone()))
            .collect();

        self.current_offset = end as Offset;
        EventBatch::new(batch)
    }
}

#[async_trait]
impl<E> EventConsumer<E> for InMemoryConsumer<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn poll(&mut self, max_count: usize, timeout: Duration) -> Result<EventBatch<E>> {
        // Register interest before the first read so an append in between is not missed.
        let shared = Arc::clone(&self.shared);
        let notified = shared.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let batch = self.read_from_current(max_count).await;
        if !batch.is_empty() {
            return Ok(batch);
        }

        if tokio::time::timeout(timeout, notified).await.is_err() {
            return Ok(EventBatch::empty());
        }
        Ok(self.read_from_current(max_count).await)
    }

    async fn commit(&mut self, offset: Offset) -> Result<()> {
        self.committed_offset = offset;
        self.shared
            .consumer_offsets
            .write()
            .await
            .insert(self.group.clone(), offset);
        Ok(())
    }

    async fn seek(&mut self, position: SeekPosition) -> Result<()> {
        self.current_offset = match position {
            SeekPosition::Beginning => 0,
            SeekPosition::End => self.shared.events.read().await.len() as Offset,
            SeekPosition::Offset(o) => o,
        };
        Ok(())
    }

    fn committed_offset(&self) -> Offset {
        self.committed_offset
    }

    fn group(&self) -> &str {
        &self.group
    }
}
