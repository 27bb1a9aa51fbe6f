//! Core traits for event log operations.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Offset into an event stream.
pub type Offset = u64;

/// Position to seek to when repositioning a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekPosition {
    /// Start from the beginning.
    Beginning,
    /// Start from the end (new events only).
    End,
    /// Start from a specific offset.
    Offset(Offset),
}

/// A batch of events returned from polling, each paired with its offset.
#[derive(Debug, Clone)]
pub struct EventBatch<E> {
    events: Vec<(Offset, E)>,
}

impl<E> EventBatch<E> {
    /// Create a batch from offset/event pairs.
    #[must_use]
    pub fn new(events: Vec<(Offset, E)>) -> Self {
        Self { events }
    }

    /// An empty batch.
    #[must_use]
    pub fn empty() -> Self {
        Self { events: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Offset of the first event in the batch.
    pub fn first_offset(&self) -> Option<Offset> {
        self.events.first().map(|(o, _)| *o)
    }

    /// Offset of the last event in the batch.
    pub fn last_offset(&self) -> Option<Offset> {
        self.events.last().map(|(o, _)| *o)
    }
}

impl<E> IntoIterator for EventBatch<E> {
    type Item = (Offset, E);
    type IntoIter = std::vec::IntoIter<(Offset, E)>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// Trait for appending events and creating consumers.
#[async_trait]
pub trait EventLog<E>: Send + Sync {
    /// Append an event to the log, returning its offset.
    async fn append(&self, event: E) -> Result<Offset>;

    /// Append several events, returning the offset of the last one.
    async fn append_batch(&self, events: Vec<E>) -> Result<Offset>;

    /// Create a consumer for the given group, resuming from its last commit.
    async fn consumer(&self, group: &str) -> Result<Box<dyn EventConsumer<E>>>;

    /// Offset that the next appended event will receive.
    fn high_water_mark(&self) -> Offset;
}

/// Trait for polling events with offset tracking.
#[async_trait]
pub trait EventConsumer<E>: Send {
    /// Poll up to `max_count` events, waiting at most `timeout` for the first one.
    async fn poll(&mut self, max_count: usize, timeout: Duration) -> Result<EventBatch<E>>;

    /// Record `offset` as the group's committed position.
    async fn commit(&mut self, offset: Offset) -> Result<()>;

    /// Move the read position.
    async fn seek(&mut self, position: SeekPosition) -> Result<()>;

    /// Last committed offset for this consumer.
    fn committed_offset(&self) -> Offset;

    /// Consumer group name.
    fn group(&self) -> &str;
}
