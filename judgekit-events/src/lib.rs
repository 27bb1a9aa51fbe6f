//! Event log and post-commit event delivery for judgekit.
//!
//! Writers never talk to the event log directly. They hand events to an
//! [`EventPublisher`], which queues them without blocking; an
//! [`EventDispatcher`] running in its own task drains the queue into an
//! [`EventLog`]. Readers use [`EventConsumer`]s with independent offset
//! tracking per consumer group.
//!
//! # Key Types
//!
//! - [`EventLog`] - Trait for appending events and creating consumers
//! - [`EventConsumer`] - Trait for polling events with offset tracking
//! - [`InMemoryEventLog`] - In-process implementation of EventLog
//! - [`JsonlEventLog`] - JSON-lines file implementation of EventLog
//! - [`EventPublisher`] / [`EventDispatcher`] - Fire-and-forget delivery pair

pub mod error;
pub mod jsonl;
pub mod memory;
pub mod publisher;
pub mod traits;

// Re-exports
pub use error::{Error, Result};
pub use jsonl::JsonlEventLog;
pub use memory::InMemoryEventLog;
pub use publisher::{EventDispatcher, EventPublisher, channel};
pub use traits::{EventBatch, EventConsumer, EventLog, Offset, SeekPosition};
