//! File-backed EventLog implementation.
//!
//! Each event is one JSON document per line. The line number is the
//! event's offset. Consumer group offsets live in memory only, so a new
//! process starts every group from the beginning of the file.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::traits::{EventBatch, EventConsumer, EventLog, Offset, SeekPosition};

struct SharedState {
    path: PathBuf,
    // Number of lines in the file. Also the next offset to hand out.
    len: AtomicU64,
    // Serializes appends so offsets match line numbers.
    write_lock: Mutex<()>,
    consumer_offsets: RwLock<HashMap<String, Offset>>,
    notify: Notify,
}

/// JSON-lines file implementation of EventLog.
pub struct JsonlEventLog<E> {
    shared: Arc<SharedState>,
    _marker: PhantomData<fn() -> E>,
}

impl<E> JsonlEventLog<E>
where
    E: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Open a log file, creating it and its parent directory if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content.lines().filter(|l| !l.trim().is_empty()).count() as Offset,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), events = existing, "opened event log file");

        Ok(Self {
            shared: Arc::new(SharedState {
                path,
                len: AtomicU64::new(existing),
                write_lock: Mutex::new(()),
                consumer_offsets: RwLock::new(HashMap::new()),
                notify: Notify::new(),
            }),
            _marker: PhantomData,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    async fn write_lines(&self, events: &[E]) -> Result<Offset> {
        let mut buf = Vec::new();
        for event in events {
            serde_json::to_writer(&mut buf, event)?;
            buf.push(b'\n');
        }

        let guard = self.shared.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.shared.path)
            .await?;
        let previous_len = file.metadata().await?.len();
        if let Err(err) = write_buf(&mut file, &buf).await {
            warn!(error = %err, previous_len, "append failed, discarding partial write");
            discard_partial(&file, previous_len).await?;
            return Err(err.into());
        }

        let count = events.len() as Offset;
        let previous = self.shared.len.fetch_add(count, Ordering::SeqCst);
        drop(guard);

        self.shared.notify.notify_waiters();
        debug!(count, "appended events to file");
        Ok((previous + count).saturating_sub(1))
    }
}

async fn write_buf(file: &mut tokio::fs::File, buf: &[u8]) -> std::io::Result<()> {
    file.write_all(buf).await?;
    file.flush().await
}

/// Cut the file back to `len` bytes so a torn line never reaches readers.
async fn discard_partial(file: &tokio::fs::File, len: u64) -> Result<()> {
    file.set_len(len).await?;
    file.sync_data().await?;
    Ok(())
}

#[async_trait]
impl<E> EventLog<E> for JsonlEventLog<E>
where
    E: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn append(&self, event: E) -> Result<Offset> {
        self.write_lines(std::slice::from_ref(&event)).await
    }

    async fn append_batch(&self, events: Vec<E>) -> Result<Offset> {
        if events.is_empty() {
            return Ok(self.high_water_mark().saturating_sub(1));
        }
        self.write_lines(&events).await
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

        Ok(Box::new(JsonlConsumer {
            group: group.to_string(),
            shared: Arc::clone(&self.shared),
            current_offset: offset,
            committed_offset: offset,
            _marker: PhantomData,
        }))
    }

    fn high_water_mark(&self) -> Offset {
        self.shared.len.load(Ordering::SeqCst)
    }
}

struct JsonlConsumer<E> {
    group: String,
    shared: Arc<SharedState>,
    current_offset: Offset,
    committed_offset: Offset,
    _marker: PhantomData<fn() -> E>,
}

impl<E: DeserializeOwned> JsonlConsumer<E> {
    async fn read_from_current(&mut self, max_count: usize) -> Result<EventBatch<E>> {
        if self.current_offset >= self.shared.len.load(Ordering::SeqCst) {
            return Ok(EventBatch::empty());
        }

        let content = tokio::fs::read_to_string(&self.shared.path).await?;
        let mut batch = Vec::new();
        for (offset, line) in content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .enumerate()
            .skip(self.current_offset as usize)
            .take(max_count)
        {
            let event: E = serde_json::from_str(line)?;
            batch.push((offset as Offset, event));
        }

        if let Some((last, _)) = batch.last() {
            self.current_offset = last + 1;
        }
        Ok(EventBatch::new(batch))
    }
}

#[async_trait]
impl<E> EventConsumer<E> for JsonlConsumer<E>
where
    E: DeserializeOwned + Send + Sync + 'static,
{
    async fn poll(&mut self, max_count: usize, timeout: Duration) -> Result<EventBatch<E>> {
        let shared = Arc::clone(&self.shared);
        let notified = shared.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let batch = self.read_from_current(max_count).await?;
        if !batch.is_empty() {
            return Ok(batch);
        }

        if tokio::time::timeout(timeout, notified).await.is_err() {
            return Ok(EventBatch::empty());
        }
        self.read_from_current(max_count).await
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
            SeekPosition::End => self.shared.len.load(Ordering::SeqCst),
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
