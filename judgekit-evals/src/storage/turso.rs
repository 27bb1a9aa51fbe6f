//! Turso/libSQL database handle and unit of work.
//!
//! This module provides persistent storage using Turso (libSQL).
//! It can connect to:
//! - Local embedded SQLite file
//! - Throwaway file in a temporary directory (tests)
//!
//! Reads go through a shared connection. Every unit of work opens its own
//! connection, so readers only ever see committed rows.

use std::path::Path;
use std::sync::Arc;

use libsql::{Builder, Connection, Transaction};
use tempfile::TempDir;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument};

use super::migrations::Migrator;
use crate::error::Result;
use crate::events::{EvalEvent, StoredEvalEvent};

/// Turso-backed evaluation database.
///
/// Units of work are serialized, so at most one write transaction is open
/// at any time.
#[derive(Clone)]
pub struct Database {
    db: Arc<libsql::Database>,
    conn: Connection,
    write_lock: Arc<Mutex<()>>,
    // Removed with the last handle of a `new_memory` database.
    _scratch: Option<Arc<TempDir>>,
}

impl Database {
    /// Open (or create) a local embedded database and migrate it.
    pub async fn new_local(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::init(db, None).await
    }

    /// Create a throwaway database (for testing).
    ///
    /// Backed by a file in a temporary directory rather than `:memory:`,
    /// since every `:memory:` connection would get its own empty database.
    pub async fn new_memory() -> Result<Self> {
        let dir = TempDir::new()?;
        let db = Builder::new_local(dir.path().join("judgekit.db"))
            .build()
            .await?;
        Self::init(db, Some(Arc::new(dir))).await
    }

    async fn init(db: libsql::Database, scratch: Option<Arc<TempDir>>) -> Result<Self> {
        let conn = db.connect()?;
        // WAL lets readers proceed while a unit of work is writing.
        conn.query("PRAGMA journal_mode = WAL", ()).await?;
        configure(&conn).await?;
        Migrator::new(&conn).migrate().await?;

        Ok(Self {
            db: Arc::new(db),
            conn,
            write_lock: Arc::new(Mutex::new(())),
            _scratch: scratch,
        })
    }

    /// Connection for reads outside a unit of work.
    ///
    /// Sees only committed data.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Open a new unit of work on a dedicated connection.
    ///
    /// Waits until any other open unit of work on this database finishes.
    #[instrument(skip(self), level = "debug")]
    pub async fn begin(&self) -> Result<UnitOfWork> {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        let conn = self.db.connect()?;
        configure(&conn).await?;
        let tx = conn.transaction().await?;
        debug!("unit of work started");
        Ok(UnitOfWork {
            tx,
            pending: Vec::new(),
            _guard: guard,
        })
    }
}

/// Per-connection settings.
async fn configure(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", ()).await?;
    conn.query("PRAGMA busy_timeout = 5000", ()).await?;
    Ok(())
}

/// A single transaction plus the events to publish once it commits.
///
/// Dropping a unit of work without committing rolls the transaction back
/// and discards its events.
pub struct UnitOfWork {
    tx: Transaction,
    pending: Vec<EvalEvent>,
    _guard: OwnedMutexGuard<()>,
}

impl UnitOfWork {
    /// Connection scoped to this transaction.
    pub fn conn(&self) -> &Connection {
        &self.tx
    }

    /// Buffer an event for delivery after commit.
    pub fn publish_later(&mut self, event: EvalEvent) {
        self.pending.push(event);
    }

    /// Events buffered so far.
    pub fn pending_events(&self) -> &[EvalEvent] {
        &self.pending
    }

    /// Commit the transaction and release its buffered events.
    #[instrument(skip(self), fields(events = self.pending.len()), level = "debug")]
    pub async fn commit(self) -> Result<Vec<StoredEvalEvent>> {
        let Self { tx, pending, _guard } = self;
        tx.commit().await?;
        Ok(pending.into_iter().map(StoredEvalEvent::new).collect())
    }

    /// Roll back the transaction, discarding its buffered events.
    #[instrument(skip(self), fields(events = self.pending.len()), level = "debug")]
    pub async fn rollback(self) -> Result<()> {
        let Self { tx, pending, _guard } = self;
        if !pending.is_empty() {
            debug!(dropped = pending.len(), "discarding events of rolled back unit of work");
        }
        tx.rollback().await?;
        Ok(())
    }
}
