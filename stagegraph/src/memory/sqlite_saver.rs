//! SQLite-backed checkpointer (feature `sqlite`).
//!
//! Durable drop-in replacement for `MemorySaver`. Every `put` appends a row; `get` reads the
//! newest row for the run id. State and metadata are stored as JSON blobs.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata};
use crate::memory::checkpointer::{CheckpointError, Checkpointer};
use crate::memory::serializer::{JsonSerializer, Serializer};

/// Persistent checkpointer backed by a single SQLite file.
///
/// The connection sits behind a mutex; each call holds it only for its own statements.
pub struct SqliteSaver<S> {
    conn: Mutex<Connection>,
    serializer: JsonSerializer,
    _state: PhantomData<fn() -> S>,
}

fn storage(e: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

impl<S> SqliteSaver<S> {
    /// Opens or creates the database at `path`, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage)?;
            }
        }
        let conn = Connection::open(path).map_err(storage)?;
        Self::with_connection(conn)
    }

    /// In-memory database; useful in tests.
    pub fn open_in_memory() -> Result<Self, CheckpointError> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, CheckpointError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS checkpoints (
                 seq INTEGER PRIMARY KEY AUTOINCREMENT,
                 run_id TEXT NOT NULL,
                 checkpoint_id TEXT NOT NULL,
                 ts TEXT NOT NULL,
                 state BLOB NOT NULL,
                 metadata BLOB NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_checkpoints_run
                 ON checkpoints(run_id, seq DESC);",
        )
        .map_err(storage)?;
        Ok(Self {
            conn: Mutex::new(conn),
            serializer: JsonSerializer,
            _state: PhantomData,
        })
    }
}

#[async_trait]
impl<S> Checkpointer<S> for SqliteSaver<S>
where
    S: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn put(&self, run_id: &str, checkpoint: &Checkpoint<S>) -> Result<(), CheckpointError> {
        let state = self.serializer.serialize(&checkpoint.state)?;
        let metadata = self.serializer.serialize(&checkpoint.metadata)?;
        let conn = self.conn.lock().map_err(storage)?;
        conn.execute(
            "INSERT INTO checkpoints (run_id, checkpoint_id, ts, state, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, checkpoint.id, checkpoint.ts, state, metadata],
        )
        .map_err(storage)?;
        Ok(())
    }

    async fn get(&self, run_id: &str) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        let row = {
            let conn = self.conn.lock().map_err(storage)?;
            let row = conn.query_row(
                "SELECT checkpoint_id, ts, state, metadata FROM checkpoints
                 WHERE run_id = ?1 ORDER BY seq DESC LIMIT 1",
                params![run_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(storage)?;
            row
        };
        let Some((id, ts, state, metadata)) = row else {
            return Ok(None);
        };
        Ok(Some(Checkpoint {
            id,
            ts,
            state: self.serializer.deserialize(&state)?,
            metadata: self.serializer.deserialize(&metadata)?,
        }))
    }

    async fn list(&self, run_id: &str) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let rows: Vec<(String, Vec<u8>)> = {
            let conn = self.conn.lock().map_err(storage)?;
            let mut stmt = conn
                .prepare(
                    "SELECT checkpoint_id, metadata FROM checkpoints
                     WHERE run_id = ?1 ORDER BY seq ASC",
                )
                .map_err(storage)?;
            let mapped = stmt
                .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(storage)?;
            let rows = mapped.collect::<Result<_, _>>().map_err(storage)?;
            rows
        };
        rows.into_iter()
            .map(|(checkpoint_id, metadata)| {
                let metadata: CheckpointMetadata = self.serializer.deserialize(&metadata)?;
                Ok(CheckpointListItem {
                    checkpoint_id,
                    metadata,
                })
            })
            .collect()
    }

    async fn delete(&self, run_id: &str) -> Result<usize, CheckpointError> {
        let conn = self.conn.lock().map_err(storage)?;
        conn.execute("DELETE FROM checkpoints WHERE run_id = ?1", params![run_id])
            .map_err(storage)
    }
}
