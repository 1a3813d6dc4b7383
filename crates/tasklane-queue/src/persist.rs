//! Built-in persisters: an in-memory store for tests and transient
//! setups, and the default SQLite-backed store.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection};

use tasklane_core::{Persister, Result, TaskLaneError};

/// Map-backed persister. Records do not survive the process; useful for
/// tests and for callers who only want crash-free cancellation
/// bookkeeping.
#[derive(Default)]
pub struct MemoryPersister {
    // BTreeMap keeps restore order deterministic.
    records: Mutex<HashMap<String, BTreeMap<String, String>>>,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persister for MemoryPersister {
    fn lanes(&self) -> Vec<String> {
        self.records.lock().unwrap().keys().cloned().collect()
    }

    fn restore(&self, lane: &str) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .get(lane)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    fn put(&self, lane: &str, uuid: &str, data: &str) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .entry(lane.to_string())
            .or_default()
            .insert(uuid.to_string(), data.to_string());
        Ok(())
    }

    fn remove(&self, lane: &str, uuid: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(lane_records) = records.get_mut(lane) {
            lane_records.remove(uuid);
            if lane_records.is_empty() {
                records.remove(lane);
            }
        }
        Ok(())
    }
}

/// SQLite-backed persister, the durable default. One row per pending
/// job, keyed by `(lane, uuid)`; `restore` returns rows in insertion
/// order.
pub struct SqlitePersister {
    conn: Mutex<Connection>,
}

impl SqlitePersister {
    /// Open (and migrate) the store at `path`, creating parent
    /// directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TaskLaneError::Persistence(e.to_string()))?;
        }
        let conn =
            Connection::open(path).map_err(|e| TaskLaneError::Persistence(e.to_string()))?;
        let persister = Self { conn: Mutex::new(conn) };
        persister.migrate()?;
        tracing::info!("💾 Job store ready at {}", path.display());
        Ok(persister)
    }

    /// Open the store at the default location, `~/.tasklane/queue.db`.
    pub fn open_default() -> Result<Self> {
        Self::open(&Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".tasklane").join("queue.db")
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS job_records (
                    lane TEXT NOT NULL,
                    uuid TEXT NOT NULL,
                    data TEXT NOT NULL,
                    PRIMARY KEY (lane, uuid)
                );",
            )
            .map_err(|e| TaskLaneError::Persistence(e.to_string()))
    }
}

impl Persister for SqlitePersister {
    fn lanes(&self) -> Vec<String> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = match conn.prepare("SELECT DISTINCT lane FROM job_records") {
            Ok(stmt) => stmt,
            Err(e) => {
                tracing::warn!("⚠️ Job store lane listing failed: {e}");
                return Vec::new();
            }
        };
        match stmt.query_map([], |row| row.get::<_, String>(0)) {
            Ok(rows) => rows.filter_map(|r| r.ok()).collect(),
            Err(e) => {
                tracing::warn!("⚠️ Job store lane listing failed: {e}");
                Vec::new()
            }
        }
    }

    fn restore(&self, lane: &str) -> Vec<String> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            match conn.prepare("SELECT data FROM job_records WHERE lane = ?1 ORDER BY rowid") {
                Ok(stmt) => stmt,
                Err(e) => {
                    tracing::warn!("⚠️ Job store restore failed for lane '{lane}': {e}");
                    return Vec::new();
                }
            };
        match stmt.query_map(params![lane], |row| row.get::<_, String>(0)) {
            Ok(rows) => rows.filter_map(|r| r.ok()).collect(),
            Err(e) => {
                tracing::warn!("⚠️ Job store restore failed for lane '{lane}': {e}");
                Vec::new()
            }
        }
    }

    fn put(&self, lane: &str, uuid: &str, data: &str) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT OR REPLACE INTO job_records (lane, uuid, data) VALUES (?1, ?2, ?3)",
                params![lane, uuid, data],
            )
            .map(|_| ())
            .map_err(|e| TaskLaneError::Persistence(e.to_string()))
    }

    fn remove(&self, lane: &str, uuid: &str) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute(
                "DELETE FROM job_records WHERE lane = ?1 AND uuid = ?2",
                params![lane, uuid],
            )
            .map(|_| ())
            .map_err(|e| TaskLaneError::Persistence(e.to_string()))
    }
}
