use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{ScreenshotStore, StepStore};
use crate::error::{RecorderError, Result};
use crate::models::{RecordingSession, SessionPatch};

/// Key of the session record in the `recording_state` table
const SESSION_KEY: &str = "recording-storage-key";

/// SQLite-backed session record and screenshot blobs.
///
/// Several processes may open the same file. Writes from other connections
/// are picked up by [`SqliteStore::refresh`], which the change poller calls
/// periodically, and then pushed to local subscribers.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    session: watch::Sender<RecordingSession>,
    data_version: AtomicI64,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RecorderError::Storage(format!("Failed to create {:?}: {}", parent, e)))?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        let session = load_session(&conn)?;
        let version = data_version(&conn)?;
        let (tx, _) = watch::channel(session);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            session: tx,
            data_version: AtomicI64::new(version),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RecorderError::Storage(format!("Lock error: {}", e)))
    }

    /// Reload the record if another connection committed since the last
    /// look. Returns true when subscribers were notified.
    pub fn refresh(&self) -> Result<bool> {
        let conn = self.lock()?;
        let version = data_version(&conn)?;
        if self.data_version.swap(version, Ordering::SeqCst) == version {
            return Ok(false);
        }
        let latest = load_session(&conn)?;
        drop(conn);

        Ok(self.session.send_if_modified(|current| {
            if *current == latest {
                false
            } else {
                *current = latest;
                true
            }
        }))
    }

    /// Poll for cross-process writes until the store is dropped
    pub fn spawn_change_poller(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                match store.refresh() {
                    Ok(true) => tracing::debug!("Session record changed by another process"),
                    Ok(false) => {}
                    Err(e) => tracing::warn!("Failed to poll session store: {}", e),
                }
            }
        })
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS recording_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS screenshots (
            id TEXT PRIMARY KEY,
            data_uri TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn load_session(conn: &Connection) -> Result<RecordingSession> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM recording_state WHERE key = ?1",
            params![SESSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(RecordingSession::default()),
    }
}

fn data_version(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("PRAGMA data_version", [], |row| row.get(0))?)
}

#[async_trait]
impl StepStore for SqliteStore {
    async fn get(&self) -> Result<RecordingSession> {
        self.refresh()?;
        Ok(self.session.borrow().clone())
    }

    async fn set(&self, patch: SessionPatch) -> Result<()> {
        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front so the merge sees the
        // latest committed record.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut session = load_session(&tx)?;
        session.apply(patch);
        tx.execute(
            "INSERT INTO recording_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![SESSION_KEY, serde_json::to_string(&session)?, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        let version = data_version(&conn)?;
        self.data_version.store(version, Ordering::SeqCst);
        drop(conn);

        self.session.send_replace(session);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<RecordingSession> {
        self.session.subscribe()
    }
}

#[async_trait]
impl ScreenshotStore for SqliteStore {
    async fn set(&self, id: &str, data_uri: String) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO screenshots (id, data_uri, created_at) VALUES (?1, ?2, ?3)",
            params![id, data_uri, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT data_uri FROM screenshots WHERE id = ?1")?;
        let mut found = HashMap::new();
        for id in ids {
            let blob: Option<String> = stmt.query_row(params![id], |row| row.get(0)).optional()?;
            if let Some(blob) = blob {
                found.insert(id.clone(), blob);
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewStep;
    use tokio_test::assert_ok;
    use uuid::Uuid;

    fn temp_db() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tasker-recorder-{}.db", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_round_trips_session_record() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut session = RecordingSession::default();
        session.start(10);
        session.append(NewStep::navigate("https://example.com"), 11);

        StepStore::set(&store, session.clone().into()).await.unwrap();
        assert_eq!(store.get().await.unwrap(), session);
        assert_eq!(*store.subscribe().borrow(), session);
    }

    #[tokio::test]
    async fn test_sees_writes_from_other_connection() {
        let path = temp_db();
        let panel = SqliteStore::open(&path).unwrap();
        let page = SqliteStore::open(&path).unwrap();
        let mut rx = page.subscribe();

        StepStore::set(
            &panel,
            SessionPatch {
                is_recording: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(page.refresh().unwrap());
        assert!(rx.has_changed().unwrap());
        assert!(page.get().await.unwrap().is_recording);
        assert!(!page.refresh().unwrap());

        drop(page);
        drop(panel);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_screenshot_blobs() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_ok!(
            ScreenshotStore::set(&store, "screenshot_1", "data:image/png;base64,AA".to_string())
                .await
        );

        let found = assert_ok!(
            store
                .get_many(&["screenshot_1".to_string(), "screenshot_2".to_string()])
                .await
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found["screenshot_1"], "data:image/png;base64,AA");
    }
}
