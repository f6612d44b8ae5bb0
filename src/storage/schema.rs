use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::types::StorageError;

// ============================================================================
// Key-value store
// ============================================================================

/// Handle to the local key-value store.
///
/// One table of opaque string keys and string values carries everything the
/// app persists: theme flags, the credential record, the session marker, and
/// the per-user `prefs_`/`saved_` partitions.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
    /// Serializes read-modify-write updates within the process. SQLite
    /// returns SQLITE_BUSY without waiting when two deferred transactions
    /// both try to upgrade a read lock, so writers queue here instead.
    pub(crate) write_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Open the store and run migrations
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InstanceLocked` if another instance of
    /// blockwise has the store locked (SQLITE_BUSY, SQLITE_LOCKED,
    /// SQLITE_CANTOPEN). Returns `StorageError::Other` for other database
    /// errors.
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // Set store file permissions BEFORE pool creation so there is no
        // window where the file exists with default umask permissions; it
        // holds a credential hash.
        #[cfg(unix)]
        if path != ":memory:" {
            use std::os::unix::fs::PermissionsExt;
            let db_path = std::path::Path::new(path);
            if db_path.exists() {
                let perms = std::fs::Permissions::from_mode(0o600);
                if let Err(e) = std::fs::set_permissions(path, perms) {
                    tracing::warn!(path = %path, error = %e, "Failed to set store file permissions");
                }
            } else if let Some(parent) = db_path.parent() {
                if parent.exists() {
                    // Pre-create the file with mode(0o600) atomically;
                    // OpenOptionsExt::mode() sets permissions at creation
                    // time, eliminating the create-then-chmod window.
                    use std::os::unix::fs::OpenOptionsExt;
                    let _file = std::fs::OpenOptions::new()
                        .write(true)
                        .create_new(true)
                        .mode(0o600)
                        .open(db_path)
                        .ok(); // If creation fails, SQLite reports the error at connect_with.
                }
            }
        }

        // busy_timeout=5000: SQLite waits up to 5 seconds for locks to
        // release before returning SQLITE_BUSY. Transactional
        // read-modify-write updates rely on this to serialize rather than
        // fail under transient contention.
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(StorageError::from_sqlx)?
            .pragma("busy_timeout", "5000");
        // SQLite is single-writer; a small pool covers concurrent readers.
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(StorageError::from_sqlx)?;
        let db = Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        };
        db.migrate().await.map_err(|e| {
            let error_string = e.to_string().to_lowercase();
            if error_string.contains("database is locked")
                || error_string.contains("database table is locked")
                || error_string.contains("sqlite_busy")
                || error_string.contains("sqlite_locked")
            {
                StorageError::InstanceLocked
            } else {
                StorageError::Migration(e.to_string())
            }
        })?;
        Ok(db)
    }

    /// Run store migrations.
    ///
    /// Idempotent: `IF NOT EXISTS` makes re-running on an existing store a
    /// no-op.
    async fn migrate(&self) -> Result<()> {
        sqlx::query("PRAGMA busy_timeout = 5000")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
