use thiserror::Error;

/// Store-level errors with user-friendly messages
#[derive(Debug, Error)]
pub enum StorageError {
    /// Another instance of the application has locked the store
    #[error("Another instance of blockwise appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Store migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Store error: {0}")]
    Other(#[from] sqlx::Error),
}

impl StorageError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return StorageError::InstanceLocked;
        }

        StorageError::Other(err)
    }
}
