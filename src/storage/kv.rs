use anyhow::Result;

use super::schema::Database;

impl Database {
    // ========================================================================
    // Key-Value Operations
    // ========================================================================

    /// Get a single value by key.
    ///
    /// # Returns
    ///
    /// The stored value if the key exists, or `None` if not set.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a value (UPSERT).
    ///
    /// Inserts the key-value pair if it doesn't exist, or updates the value
    /// and timestamp if the key already exists.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a key. Removing an absent key is a no-op.
    pub async fn remove_value(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove several keys atomically: either all go or none do.
    ///
    /// Account deletion and logout clear multiple partitions at once; a
    /// partial clear would leave a half-deleted user behind.
    pub async fn remove_values(&self, keys: &[&str]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for key in keys {
            sqlx::query("DELETE FROM kv_store WHERE key = ?")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Transactional read-modify-write of a single key.
    ///
    /// The closure receives the current value (`None` when absent) and
    /// returns the new value, or `None` to delete the key. Read and write
    /// happen inside one transaction, so concurrent updates of the same key
    /// serialize on the store's write lock instead of silently losing one
    /// write.
    pub async fn update_value<F>(&self, key: &str, f: F) -> Result<()>
    where
        F: FnOnce(Option<String>) -> Result<Option<String>>,
    {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

        match f(row.map(|(value,)| value))? {
            Some(next) => {
                sqlx::query(
                    r#"
                    INSERT INTO kv_store (key, value, updated_at)
                    VALUES (?, ?, datetime('now'))
                    ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
                )
                .bind(key)
                .bind(next)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM kv_store WHERE key = ?")
                    .bind(key)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
