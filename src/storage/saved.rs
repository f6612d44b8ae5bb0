use anyhow::Result;

use super::schema::Database;
use crate::category::CategoryId;
use crate::news::Story;

/// Key of a user's topic-preference partition.
pub(crate) fn prefs_key(user_key: &str) -> String {
    format!("prefs_{user_key}")
}

/// Key of a user's saved-article partition.
pub(crate) fn saved_key(user_key: &str) -> String {
    format!("saved_{user_key}")
}

/// Parse a JSON list out of a partition, degrading corrupt data to empty.
///
/// A corrupt local cache should not brick the caller; the partition will be
/// rewritten wholesale on the next mutation anyway.
fn parse_list<T: serde::de::DeserializeOwned>(key: &str, raw: Option<String>) -> Vec<T> {
    match raw {
        None => Vec::new(),
        Some(json) => match serde_json::from_str(&json) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Corrupt partition, treating as empty");
                Vec::new()
            }
        },
    }
}

impl Database {
    // ========================================================================
    // Preferences Operations
    // ========================================================================

    /// Load a user's selected category ids. Missing partition yields an
    /// empty list.
    pub async fn load_preferences(&self, user_key: &str) -> Result<Vec<CategoryId>> {
        let key = prefs_key(user_key);
        let raw = self.get_value(&key).await?;
        Ok(parse_list(&key, raw))
    }

    /// Replace a user's selected category ids wholesale. No merge semantics.
    pub async fn save_preferences(&self, user_key: &str, ids: &[CategoryId]) -> Result<()> {
        let json = serde_json::to_string(ids)?;
        self.set_value(&prefs_key(user_key), &json).await
    }

    // ========================================================================
    // Saved-Articles Operations
    // ========================================================================

    /// Load a user's saved stories. Missing partition yields an empty list.
    pub async fn load_saved(&self, user_key: &str) -> Result<Vec<Story>> {
        let key = saved_key(user_key);
        let raw = self.get_value(&key).await?;
        Ok(parse_list(&key, raw))
    }

    /// Append a story to the saved list unless one with the same id is
    /// already present. Runs as a transactional read-modify-write, so two
    /// overlapping toggles on the same partition serialize instead of one
    /// silently overwriting the other.
    pub async fn save_story(&self, user_key: &str, story: &Story) -> Result<()> {
        let key = saved_key(user_key);
        self.update_value(&key, |raw| {
            let mut list: Vec<Story> = parse_list(&key, raw);
            if !list.iter().any(|s| s.id == story.id) {
                list.push(story.clone());
            }
            Ok(Some(serde_json::to_string(&list)?))
        })
        .await
    }

    /// Remove a story from the saved list by id. Absent ids are a no-op.
    pub async fn unsave_story(&self, user_key: &str, story_id: &str) -> Result<()> {
        let key = saved_key(user_key);
        self.update_value(&key, |raw| {
            let mut list: Vec<Story> = parse_list(&key, raw);
            list.retain(|s| s.id != story_id);
            Ok(Some(serde_json::to_string(&list)?))
        })
        .await
    }

    /// Whether a story id is in the user's saved list.
    pub async fn is_saved(&self, user_key: &str, story_id: &str) -> Result<bool> {
        Ok(self
            .load_saved(user_key)
            .await?
            .iter()
            .any(|s| s.id == story_id))
    }

    /// Drop the whole saved-article partition.
    pub async fn clear_saved(&self, user_key: &str) -> Result<()> {
        self.remove_value(&saved_key(user_key)).await
    }
}
