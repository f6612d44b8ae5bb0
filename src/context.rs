//! Explicit theme/session context.
//!
//! Persisted display settings are loaded once at startup and updated through
//! explicit operations that both mutate the in-memory snapshot and persist,
//! so there is no ambient global state to fall out of sync.

use anyhow::Result;

use crate::storage::Database;

const THEME_KEY: &str = "theme_dark";
const FONT_KEY: &str = "font_scale";

const DEFAULT_FONT_SCALE: f32 = 1.0;

/// In-memory snapshot of the persisted display settings, bound to the store
/// that backs it.
pub struct AppContext {
    db: Database,
    dark: bool,
    font_scale: f32,
}

impl AppContext {
    /// Load persisted settings. Missing or garbled values fall back to the
    /// defaults (light theme, scale 1.0) rather than failing startup.
    pub async fn load(db: Database) -> Result<Self> {
        let dark = matches!(db.get_value(THEME_KEY).await?.as_deref(), Some("true"));
        let font_scale = db
            .get_value(FONT_KEY)
            .await?
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_FONT_SCALE);

        Ok(Self {
            db,
            dark,
            font_scale,
        })
    }

    pub fn dark(&self) -> bool {
        self.dark
    }

    pub fn font_scale(&self) -> f32 {
        self.font_scale
    }

    /// Set dark mode and persist it.
    pub async fn set_dark(&mut self, dark: bool) -> Result<()> {
        self.dark = dark;
        self.db
            .set_value(THEME_KEY, if dark { "true" } else { "false" })
            .await
    }

    /// Flip dark mode, returning the new value.
    pub async fn toggle_dark(&mut self) -> Result<bool> {
        self.set_dark(!self.dark).await?;
        Ok(self.dark)
    }

    /// Set the font scale and persist it.
    pub async fn set_font_scale(&mut self, scale: f32) -> Result<()> {
        self.font_scale = scale;
        self.db.set_value(FONT_KEY, &scale.to_string()).await
    }
}
