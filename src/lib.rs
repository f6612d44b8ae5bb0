//! Local-first news digest core.
//!
//! Everything the screens of a news-digest app need, minus the screens:
//! categorized trending stories, free-text search, AI summarization of full
//! articles, a single-slot local account with session, and per-user
//! preferences / saved-article lists persisted in a local key-value store.

pub mod category;
pub mod config;
pub mod context;
pub mod news;
pub mod storage;
pub mod summarize;
pub mod util;
