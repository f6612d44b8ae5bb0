//! News provider integration: trending fan-out, search, raw story fetch.

mod client;
mod types;

pub use client::{FailurePolicy, NewsClient, NewsError};
pub use types::{FullStory, Story};
