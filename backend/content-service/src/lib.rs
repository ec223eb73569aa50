//! Content service: published content items behind a cache-aside store
//!
//! Reads go cache first and fall back to the repository; writes hit the
//! repository first and then invalidate the affected cache keys.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use error::{ContentError, Result};
pub use models::{ContentDraft, ContentItem};
pub use services::ContentStore;
