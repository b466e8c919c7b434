//! Artwork caching.
//!
//! Provider artwork URLs are checked against an allow-list, downloaded once,
//! and stored flat under `{data_dir}/posters` with deterministic names.

mod storage;
mod validate;

pub use storage::{ArtworkCache, CacheOutcome};
pub use validate::{match_source, AllowedSource};
