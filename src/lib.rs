//! hdrscan - dynamic-range classification and metadata for video libraries
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod error;
pub mod images;
pub mod metadata;
pub mod scanner;
pub mod state;

pub use error::{Error, Result};
pub use images::ArtworkCache;
pub use scanner::{Resolution, Resolver, ScanSummary};
pub use state::{MediaRecord, ScanRegistry};
