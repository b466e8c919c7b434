//! Artwork and descriptive metadata from external services.
//!
//! # Module layout
//!
//! - [`provider`] -- Trait definition and shared data types.
//! - [`providers`] -- TMDB and Fanart.tv implementations.
//! - [`title`] -- File-name parsing for ids and search queries.
//! - [`enrichment`] -- Combines a provider, TMDB details/credits and the cache.

pub mod enrichment;
pub mod provider;
pub mod providers;
pub mod title;

pub use enrichment::{Enricher, Enrichment};
pub use provider::{ArtworkMatch, ArtworkProvider, Credits, TitleDetails};
