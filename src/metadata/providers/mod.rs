//! Concrete artwork provider implementations.
//!
//! Each submodule wraps a single external API and implements the
//! [`ArtworkProvider`](super::ArtworkProvider) trait.

pub mod fanart;
pub mod tmdb;

pub use fanart::FanartClient;
pub use tmdb::{MediaKind, TmdbClient};
