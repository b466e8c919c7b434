//! Trait definition and types for artwork providers.
//!
//! A provider turns a file name into at most one artwork URL plus whatever
//! descriptive metadata came back with it. Which provider runs is a
//! configuration choice; providers are never combined in one lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Lookup results
// ---------------------------------------------------------------------------

/// Descriptive metadata for a title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleDetails {
    pub title: Option<String>,
    pub year: Option<u16>,
    /// Audience rating on a 0-10 scale.
    pub rating: Option<f64>,
    pub plot: Option<String>,
}

impl TitleDetails {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.year.is_none() && self.rating.is_none() && self.plot.is_none()
    }
}

/// Directors and leading cast, in billing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credits {
    pub directors: Vec<String>,
    pub cast: Vec<String>,
}

impl Credits {
    pub fn is_empty(&self) -> bool {
        self.directors.is_empty() && self.cast.is_empty()
    }
}

/// A provider's answer for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkMatch {
    /// Unverified artwork URL straight from the provider.
    pub url: String,
    /// TMDB id, when the match was made by id.
    pub external_id: Option<String>,
    pub details: TitleDetails,
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// An external artwork source.
#[async_trait]
pub trait ArtworkProvider: Send + Sync {
    /// Short, lowercase identifier (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Whether the provider has credentials and can serve requests.
    fn is_available(&self) -> bool;

    /// Find artwork for a file name. `Ok(None)` means the provider had
    /// nothing; errors are transport failures.
    async fn find_artwork(&self, filename: &str) -> Result<Option<ArtworkMatch>>;
}
