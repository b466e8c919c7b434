//! Enrichment of a scanned file with artwork, details and credits.
//!
//! The [`Enricher`] runs the configured artwork provider, validates and caches
//! whatever URL it returns through the [`ArtworkCache`], then fills in
//! descriptive metadata and credits from TMDB when an id is known. Every
//! failure degrades to "no data" for the affected fields.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ImageSource, MetadataConfig};
use crate::error::Result;
use crate::images::ArtworkCache;
use crate::state::ArtworkRef;

use super::provider::{ArtworkProvider, Credits, TitleDetails};
use super::providers::{FanartClient, TmdbClient};

/// Everything enrichment found for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub external_id: Option<String>,
    pub artwork: Option<ArtworkRef>,
    pub details: TitleDetails,
    pub credits: Credits,
}

/// Combines the selected artwork provider with TMDB lookups and the cache.
///
/// # Example
///
/// ```rust,ignore
/// let enricher = Enricher::from_config(&config.metadata, cache)?;
/// let found = enricher.enrich("Dune (2021) {tmdb-438631}.mkv").await;
/// ```
pub struct Enricher {
    artwork: Arc<dyn ArtworkProvider>,
    tmdb: Arc<TmdbClient>,
    cache: Arc<ArtworkCache>,
}

impl Enricher {
    pub fn new(artwork: Arc<dyn ArtworkProvider>, tmdb: Arc<TmdbClient>, cache: Arc<ArtworkCache>) -> Self {
        Self {
            artwork,
            tmdb,
            cache,
        }
    }

    /// Build the provider chosen by `image_source`.
    pub fn from_config(config: &MetadataConfig, cache: Arc<ArtworkCache>) -> Result<Self> {
        let tmdb = Arc::new(TmdbClient::from_config(config)?);
        let artwork: Arc<dyn ArtworkProvider> = match config.image_source {
            ImageSource::Tmdb => tmdb.clone() as Arc<dyn ArtworkProvider>,
            ImageSource::Fanart => Arc::new(FanartClient::from_config(config)?) as Arc<dyn ArtworkProvider>,
        };

        info!(
            provider = artwork.name(),
            available = artwork.is_available(),
            "artwork provider configured"
        );

        Ok(Self::new(artwork, tmdb, cache))
    }

    pub fn provider(&self) -> &dyn ArtworkProvider {
        self.artwork.as_ref()
    }

    pub fn cache(&self) -> &Arc<ArtworkCache> {
        &self.cache
    }

    /// Look up artwork and metadata for a file name.
    pub async fn enrich(&self, filename: &str) -> Enrichment {
        let mut found = Enrichment::default();

        if !self.artwork.is_available() {
            debug!(provider = self.artwork.name(), "artwork provider unavailable");
        } else {
            match self.artwork.find_artwork(filename).await {
                Ok(Some(m)) => {
                    found.external_id = m.external_id;
                    found.details = m.details;
                    found.artwork = self
                        .cache
                        .store(&m.url, found.external_id.as_deref())
                        .await
                        .into_artwork();
                }
                Ok(None) => debug!(filename, provider = self.artwork.name(), "no artwork found"),
                Err(e) => warn!(filename, provider = self.artwork.name(), "artwork lookup failed: {}", e),
            }
        }

        let Some(id) = found.external_id.clone() else {
            return found;
        };
        if !self.tmdb.is_available() {
            return found;
        }

        if found.details.title.is_none() {
            match self.tmdb.title_details(&id).await {
                Ok(details) => found.details = details,
                Err(e) => warn!(id = %id, "TMDB details lookup failed: {}", e),
            }
        }

        match self.tmdb.credits(&id).await {
            Ok(credits) => found.credits = credits,
            Err(e) => warn!(id = %id, "TMDB credits lookup failed: {}", e),
        }

        found
    }

    /// Offer a remote artwork URL to the cache again. Returns the new
    /// reference when it is now cached.
    pub async fn recache(&self, artwork: &ArtworkRef, external_id: Option<&str>) -> Option<ArtworkRef> {
        let ArtworkRef::Remote { url } = artwork else {
            return None;
        };

        match self.cache.store(url, external_id).await.into_artwork() {
            Some(cached @ ArtworkRef::Cached { .. }) => Some(cached),
            _ => None,
        }
    }
}
