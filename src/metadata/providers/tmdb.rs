//! TMDB (The Movie Database) artwork provider.
//!
//! Implements [`ArtworkProvider`] on top of the TMDB v3 REST API and exposes
//! the by-id details and credits lookups the enrichment step needs.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - Content-language requests with an English retry when the localized
//!   response is missing or has no artwork.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use hdrscan_common::language::FALLBACK_LANGUAGE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::MetadataConfig;
use crate::error::{Error, Result};
use crate::metadata::provider::{ArtworkMatch, ArtworkProvider, Credits, TitleDetails};
use crate::metadata::title;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/original";
const MAX_RETRIES: u32 = 3;
const REQUESTS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(4) {
    Some(n) => n,
    None => unreachable!(),
};
const MAX_DIRECTORS: usize = 3;
const MAX_CAST: usize = 10;

/// TMDB catalogue a lookup targets. Movies are always tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Movie, MediaKind::Tv];

    fn path(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbEntry>,
}

/// Movie and TV details and search results share one shape; movies use
/// `title`/`release_date`, shows use `name`/`first_air_date`.
#[derive(Debug, Default, Deserialize)]
struct TmdbEntry {
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f64>,
    overview: Option<String>,
}

impl TmdbEntry {
    fn artwork_url(&self) -> Option<String> {
        self.backdrop_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(image_url)
    }

    fn details(&self) -> TitleDetails {
        TitleDetails {
            title: non_blank(self.title.as_deref().or(self.name.as_deref())),
            year: parse_year(self.release_date.as_deref().or(self.first_air_date.as_deref())),
            rating: self.vote_average,
            plot: non_blank(self.overview.as_deref()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbPerson>,
    #[serde(default)]
    crew: Vec<TmdbPerson>,
}

#[derive(Debug, Deserialize)]
struct TmdbPerson {
    name: Option<String>,
    job: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB client.
///
/// # Examples
///
/// ```no_run
/// use hdrscan::config::MetadataConfig;
/// use hdrscan::metadata::providers::TmdbClient;
///
/// let config = MetadataConfig {
///     tmdb_api_key: Some("your-api-key".into()),
///     ..Default::default()
/// };
/// let client = TmdbClient::from_config(&config).unwrap();
/// ```
pub struct TmdbClient {
    client: reqwest::Client,
    api_key: Option<String>,
    language: String,
    base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbClient {
    /// Create a client. Without an API key the client reports itself
    /// unavailable and every lookup returns nothing.
    pub fn new(
        api_key: Option<String>,
        language: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            language: language.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::direct(Quota::per_second(REQUESTS_PER_SECOND)),
        })
    }

    pub fn from_config(config: &MetadataConfig) -> Result<Self> {
        Self::new(
            config.tmdb_key().map(str::to_string),
            &config.content_language,
            &config.tmdb_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Languages to try, in order.
    fn languages(&self) -> Vec<&str> {
        if self.language == FALLBACK_LANGUAGE {
            vec![FALLBACK_LANGUAGE]
        } else {
            vec![self.language.as_str(), FALLBACK_LANGUAGE]
        }
    }

    /// GET a JSON document with rate limiting and 429-retry logic.
    ///
    /// Non-success statuses are logged and yield `Ok(None)`; only transport
    /// and decoding failures are errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_params: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let Some(url) = self.url(path, extra_params) else {
            return Ok(None);
        };

        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self.client.get(&url).send().await?;
            let status = resp.status();

            if status == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(retry = retries, wait_secs = wait, "TMDB returned 429, backing off");
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                debug!(path, "TMDB returned 404");
                return Ok(None);
            }
            if !status.is_success() {
                warn!(path, status = %status, "TMDB request failed");
                return Ok(None);
            }

            return Ok(Some(resp.json().await?));
        }
    }

    /// Build a full API URL with the API key and extra query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> Option<String> {
        let api_key = self.api_key.as_deref()?;
        let mut url = format!("{}{path}?api_key={}", self.base_url, urlencoded(api_key));
        for (key, value) in extra_params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        Some(url)
    }

    /// Details for `id`, preferring a localized response that carries artwork.
    async fn entry_by_id(&self, kind: MediaKind, id: &str) -> Result<Option<TmdbEntry>> {
        let path = format!("/{}/{id}", kind.path());
        let mut fallback = None;

        for lang in self.languages() {
            debug!(path = %path, lang, "TMDB details");
            if let Some(entry) = self.get_json::<TmdbEntry>(&path, &[("language", lang)]).await? {
                if entry.artwork_url().is_some() {
                    return Ok(Some(entry));
                }
                fallback.get_or_insert(entry);
            }
        }

        Ok(fallback)
    }

    /// First search result with artwork.
    async fn search(&self, kind: MediaKind, query: &str) -> Result<Option<TmdbEntry>> {
        let path = format!("/search/{}", kind.path());

        for lang in self.languages() {
            debug!(path = %path, lang, query, "TMDB search");
            let Some(body) = self
                .get_json::<TmdbSearchResponse>(&path, &[("query", query), ("language", lang)])
                .await?
            else {
                continue;
            };

            if let Some(entry) = body.results.into_iter().find(|r| r.artwork_url().is_some()) {
                return Ok(Some(entry));
            }
        }

        Ok(None)
    }

    /// Artwork and details by TMDB id, movie first then TV.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<ArtworkMatch>> {
        ensure_id(id)?;

        for kind in MediaKind::ALL {
            if let Some(entry) = self.entry_by_id(kind, id).await? {
                if let Some(url) = entry.artwork_url() {
                    return Ok(Some(ArtworkMatch {
                        url,
                        external_id: Some(id.to_string()),
                        details: entry.details(),
                    }));
                }
            }
        }
        Ok(None)
    }

    /// Artwork and details by title search, movie first then TV. Search
    /// matches carry no id.
    pub async fn find_by_title(&self, query: &str) -> Result<Option<ArtworkMatch>> {
        let query = query.trim();
        if !title::is_valid_query(query) {
            debug!(len = query.chars().count(), "search query out of bounds");
            return Ok(None);
        }

        for kind in MediaKind::ALL {
            if let Some(entry) = self.search(kind, query).await? {
                if let Some(url) = entry.artwork_url() {
                    return Ok(Some(ArtworkMatch {
                        url,
                        external_id: None,
                        details: entry.details(),
                    }));
                }
            }
        }
        Ok(None)
    }

    /// Title, year, rating and plot for `id`, movie first then TV.
    pub async fn title_details(&self, id: &str) -> Result<TitleDetails> {
        ensure_id(id)?;

        for kind in MediaKind::ALL {
            if let Some(entry) = self.entry_by_id(kind, id).await? {
                let details = entry.details();
                if details.title.is_some() {
                    return Ok(details);
                }
            }
        }
        Ok(TitleDetails::default())
    }

    /// Directors and cast for `id`, movie first then TV.
    pub async fn credits(&self, id: &str) -> Result<Credits> {
        ensure_id(id)?;

        for kind in MediaKind::ALL {
            let path = format!("/{}/{id}/credits", kind.path());
            if let Some(raw) = self.get_json::<TmdbCredits>(&path, &[]).await? {
                let credits = summarize_credits(raw);
                if !credits.is_empty() {
                    return Ok(credits);
                }
            }
        }
        Ok(Credits::default())
    }
}

fn ensure_id(id: &str) -> Result<()> {
    if title::is_valid_id(id) {
        Ok(())
    } else {
        Err(Error::validation(format!("invalid TMDB id: {id:?}")))
    }
}

fn summarize_credits(raw: TmdbCredits) -> Credits {
    let directors = raw
        .crew
        .into_iter()
        .filter(|p| p.job.as_deref() == Some("Director"))
        .filter_map(|p| non_blank(p.name.as_deref()))
        .take(MAX_DIRECTORS)
        .collect();

    let cast = raw
        .cast
        .into_iter()
        .take(MAX_CAST)
        .filter_map(|p| non_blank(p.name.as_deref()))
        .collect();

    Credits { directors, cast }
}

/// Minimal percent-encoding for query parameter values.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: Option<&str>) -> Option<u16> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse::<u16>().ok())
}

/// Convert a TMDB image path fragment to a full URL.
fn image_url(path: &str) -> String {
    format!("{TMDB_IMAGE_BASE}{path}")
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[async_trait]
impl ArtworkProvider for TmdbClient {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn find_artwork(&self, filename: &str) -> Result<Option<ArtworkMatch>> {
        if !self.is_available() {
            return Ok(None);
        }

        if let Some(id) = title::extract_tmdb_id(filename) {
            debug!(id = %id, "TMDB id found in file name");
            if let Some(found) = self.find_by_id(&id).await? {
                return Ok(Some(found));
            }
        }

        let query = title::search_query(filename);
        self.find_by_title(&query).await
    }
}
