//! Content-addressed artwork cache.
//!
//! Files live flat under one directory and are named deterministically from
//! the provider and external id, or from a hash of the URL when no id is
//! known. A file's existence is the only proof that it is valid: writes go to
//! a temp file in the same directory and are renamed into place.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use sha2::{Digest, Sha256};

use super::validate::{match_source, AllowedSource};
use crate::error::{Error, Result};
use crate::state::ArtworkRef;

/// Redirect hops followed per download. Every hop must pass the allow-list.
const MAX_REDIRECTS: usize = 5;

static CACHE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+\.jpg$").expect("cache key pattern is valid"));

/// Result of offering a URL to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Stored (or already present) under this key.
    Cached(String),
    /// Allowed but the download failed; the URL is still usable remotely.
    Uncached(String),
    /// Not on the allow-list. Never fetched, never stored.
    Rejected,
}

impl CacheOutcome {
    /// What a record should carry for this outcome.
    pub fn into_artwork(self) -> Option<ArtworkRef> {
        match self {
            Self::Cached(key) => Some(ArtworkRef::Cached { key }),
            Self::Uncached(url) => Some(ArtworkRef::Remote { url }),
            Self::Rejected => None,
        }
    }
}

/// On-disk artwork cache.
pub struct ArtworkCache {
    dir: PathBuf,
    client: reqwest::Client,
    allowed: Vec<AllowedSource>,
}

impl ArtworkCache {
    /// Create a cache rooted at `dir` with the default allow-list.
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            dir,
            client,
            allowed: AllowedSource::defaults(),
        })
    }

    /// Replace the allow-list.
    pub fn with_allowed_sources(mut self, allowed: Vec<AllowedSource>) -> Self {
        self.allowed = allowed;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The allow-list entry `url` matches, if any.
    pub fn validate(&self, url: &str) -> Option<&AllowedSource> {
        match_source(&self.allowed, url)
    }

    /// Whether `url` passes the allow-list.
    pub fn is_allowed(&self, url: &str) -> bool {
        self.validate(url).is_some()
    }

    /// Deterministic file name for an artwork URL.
    pub fn cache_key(source: &AllowedSource, url: &str, external_id: Option<&str>) -> String {
        let provider_ok = !source.provider.is_empty()
            && source
                .provider
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        match external_id {
            Some(id) if provider_ok && is_numeric_id(id) => format!("{}_{}.jpg", source.provider, id),
            _ => format!("poster_{}.jpg", url_hash(url)),
        }
    }

    /// Whether a file for `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        CACHE_KEY.is_match(key) && self.dir.join(key).is_file()
    }

    /// Validate `url`, then return its cached key, downloading it first if
    /// needed. Download failures degrade to [`CacheOutcome::Uncached`].
    pub async fn store(&self, url: &str, external_id: Option<&str>) -> CacheOutcome {
        let url = url.trim();
        let Some(source) = self.validate(url) else {
            tracing::warn!(url, "artwork URL rejected by allow-list");
            return CacheOutcome::Rejected;
        };

        let key = Self::cache_key(source, url, external_id);
        if self.contains(&key) {
            return CacheOutcome::Cached(key);
        }

        match self.download(url, &key).await {
            Ok(()) => {
                tracing::debug!(key = %key, "artwork cached");
                CacheOutcome::Cached(key)
            }
            Err(e) => {
                tracing::warn!(url, "failed to cache artwork: {}", e);
                CacheOutcome::Uncached(url.to_string())
            }
        }
    }

    /// GET `url`, following redirects only to allow-listed locations.
    async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
        let mut current = reqwest::Url::parse(url).map_err(|e| Error::validation(format!("bad artwork URL: {e}")))?;

        for _ in 0..=MAX_REDIRECTS {
            let response = self.client.get(current.clone()).send().await?;
            if !response.status().is_redirection() {
                return Ok(response);
            }

            let next = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| current.join(location).ok())
                .ok_or_else(|| Error::validation("redirect without a usable location"))?;
            if !self.is_allowed(next.as_str()) {
                return Err(Error::validation(format!("redirect to {next} is not on the allow-list")));
            }
            current = next;
        }

        Err(Error::validation(format!("more than {MAX_REDIRECTS} redirects")))
    }

    async fn download(&self, url: &str, key: &str) -> Result<()> {
        let bytes = self.fetch(url).await?.error_for_status()?.bytes().await?;

        if bytes.is_empty() {
            return Err(Error::validation("empty artwork response"));
        }

        let dir = self.dir.clone();
        let target = self.dir.join(key);
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| Error::persist(&target, e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    /// Path of the cached file for a serving key.
    ///
    /// Only keys matching `^[A-Za-z0-9_-]+\.jpg$` that resolve inside the
    /// cache directory are served.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if !CACHE_KEY.is_match(key) {
            return Err(Error::validation(format!("invalid artwork key: {key}")));
        }

        let path = self.dir.join(key);
        if !path.is_file() {
            return Err(Error::NotFound(path));
        }

        let root = self.dir.canonicalize()?;
        let resolved = path.canonicalize()?;
        if !resolved.starts_with(&root) {
            return Err(Error::validation(format!("artwork key escapes cache: {key}")));
        }

        Ok(resolved)
    }

    /// Open a cached file for serving.
    pub async fn open(&self, key: &str) -> Result<tokio::fs::File> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::File::open(path).await?)
    }

    /// Delete the file for `key`. Returns whether anything was removed.
    pub fn evict(&self, key: &str) -> bool {
        if !CACHE_KEY.is_match(key) {
            return false;
        }

        let path = self.dir.join(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(key, "artwork evicted");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(key, "failed to evict artwork: {}", e);
                false
            }
        }
    }
}

fn is_numeric_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// First 32 hex characters of the SHA-256 of `url`.
fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(&digest[..16])
}
