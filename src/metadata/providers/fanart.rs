//! Fanart.tv artwork provider.
//!
//! Fanart.tv is keyed by TMDB id for movies, so only files carrying a
//! `{tmdb-N}` tag can be matched. TV lookups would need a TVDB id and are not
//! attempted. Fanart.tv returns artwork only; descriptive metadata is filled
//! in from TMDB by the enrichment step.

use std::time::Duration;

use async_trait::async_trait;
use hdrscan_common::language::FALLBACK_LANGUAGE;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::MetadataConfig;
use crate::error::Result;
use crate::metadata::provider::{ArtworkMatch, ArtworkProvider, TitleDetails};
use crate::metadata::title;

#[derive(Debug, Default, Deserialize)]
struct FanartMovie {
    #[serde(default)]
    moviethumb: Vec<FanartImage>,
}

#[derive(Debug, Deserialize)]
struct FanartImage {
    #[serde(default)]
    url: String,
    #[serde(default)]
    lang: String,
    /// Served as a string; tolerate numbers and garbage.
    #[serde(default)]
    likes: serde_json::Value,
}

impl FanartImage {
    fn likes(&self) -> u64 {
        match &self.likes {
            serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
            serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Most-liked image among those `keep` accepts. Ties go to the earliest.
fn most_liked<'a>(
    images: &'a [FanartImage],
    keep: impl Fn(&FanartImage) -> bool,
) -> Option<&'a FanartImage> {
    images
        .iter()
        .filter(|i| !i.url.trim().is_empty() && keep(i))
        .fold(None, |best: Option<&FanartImage>, img| match best {
            Some(b) if b.likes() >= img.likes() => Some(b),
            _ => Some(img),
        })
}

/// Content language, then English, then any language.
fn pick_thumb<'a>(images: &'a [FanartImage], content_language: &str) -> Option<&'a FanartImage> {
    let in_lang = |lang: &str| most_liked(images, |i| i.lang.eq_ignore_ascii_case(lang));

    in_lang(content_language)
        .or_else(|| {
            if content_language.eq_ignore_ascii_case(FALLBACK_LANGUAGE) {
                None
            } else {
                in_lang(FALLBACK_LANGUAGE)
            }
        })
        .or_else(|| most_liked(images, |_| true))
}

/// Fanart.tv client.
pub struct FanartClient {
    client: reqwest::Client,
    api_key: Option<String>,
    language: String,
    base_url: String,
}

impl FanartClient {
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
        })
    }

    pub fn from_config(config: &MetadataConfig) -> Result<Self> {
        Self::new(
            config.fanart_key().map(str::to_string),
            &config.content_language,
            &config.fanart_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Best movie thumb URL for a TMDB id.
    pub async fn movie_thumb(&self, tmdb_id: &str) -> Result<Option<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };
        if !title::is_valid_id(tmdb_id) {
            debug!(id = tmdb_id, "skipping Fanart.tv lookup for invalid id");
            return Ok(None);
        }

        let resp = self
            .client
            .get(format!("{}/movies/{tmdb_id}", self.base_url))
            .query(&[("api_key", api_key)])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            warn!(id = tmdb_id, status = %status, "Fanart.tv request failed");
            return Ok(None);
        }

        let movie: FanartMovie = resp.json().await?;
        Ok(pick_thumb(&movie.moviethumb, &self.language).map(|i| i.url.trim().to_string()))
    }
}

#[async_trait]
impl ArtworkProvider for FanartClient {
    fn name(&self) -> &'static str {
        "fanart"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn find_artwork(&self, filename: &str) -> Result<Option<ArtworkMatch>> {
        let Some(id) = title::extract_tmdb_id(filename) else {
            debug!(filename, "no TMDB id in file name, Fanart.tv needs one");
            return Ok(None);
        };

        Ok(self.movie_thumb(&id).await?.map(|url| ArtworkMatch {
            url,
            external_id: Some(id),
            details: TitleDetails::default(),
        }))
    }
}
