use hdrscan_common::{EnhancementLayer, HdrClassification, HdrFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// URL prefix under which cached artwork is served.
pub const ARTWORK_ROUTE_PREFIX: &str = "/poster/";

/// Where a record's artwork lives.
///
/// Either a key into the local artwork cache or an external URL that passed
/// the allow-list. Never arbitrary input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtworkRef {
    Cached { key: String },
    Remote { url: String },
}

impl ArtworkRef {
    /// The link handed to the presentation layer.
    pub fn href(&self) -> String {
        match self {
            Self::Cached { key } => format!("{ARTWORK_ROUTE_PREFIX}{key}"),
            Self::Remote { url } => url.clone(),
        }
    }

    pub fn cache_key(&self) -> Option<&str> {
        match self {
            Self::Cached { key } => Some(key),
            Self::Remote { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub filename: String,
    pub path: PathBuf,
    pub hdr_format: HdrFormat,
    pub hdr_detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dv_profile: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub el_type: Option<EnhancementLayer>,
    pub resolution: String,
    pub audio_codec: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub artwork: Option<ArtworkRef>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub video_bitrate_kbps: Option<u64>,
    #[serde(default)]
    pub audio_bitrate_kbps: Option<u64>,
    #[serde(default)]
    pub file_size: u64,
}

impl MediaRecord {
    /// A record with the technical fields filled from a classification and
    /// everything else empty.
    pub fn new(path: PathBuf, classification: HdrClassification) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            filename,
            path,
            hdr_format: classification.format,
            hdr_detail: classification.detail,
            dv_profile: classification.profile,
            el_type: classification.el_type,
            resolution: "Unknown".to_string(),
            audio_codec: hdrscan_av::codec::UNKNOWN_CODEC.to_string(),
            external_id: None,
            artwork: None,
            title: None,
            year: None,
            rating: None,
            plot: None,
            directors: Vec::new(),
            cast: Vec::new(),
            duration_secs: None,
            video_bitrate_kbps: None,
            audio_bitrate_kbps: None,
            file_size: 0,
        }
    }

    /// Cache key of the record's artwork, if it is cached locally.
    pub fn artwork_key(&self) -> Option<&str> {
        self.artwork.as_ref().and_then(ArtworkRef::cache_key)
    }

    /// Rendered artwork link, if any.
    pub fn artwork_href(&self) -> Option<String> {
        self.artwork.as_ref().map(ArtworkRef::href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_artwork_renders_under_route_prefix() {
        let art = ArtworkRef::Cached {
            key: "tmdb_603.jpg".to_string(),
        };
        assert_eq!(art.href(), "/poster/tmdb_603.jpg");
        assert_eq!(art.cache_key(), Some("tmdb_603.jpg"));

        let remote = ArtworkRef::Remote {
            url: "https://image.tmdb.org/t/p/original/x.jpg".to_string(),
        };
        assert_eq!(remote.href(), "https://image.tmdb.org/t/p/original/x.jpg");
        assert_eq!(remote.cache_key(), None);
    }

    #[test]
    fn new_record_takes_filename_and_classification() {
        let record = MediaRecord::new(
            PathBuf::from("/media/Dune (2021).mkv"),
            HdrClassification::dolby_vision(8, None),
        );
        assert_eq!(record.filename, "Dune (2021).mkv");
        assert_eq!(record.hdr_format, HdrFormat::DolbyVision);
        assert_eq!(record.hdr_detail, "DV Profile 8");
        assert_eq!(record.dv_profile, Some(8));
        assert_eq!(record.audio_codec, "Unknown");
    }

    #[test]
    fn serialized_shape() {
        let mut record = MediaRecord::new(PathBuf::from("/m/a.mkv"), HdrClassification::sdr());
        record.artwork = Some(ArtworkRef::Cached {
            key: "poster_ab.jpg".to_string(),
        });
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["hdr_format"], "sdr");
        assert_eq!(json["artwork"]["kind"], "cached");
        assert_eq!(json["artwork"]["key"], "poster_ab.jpg");
        assert!(json.get("dv_profile").is_none());

        let back: MediaRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
