//! MediaInfo container inspection.
//!
//! MediaInfo reports HDR format strings, commercial codec names (Atmos,
//! DTS:X) and per-track bitrates that ffprobe does not surface.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::tools::{ToolRegistry, MEDIAINFO};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct MediaInfoOutput {
    media: Option<MediaInfoMedia>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoMedia {
    #[serde(default)]
    track: Vec<MediaInfoTrack>,
}

/// One `track` entry of `mediainfo --Output=JSON`.
///
/// Every field is optional; numeric values are kept as the strings MediaInfo
/// emits and interpreted by the consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfoTrack {
    #[serde(rename = "@type", default)]
    pub track_type: String,
    #[serde(rename = "Format", default, deserialize_with = "lenient")]
    pub format: Option<String>,
    #[serde(rename = "Format_Profile", default, deserialize_with = "lenient")]
    pub format_profile: Option<String>,
    #[serde(rename = "Format_Commercial_IfAny", default, deserialize_with = "lenient")]
    pub format_commercial: Option<String>,
    #[serde(rename = "Format_AdditionalFeatures", default, deserialize_with = "lenient")]
    pub format_additional: Option<String>,
    #[serde(rename = "HDR_Format", alias = "HDR format", default, deserialize_with = "lenient")]
    pub hdr_format: Option<String>,
    #[serde(rename = "HDR_Format_Compatibility", default, deserialize_with = "lenient")]
    pub hdr_format_compatibility: Option<String>,
    #[serde(rename = "Channels", default, deserialize_with = "lenient")]
    pub channels: Option<String>,
    #[serde(rename = "Language", default, deserialize_with = "lenient")]
    pub language: Option<String>,
    #[serde(rename = "Title", default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(rename = "BitRate", default, deserialize_with = "lenient")]
    pub bit_rate: Option<String>,
    #[serde(rename = "BitRate_String", default, deserialize_with = "lenient")]
    pub bit_rate_string: Option<String>,
}

/// Accept strings and numbers alike; anything else reads as absent.
fn lenient<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parsed MediaInfo report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfoReport {
    pub tracks: Vec<MediaInfoTrack>,
}

impl MediaInfoReport {
    /// Parse MediaInfo JSON output.
    pub fn parse(json: &str) -> Result<Self> {
        let output: MediaInfoOutput = serde_json::from_str(json)?;
        Ok(Self {
            tracks: output.media.map(|m| m.track).unwrap_or_default(),
        })
    }

    /// Tracks of the given `@type` (`"Video"`, `"Audio"`, ...), in order.
    pub fn tracks_of(&self, kind: &str) -> Vec<&MediaInfoTrack> {
        self.tracks.iter().filter(|t| t.track_type == kind).collect()
    }

    pub fn video_tracks(&self) -> Vec<&MediaInfoTrack> {
        self.tracks_of("Video")
    }

    pub fn audio_tracks(&self) -> Vec<&MediaInfoTrack> {
        self.tracks_of("Audio")
    }
}

/// Run mediainfo against a file.
pub async fn probe(tools: &ToolRegistry, path: &Path) -> Result<MediaInfoReport> {
    let output = tools
        .command(MEDIAINFO)?
        .arg("--Output=JSON")
        .arg(path)
        .execute()
        .await?;

    MediaInfoReport::parse(&output.stdout).map_err(|e| Error::malformed(MEDIAINFO, e.to_string()))
}
