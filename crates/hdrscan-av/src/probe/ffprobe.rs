//! FFprobe stream/format inspection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::tools::{ToolRegistry, FFPROBE};
use crate::{Error, Result};

/// Parsed `ffprobe -show_format -show_streams` report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfprobeReport {
    #[serde(default)]
    pub format: FfprobeFormat,
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    /// Raw JSON text of the first video stream, kept for marker scans that
    /// must see fields the typed view drops (side data, extra tags).
    #[serde(skip)]
    pub video_stream_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
    pub bit_rate: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub profile: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub color_transfer: Option<String>,
    pub color_primaries: Option<String>,
    pub bit_rate: Option<String>,
    pub channels: Option<u32>,
    #[serde(default)]
    pub tags: FfprobeTags,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfprobeTags {
    pub language: Option<String>,
    pub title: Option<String>,
    /// Matroska statistics tag, bits per second.
    #[serde(rename = "BPS")]
    pub bps: Option<String>,
}

impl FfprobeStream {
    fn is(&self, kind: &str) -> bool {
        self.codec_type.as_deref() == Some(kind)
    }
}

impl FfprobeReport {
    /// Parse ffprobe JSON output.
    pub fn parse(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let video_stream_text = value
            .get("streams")
            .and_then(|s| s.as_array())
            .and_then(|streams| {
                streams
                    .iter()
                    .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("video"))
            })
            .map(|s| s.to_string());

        let mut report: FfprobeReport = serde_json::from_value(value)?;
        report.video_stream_text = video_stream_text;
        Ok(report)
    }

    /// The first video stream, if any.
    pub fn video_stream(&self) -> Option<&FfprobeStream> {
        self.streams.iter().find(|s| s.is("video"))
    }

    /// Audio streams in container order.
    pub fn audio_streams(&self) -> Vec<&FfprobeStream> {
        self.streams.iter().filter(|s| s.is("audio")).collect()
    }

    /// Container duration in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        self.format
            .duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
    }

    /// Friendly resolution label for the first video stream.
    pub fn resolution_label(&self) -> String {
        match self.video_stream().and_then(|v| Some((v.width?, v.height?))) {
            Some((w, h)) => resolution_label(w, h),
            None => "Unknown".to_string(),
        }
    }
}

/// Map exact frame dimensions to a common name, else `"{w}x{h}"`.
pub fn resolution_label(width: u32, height: u32) -> String {
    let label = match (width, height) {
        (3840, 2160) => "4K (UHD)",
        (1920, 1080) => "1080p (Full HD)",
        (1280, 720) => "720p (HD)",
        (7680, 4320) => "8K (UHD)",
        (2560, 1440) => "1440p",
        (4096, 2160) => "4K DCI",
        (1366, 768) => "768p",
        (854, 480) | (640, 480) => "480p (SD)",
        _ => return format!("{width}x{height}"),
    };
    label.to_string()
}

/// Run ffprobe against a file.
pub async fn probe(tools: &ToolRegistry, path: &Path) -> Result<FfprobeReport> {
    let output = tools
        .command(FFPROBE)?
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .execute()
        .await?;

    FfprobeReport::parse(&output.stdout).map_err(|e| Error::malformed(FFPROBE, e.to_string()))
}
