use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use hdrscan_av::ToolsConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root directory scanned for video files
    #[serde(default = "default_media_path")]
    pub media_path: PathBuf,

    /// Holds the registry document and the artwork cache
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Scratch root for sample extraction
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// File extensions picked up by discovery (without the dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Files resolved concurrently during a library scan
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_media_path() -> PathBuf {
    PathBuf::from("/media")
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("/app/data")
}
fn default_temp_dir() -> PathBuf {
    PathBuf::from("/app/temp")
}
fn default_extensions() -> Vec<String> {
    hdrscan_common::paths::video_extensions()
        .iter()
        .map(|e| e.to_string())
        .collect()
}
fn default_workers() -> usize {
    2
}

impl LibraryConfig {
    /// Location of the registry JSON document.
    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join("scanned_files.json")
    }

    /// Directory of cached artwork files.
    pub fn artwork_dir(&self) -> PathBuf {
        self.data_dir.join("posters")
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            media_path: default_media_path(),
            data_dir: default_data_dir(),
            temp_dir: default_temp_dir(),
            extensions: default_extensions(),
            workers: default_workers(),
        }
    }
}

/// Which provider supplies artwork.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    #[default]
    Tmdb,
    Fanart,
}

impl std::str::FromStr for ImageSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tmdb" => Ok(Self::Tmdb),
            "fanart" => Ok(Self::Fanart),
            other => Err(format!("unknown image source: {other}")),
        }
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tmdb => f.write_str("tmdb"),
            Self::Fanart => f.write_str("fanart"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub image_source: ImageSource,

    /// TMDB v3 API key
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// Fanart.tv personal API key
    #[serde(default)]
    pub fanart_api_key: Option<String>,

    /// Preferred language for audio tracks and provider responses
    #[serde(default = "default_content_language")]
    pub content_language: String,

    /// Timeout for provider requests and artwork downloads
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_tmdb_base_url")]
    pub tmdb_base_url: String,

    #[serde(default = "default_fanart_base_url")]
    pub fanart_base_url: String,
}

fn default_content_language() -> String {
    "en".to_string()
}
fn default_request_timeout() -> u64 {
    10
}
fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_fanart_base_url() -> String {
    "https://webservice.fanart.tv/v3".to_string()
}

impl MetadataConfig {
    /// The configured TMDB key, ignoring blank values.
    pub fn tmdb_key(&self) -> Option<&str> {
        non_blank(self.tmdb_api_key.as_deref())
    }

    /// The configured Fanart.tv key, ignoring blank values.
    pub fn fanart_key(&self) -> Option<&str> {
        non_blank(self.fanart_api_key.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            image_source: ImageSource::default(),
            tmdb_api_key: None,
            fanart_api_key: None,
            content_language: default_content_language(),
            request_timeout_secs: default_request_timeout(),
            tmdb_base_url: default_tmdb_base_url(),
            fanart_base_url: default_fanart_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Share of the container bitrate attributed to audio when no
    /// per-track figure exists
    #[serde(default = "default_audio_ratio")]
    pub audio_bitrate_estimate_ratio: f64,
}

fn default_audio_ratio() -> f64 {
    0.1
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            audio_bitrate_estimate_ratio: default_audio_ratio(),
        }
    }
}
