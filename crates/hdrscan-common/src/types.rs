//! Dynamic-range classification types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dynamic-range format of a video file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HdrFormat {
    /// Standard Dynamic Range.
    Sdr,
    /// HDR10 (PQ transfer or BT.2020 primaries with static metadata).
    Hdr10,
    /// HDR10+ (SMPTE ST 2094-40 dynamic metadata).
    Hdr10Plus,
    /// Hybrid Log-Gamma.
    Hlg,
    /// Dolby Vision.
    DolbyVision,
    /// The file could not be read at all.
    Unknown,
}

impl HdrFormat {
    /// Whether the format carries any high dynamic range signal.
    pub fn is_hdr(&self) -> bool {
        !matches!(self, HdrFormat::Sdr | HdrFormat::Unknown)
    }
}

impl fmt::Display for HdrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HdrFormat::Sdr => write!(f, "SDR"),
            HdrFormat::Hdr10 => write!(f, "HDR10"),
            HdrFormat::Hdr10Plus => write!(f, "HDR10+"),
            HdrFormat::Hlg => write!(f, "HLG"),
            HdrFormat::DolbyVision => write!(f, "Dolby Vision"),
            HdrFormat::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Dolby Vision enhancement layer type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnhancementLayer {
    /// Full enhancement layer.
    Fel,
    /// Minimal enhancement layer.
    Mel,
}

impl EnhancementLayer {
    /// Parse the `el_type` reported by an RPU analyzer. Case-insensitive;
    /// anything other than FEL/MEL yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FEL" => Some(EnhancementLayer::Fel),
            "MEL" => Some(EnhancementLayer::Mel),
            _ => None,
        }
    }
}

impl fmt::Display for EnhancementLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnhancementLayer::Fel => write!(f, "FEL"),
            EnhancementLayer::Mel => write!(f, "MEL"),
        }
    }
}

/// Result of dynamic-range classification for one file.
///
/// `profile` and `el_type` are only ever set for [`HdrFormat::DolbyVision`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HdrClassification {
    pub format: HdrFormat,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub el_type: Option<EnhancementLayer>,
}

impl HdrClassification {
    fn plain(format: HdrFormat) -> Self {
        Self {
            format,
            detail: format.to_string(),
            profile: None,
            el_type: None,
        }
    }

    pub fn sdr() -> Self {
        Self::plain(HdrFormat::Sdr)
    }

    pub fn hdr10() -> Self {
        Self::plain(HdrFormat::Hdr10)
    }

    pub fn hdr10_plus() -> Self {
        Self::plain(HdrFormat::Hdr10Plus)
    }

    pub fn hlg() -> Self {
        Self::plain(HdrFormat::Hlg)
    }

    /// Dolby Vision with its profile number, e.g. detail `"DV Profile 7"`.
    pub fn dolby_vision(profile: u8, el_type: Option<EnhancementLayer>) -> Self {
        Self {
            format: HdrFormat::DolbyVision,
            detail: format!("DV Profile {profile}"),
            profile: Some(profile),
            el_type,
        }
    }

    /// Classification for a file that could not be opened.
    pub fn unknown() -> Self {
        Self {
            format: HdrFormat::Unknown,
            detail: "Error".to_string(),
            profile: None,
            el_type: None,
        }
    }
}
