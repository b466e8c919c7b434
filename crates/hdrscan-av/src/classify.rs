//! Dynamic-range classification.
//!
//! Classification is an ordered cascade of pure stages over [`ProbeData`].
//! Stages run in priority order and the first one that recognises its format
//! wins; a stage without enough data returns `None` and the next one runs.
//! Files that pass every stage are SDR. Only a file that could not be opened
//! is classified `Unknown`.

use hdrscan_common::HdrClassification;

use crate::probe::ProbeData;

type Stage = fn(&ProbeData) -> Option<HdrClassification>;

/// Detection stages, highest priority first.
const STAGES: &[(&str, Stage)] = &[
    ("dolby_vision", dolby_vision),
    ("hdr10_plus", hdr10_plus),
    ("static_hdr", static_hdr),
];

/// HDR_Format markers for SMPTE ST 2094 (App 4 is HDR10+).
const ST2094_FORMAT_MARKERS: &[&str] = &["2094", "app 4", "app4", "smpte st 2094", "smpte2094"];

/// HDR_Format_Compatibility markers announcing HDR10+.
const HDR10_PLUS_COMPAT_MARKERS: &[&str] = &["hdr10+ profile", "profile a", "hdr10+"];

/// Plain-text markers searched in the raw ffprobe video stream. Generic
/// `smpte` is deliberately absent: it would match ST 2084 (PQ).
const HDR10_PLUS_TEXT_MARKERS: &[&str] = &[
    "hdr10+",
    "hdr10plus",
    "smpte st 2094",
    "smpte2094",
    "smpte-st-2094",
];

const HLG_TRANSFER_MARKERS: &[&str] = &["hlg", "arib"];
const PQ_TRANSFER_MARKERS: &[&str] = &["pq", "smpte2084", "smpte st 2084", "smpte-st-2084"];
const BT2020_PRIMARY_MARKERS: &[&str] = &["bt2020", "bt.2020"];

/// Classify a probed file.
pub fn classify(data: &ProbeData) -> HdrClassification {
    if !data.readable {
        return HdrClassification::unknown();
    }

    for (name, stage) in STAGES {
        if let Some(found) = stage(data) {
            tracing::debug!(stage = name, format = %found.format, "dynamic range detected");
            return found;
        }
    }

    HdrClassification::sdr()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn dolby_vision(data: &ProbeData) -> Option<HdrClassification> {
    let rpu = data.rpu?;
    Some(HdrClassification::dolby_vision(rpu.profile, rpu.el_type))
}

fn hdr10_plus(data: &ProbeData) -> Option<HdrClassification> {
    if hdr10_plus_structured(data) || hdr10_plus_text(data) {
        Some(HdrClassification::hdr10_plus())
    } else {
        None
    }
}

/// HDR10+ from MediaInfo's HDR_Format / HDR_Format_Compatibility fields.
fn hdr10_plus_structured(data: &ProbeData) -> bool {
    let Some(mediainfo) = &data.mediainfo else {
        return false;
    };

    mediainfo.video_tracks().into_iter().any(|track| {
        let format = track.hdr_format.as_deref().unwrap_or_default().to_lowercase();
        let compat = track
            .hdr_format_compatibility
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        let named = contains_any(&format, &["hdr10+", "hdr10plus"])
            || contains_any(&compat, &["hdr10+", "hdr10plus"]);
        // ST 2094 must never be confused with ST 2084 (plain PQ).
        let st2094 = contains_any(&format, ST2094_FORMAT_MARKERS) && !format.contains("2084");
        let compat_profile = contains_any(&compat, HDR10_PLUS_COMPAT_MARKERS);

        named || st2094 || compat_profile
    })
}

/// HDR10+ from a plain-text scan of the raw ffprobe video stream.
fn hdr10_plus_text(data: &ProbeData) -> bool {
    data.ffprobe
        .as_ref()
        .and_then(|f| f.video_stream_text.as_deref())
        .map(|text| contains_any(&text.to_lowercase(), HDR10_PLUS_TEXT_MARKERS))
        .unwrap_or(false)
}

/// HLG or HDR10 from the transfer characteristics and colour primaries.
fn static_hdr(data: &ProbeData) -> Option<HdrClassification> {
    let video = data.ffprobe.as_ref()?.video_stream()?;
    let transfer = video.color_transfer.as_deref().unwrap_or_default().to_lowercase();
    let primaries = video.color_primaries.as_deref().unwrap_or_default().to_lowercase();

    if contains_any(&transfer, HLG_TRANSFER_MARKERS) {
        Some(HdrClassification::hlg())
    } else if contains_any(&transfer, PQ_TRANSFER_MARKERS)
        || contains_any(&primaries, BT2020_PRIMARY_MARKERS)
    {
        Some(HdrClassification::hdr10())
    } else {
        None
    }
}
