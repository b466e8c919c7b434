//! Bitrate resolution.
//!
//! Each container family reports bitrate somewhere different, so lookup is a
//! fixed fallback chain. A stage runs only when every earlier stage produced
//! nothing, and a value that fails to parse counts as nothing.
//!
//! 1. the Matroska `BPS` statistics tag of the selected stream
//! 2. the stream's declared `bit_rate`
//! 3. the container bitrate (scaled by an estimate ratio for audio)
//! 4. MediaInfo `BitRate`, then its human-readable `BitRate_String`

use std::sync::LazyLock;

use regex::Regex;

use crate::probe::{FfprobeStream, MediaInfoTrack, ProbeData};
use crate::tracks;

static BITRATE_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d.]+)(Mb|Gb|Kb|b)/s").expect("bitrate pattern is valid")
});

/// Parse a human-readable bitrate such as `"55.3 Mb/s"` or `"9 039 kb/s"`
/// into whole kbit/s. Spaces are ignored; anything unrecognised is `None`.
///
/// ```
/// use hdrscan_av::bitrate::parse_bitrate_string;
///
/// assert_eq!(parse_bitrate_string("55.3 Mb/s"), Some(55300));
/// assert_eq!(parse_bitrate_string("9 039 kb/s"), Some(9039));
/// assert_eq!(parse_bitrate_string("1.5 Gb/s"), Some(1_500_000));
/// assert_eq!(parse_bitrate_string("fast"), None);
/// ```
pub fn parse_bitrate_string(s: &str) -> Option<u64> {
    let compact: String = s.chars().filter(|c| *c != ' ').collect();
    let caps = BITRATE_STRING.captures(&compact)?;
    let value: f64 = caps[1].parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let kbps = match caps[2].to_ascii_lowercase().as_str() {
        "gb" => value * 1_000_000.0,
        "mb" => value * 1_000.0,
        "kb" => value,
        _ => value / 1_000.0,
    };
    Some(kbps as u64)
}

/// Convert a bit/s field to kbit/s by integer division.
fn bits_to_kbps(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let bits = raw
        .parse::<u64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64))?;
    Some(bits / 1000)
}

fn from_stream(stream: &FfprobeStream) -> Option<u64> {
    stream
        .tags
        .bps
        .as_deref()
        .and_then(bits_to_kbps)
        .or_else(|| stream.bit_rate.as_deref().and_then(bits_to_kbps))
}

fn from_mediainfo(track: &MediaInfoTrack) -> Option<u64> {
    track.bit_rate.as_deref().and_then(bits_to_kbps).or_else(|| {
        track
            .bit_rate_string
            .as_deref()
            .and_then(parse_bitrate_string)
            .filter(|kbps| *kbps > 0)
    })
}

/// Video bitrate in kbit/s for the first video stream.
pub fn video_bitrate_kbps(data: &ProbeData) -> Option<u64> {
    let ffprobe = data.ffprobe.as_ref();

    ffprobe
        .and_then(|f| f.video_stream())
        .and_then(from_stream)
        .or_else(|| {
            ffprobe
                .and_then(|f| f.format.bit_rate.as_deref())
                .and_then(bits_to_kbps)
        })
        .or_else(|| {
            data.mediainfo
                .as_ref()?
                .video_tracks()
                .into_iter()
                .find_map(from_mediainfo)
        })
}

/// Audio bitrate in kbit/s for the language-selected audio track.
///
/// The container bitrate covers every stream, so for audio it is only a
/// rough estimate: `estimate_ratio` of the total, kept only when non-zero.
pub fn audio_bitrate_kbps(data: &ProbeData, content_language: &str, estimate_ratio: f64) -> Option<u64> {
    let ffprobe = data.ffprobe.as_ref();

    ffprobe
        .and_then(|f| tracks::select(&f.audio_streams(), content_language))
        .and_then(from_stream)
        .or_else(|| {
            let total = ffprobe?.format.bit_rate.as_deref()?.trim().parse::<f64>().ok()?;
            let estimate = (total * estimate_ratio / 1000.0) as u64;
            (estimate > 0).then_some(estimate)
        })
        .or_else(|| {
            let mediainfo = data.mediainfo.as_ref()?;
            tracks::select(&mediainfo.audio_tracks(), content_language).and_then(from_mediainfo)
        })
}
