//! Audio codec name canonicalization.
//!
//! Produces a stable display label such as `"Dolby TrueHD 7.1 (Atmos)"` for
//! the language-selected audio track. MediaInfo's commercial names are the
//! primary source; ffprobe's codec/profile/title fields are the fallback.

use crate::probe::{FfprobeStream, MediaInfoTrack, ProbeData};
use crate::tracks::{self, parse_channels};

/// Label used when no audio source yields anything.
pub const UNKNOWN_CODEC: &str = "Unknown";

/// Speaker layout for a channel count (`8` -> `"7.1"`). Counts outside the
/// table render as `"{n}.0"`.
pub fn channel_layout(channels: u32) -> String {
    match channels {
        1 => "1.0".to_string(),
        2 => "2.0".to_string(),
        3 => "2.1".to_string(),
        4 => "3.1".to_string(),
        5 => "4.1".to_string(),
        6 => "5.1".to_string(),
        7 => "6.1".to_string(),
        8 => "7.1".to_string(),
        9 => "8.1".to_string(),
        10 => "9.1".to_string(),
        n => format!("{n}.0"),
    }
}

/// `" 7.1"` style suffix; empty when the count is absent, zero or unparsable.
fn channel_suffix(channels: Option<u32>) -> String {
    match channels {
        Some(n) if n > 0 => format!(" {}", channel_layout(n)),
        _ => String::new(),
    }
}

/// Canonical codec label for a probed file.
pub fn canonical_audio_codec(data: &ProbeData, content_language: &str) -> String {
    if let Some(mediainfo) = &data.mediainfo {
        if let Some(track) = tracks::select(&mediainfo.audio_tracks(), content_language) {
            return from_mediainfo(track);
        }
    }

    if let Some(ffprobe) = &data.ffprobe {
        if let Some(stream) = tracks::select(&ffprobe.audio_streams(), content_language) {
            return from_ffprobe(stream);
        }
    }

    UNKNOWN_CODEC.to_string()
}

/// Label from MediaInfo's format fields.
pub fn from_mediainfo(track: &MediaInfoTrack) -> String {
    let commercial = track.format_commercial.as_deref().unwrap_or_default();
    let format = track.format.as_deref().unwrap_or_default();
    let profile = track.format_profile.as_deref().unwrap_or_default();
    let additional = track.format_additional.as_deref().unwrap_or_default();
    let title = track.title.as_deref().unwrap_or_default();
    let ch = channel_suffix(track.channels.as_deref().and_then(parse_channels));

    if commercial.contains("Atmos") {
        return if format.contains("TrueHD") || commercial.contains("TrueHD") {
            format!("Dolby TrueHD{ch} (Atmos)")
        } else if format.contains("E-AC-3") || commercial.contains("E-AC-3") {
            format!("Dolby Digital Plus{ch} (Atmos)")
        } else if format.contains("AC-3") {
            format!("Dolby Digital{ch} (Atmos)")
        } else {
            format!("Dolby Atmos{ch}")
        };
    }

    // Checked before the DTS-HD MA family: a DTS:X core also reports XLL.
    let dts_x = commercial.contains("DTS:X")
        || commercial.contains("DTS-X")
        || format.contains("DTS XLL X")
        || format.contains("XLL X")
        || additional.contains("DTS:X")
        || title.contains("DTS:X")
        || title.contains("DTS-X");
    if dts_x {
        return if title.to_lowercase().contains("imax") {
            format!("DTS:X (IMAX){ch}")
        } else {
            format!("DTS:X{ch}")
        };
    }

    let family = if format == "MLP FBA" || format.contains("TrueHD") {
        "Dolby TrueHD"
    } else if format == "E-AC-3" || commercial.contains("E-AC-3") {
        "Dolby Digital Plus"
    } else if format == "AC-3" {
        "Dolby Digital"
    } else if format.contains("DTS XLL") || commercial.contains("DTS-HD Master Audio") {
        "DTS-HD MA"
    } else if format.contains("DTS XBR") || commercial.contains("DTS-HD High Resolution") {
        "DTS-HD HRA"
    } else if format == "DTS" {
        if commercial.contains("DTS-HD") {
            "DTS-HD"
        } else {
            "DTS"
        }
    } else if format == "MPEG Audio" {
        if profile.contains("Layer 3") {
            "MP3"
        } else {
            "MPEG Audio"
        }
    } else if matches!(format, "AAC" | "FLAC" | "Opus" | "Vorbis" | "PCM") {
        format
    } else if format.is_empty() {
        UNKNOWN_CODEC
    } else {
        format
    };

    format!("{family}{ch}")
}

/// Label from ffprobe's codec name, profile and title heuristics.
pub fn from_ffprobe(stream: &FfprobeStream) -> String {
    let ch = channel_suffix(stream.channels);
    let Some(codec) = stream.codec_name.as_deref() else {
        return format!("{UNKNOWN_CODEC}{ch}");
    };
    let profile = stream.profile.as_deref().unwrap_or_default().to_lowercase();
    let title = stream.tags.title.as_deref().unwrap_or_default().to_lowercase();

    let atmos = title.contains("atmos") || profile.contains("atmos");
    let imax = title.contains("imax");

    match codec {
        "ac3" => format!("Dolby Digital{ch}"),
        "eac3" if atmos => format!("Dolby Digital Plus (Atmos){ch}"),
        "eac3" => format!("Dolby Digital Plus{ch}"),
        "truehd" if atmos => format!("Dolby TrueHD (Atmos){ch}"),
        "truehd" => format!("Dolby TrueHD{ch}"),
        "dts" | "dca" => {
            let family = if ["dts:x", "dtsx", "dts-x"].iter().any(|m| title.contains(m)) {
                if imax {
                    "DTS:X (IMAX)"
                } else {
                    "DTS:X"
                }
            } else if profile.contains("ma")
                || title.contains("dts-hd ma")
                || title.contains("dts-hd master audio")
            {
                "DTS-HD MA"
            } else if profile.contains("hra")
                || title.contains("dts-hd hra")
                || title.contains("dts-hd high resolution")
            {
                "DTS-HD HRA"
            } else if profile.contains("hd") || title.contains("dts-hd") {
                "DTS-HD"
            } else {
                "DTS"
            };
            format!("{family}{ch}")
        }
        "aac" => format!("AAC{ch}"),
        "flac" => format!("FLAC{ch}"),
        "mp3" => format!("MP3{ch}"),
        "opus" => format!("Opus{ch}"),
        "vorbis" => format!("Vorbis{ch}"),
        pcm if pcm.starts_with("pcm") => format!("PCM{ch}"),
        other => format!("{}{ch}", other.to_uppercase()),
    }
}
