//! Language-preference track selection.
//!
//! Bitrate lookup and codec naming both look at a single audio track chosen
//! the same way. Tracks are grouped into tiers: the content language, then
//! English, then all tracks. The first non-empty tier wins, and within it the
//! best track is taken by codec quality, then channel count. Equal tracks
//! keep container order.

use hdrscan_common::language::{self, FALLBACK_LANGUAGE};

use crate::probe::{FfprobeStream, MediaInfoTrack};

/// An audio track that can be ranked for selection.
pub trait AudioTrack {
    fn language(&self) -> Option<&str>;

    /// Codec quality; higher is better, unknown codecs score 0.
    fn quality_score(&self) -> u32;

    /// Channel count, 0 when absent.
    fn channel_count(&self) -> u32;
}

impl AudioTrack for FfprobeStream {
    fn language(&self) -> Option<&str> {
        self.tags.language.as_deref()
    }

    fn quality_score(&self) -> u32 {
        let codec = self.codec_name.as_deref().unwrap_or_default().to_lowercase();
        let profile = self.profile.as_deref().unwrap_or_default().to_lowercase();
        let title = self.tags.title.as_deref().unwrap_or_default().to_lowercase();
        let atmos = title.contains("atmos") || profile.contains("atmos");

        match codec.as_str() {
            "truehd" if atmos => 1000,
            "truehd" => 700,
            "eac3" if atmos => 900,
            "eac3" => 400,
            "ac3" if atmos => 800,
            "ac3" => 300,
            "dts" | "dca" => {
                if ["dts:x", "dtsx", "dts-x"].iter().any(|m| title.contains(m)) {
                    950
                } else if profile.contains("ma")
                    || title.contains("dts-hd ma")
                    || title.contains("dts-hd master audio")
                {
                    700
                } else if profile.contains("hra")
                    || title.contains("dts-hd hra")
                    || title.contains("dts-hd high resolution")
                {
                    600
                } else if profile.contains("hd") || title.contains("dts-hd") {
                    550
                } else {
                    500
                }
            }
            "flac" => 650,
            pcm if pcm.starts_with("pcm") => 650,
            "aac" => 250,
            "opus" => 200,
            "vorbis" => 150,
            "mp3" => 100,
            _ => 0,
        }
    }

    fn channel_count(&self) -> u32 {
        self.channels.unwrap_or(0)
    }
}

impl AudioTrack for MediaInfoTrack {
    fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    fn quality_score(&self) -> u32 {
        let upper = |field: &Option<String>| field.as_deref().unwrap_or_default().to_uppercase();
        let commercial = upper(&self.format_commercial);
        let format = upper(&self.format);
        let additional = upper(&self.format_additional);
        let title = upper(&self.title);

        if commercial.contains("ATMOS") {
            return if format.contains("TRUEHD") || commercial.contains("TRUEHD") || format.contains("MLP FBA") {
                1000
            } else if format.contains("E-AC-3") || commercial.contains("E-AC-3") {
                900
            } else if format.contains("AC-3") {
                800
            } else {
                950
            };
        }

        let dts_x = commercial.contains("DTS:X")
            || commercial.contains("DTS-X")
            || format.contains("XLL X")
            || additional.contains("DTS:X")
            || title.contains("DTS:X")
            || title.contains("DTS-X");
        if dts_x {
            return 950;
        }

        if format.contains("DTS XLL") || commercial.contains("DTS-HD MASTER AUDIO") {
            700
        } else if format.contains("TRUEHD") || format.contains("MLP FBA") {
            700
        } else if format == "FLAC" || format == "PCM" {
            650
        } else if format.contains("DTS XBR") || commercial.contains("DTS-HD HIGH RESOLUTION") {
            600
        } else if commercial.contains("DTS-HD") {
            550
        } else if format == "DTS" {
            500
        } else if format.contains("E-AC-3") || commercial.contains("E-AC-3") {
            400
        } else if format == "AC-3" {
            300
        } else if format == "AAC" {
            250
        } else if format == "OPUS" {
            200
        } else if format == "VORBIS" {
            150
        } else if format.contains("MPEG AUDIO") {
            100
        } else {
            0
        }
    }

    fn channel_count(&self) -> u32 {
        self.channels.as_deref().and_then(parse_channels).unwrap_or(0)
    }
}

/// MediaInfo sometimes reports `"8 / 6"` style values; the first figure wins.
pub(crate) fn parse_channels(raw: &str) -> Option<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())
        .and_then(|n| n.parse().ok())
}

/// Highest (score, channels) in `tier`; the earliest track wins a tie.
fn best<'a, T: AudioTrack>(tier: impl Iterator<Item = &'a T>) -> Option<&'a T> {
    tier.map(|t| ((t.quality_score(), t.channel_count()), t))
        .reduce(|best, next| if next.0 > best.0 { next } else { best })
        .map(|(_, t)| t)
}

/// Pick one track from `tracks` (in container order) for `content_language`.
pub fn select<'a, T: AudioTrack>(tracks: &[&'a T], content_language: &str) -> Option<&'a T> {
    let in_language = |code: &str| {
        best(
            tracks
                .iter()
                .copied()
                .filter(|t| t.language().is_some_and(|tag| language::matches(code, tag))),
        )
    };

    in_language(content_language)
        .or_else(|| in_language(FALLBACK_LANGUAGE))
        .or_else(|| best(tracks.iter().copied()))
}
