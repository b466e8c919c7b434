//! Assembly of a [`MediaRecord`] from probe output and enrichment.

use std::path::PathBuf;

use hdrscan_av::{bitrate, classify, codec, ProbeData};

use crate::metadata::Enrichment;
use crate::state::MediaRecord;

/// Settings the technical stages need.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub content_language: String,
    pub audio_bitrate_estimate_ratio: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            content_language: "en".to_string(),
            audio_bitrate_estimate_ratio: 0.1,
        }
    }
}

/// Technical half of a record: classification, resolution, codec, bitrates.
pub fn technical_record(
    path: PathBuf,
    file_size: u64,
    data: &ProbeData,
    settings: &AnalysisSettings,
) -> MediaRecord {
    let mut record = MediaRecord::new(path, classify::classify(data));

    if let Some(ffprobe) = &data.ffprobe {
        record.resolution = ffprobe.resolution_label();
        record.duration_secs = ffprobe.duration_secs();
    }
    record.audio_codec = codec::canonical_audio_codec(data, &settings.content_language);
    record.video_bitrate_kbps = bitrate::video_bitrate_kbps(data);
    record.audio_bitrate_kbps = bitrate::audio_bitrate_kbps(
        data,
        &settings.content_language,
        settings.audio_bitrate_estimate_ratio,
    );
    record.file_size = file_size;

    record
}

/// Merge enrichment results into a record.
pub fn apply_enrichment(record: &mut MediaRecord, enrichment: Enrichment) {
    record.external_id = enrichment.external_id;
    record.artwork = enrichment.artwork;
    record.title = enrichment.details.title;
    record.year = enrichment.details.year;
    record.rating = enrichment.details.rating;
    record.plot = enrichment.details.plot;
    record.directors = enrichment.credits.directors;
    record.cast = enrichment.credits.cast;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Credits, TitleDetails};
    use crate::state::ArtworkRef;
    use hdrscan_av::probe::{FfprobeReport, MediaInfoReport};
    use hdrscan_common::HdrFormat;
    use serde_json::json;

    fn sample() -> ProbeData {
        let ffprobe = json!({
            "format": {"duration": "7263.5", "bit_rate": "60000000"},
            "streams": [
                {"codec_type": "video", "width": 3840, "height": 2160,
                 "color_transfer": "smpte2084", "color_primaries": "bt2020",
                 "tags": {"BPS": "55300000"}},
                {"codec_type": "audio", "codec_name": "truehd", "channels": 8,
                 "tags": {"language": "eng", "BPS": "4100000"}}
            ]
        });
        let mediainfo = json!({"media": {"track": [
            {"@type": "Audio", "Format": "MLP FBA", "Format_Commercial_IfAny": "Dolby TrueHD with Dolby Atmos",
             "Channels": "8", "Language": "en"}
        ]}});

        ProbeData {
            readable: true,
            ffprobe: Some(FfprobeReport::parse(&ffprobe.to_string()).unwrap()),
            mediainfo: Some(MediaInfoReport::parse(&mediainfo.to_string()).unwrap()),
            rpu: None,
        }
    }

    #[test]
    fn technical_fields() {
        let record = technical_record(
            PathBuf::from("/media/Film.mkv"),
            42,
            &sample(),
            &AnalysisSettings::default(),
        );

        assert_eq!(record.hdr_format, HdrFormat::Hdr10);
        assert_eq!(record.resolution, "4K (UHD)");
        assert_eq!(record.audio_codec, "Dolby TrueHD 7.1 (Atmos)");
        assert_eq!(record.duration_secs, Some(7263.5));
        assert_eq!(record.video_bitrate_kbps, Some(55300));
        assert_eq!(record.audio_bitrate_kbps, Some(4100));
        assert_eq!(record.file_size, 42);
    }

    #[test]
    fn unreadable_file_gives_unknown_record() {
        let record = technical_record(
            PathBuf::from("/media/Broken.mkv"),
            0,
            &ProbeData::default(),
            &AnalysisSettings::default(),
        );
        assert_eq!(record.hdr_format, HdrFormat::Unknown);
        assert_eq!(record.hdr_detail, "Error");
        assert_eq!(record.resolution, "Unknown");
        assert_eq!(record.audio_codec, "Unknown");
        assert_eq!(record.video_bitrate_kbps, None);
    }

    #[test]
    fn enrichment_fills_metadata() {
        let mut record = MediaRecord::new(PathBuf::from("/m/a.mkv"), hdrscan_common::HdrClassification::sdr());
        apply_enrichment(
            &mut record,
            Enrichment {
                external_id: Some("603".into()),
                artwork: Some(ArtworkRef::Cached {
                    key: "tmdb_603.jpg".into(),
                }),
                details: TitleDetails {
                    title: Some("The Matrix".into()),
                    year: Some(1999),
                    rating: Some(8.2),
                    plot: None,
                },
                credits: Credits {
                    directors: vec!["Lana Wachowski".into()],
                    cast: vec!["Keanu Reeves".into()],
                },
            },
        );

        assert_eq!(record.external_id.as_deref(), Some("603"));
        assert_eq!(record.artwork_href().as_deref(), Some("/poster/tmdb_603.jpg"));
        assert_eq!(record.title.as_deref(), Some("The Matrix"));
        assert_eq!(record.directors, ["Lana Wachowski"]);
    }
}
