//! Pipeline runs against stand-in analysis tools.
//!
//! Each tool is a small shell script that prints canned output, so the whole
//! probe -> classify -> resolve path runs without real media. Tests are serial
//! so no other test forks while a freshly written script is still open.

#![cfg(unix)]

mod common;

use std::path::Path;
use std::time::Duration;

use common::{script, stub_tool, TestLibrary};
use hdrscan_av::ToolRegistry;
use hdrscan_common::{EnhancementLayer, HdrFormat};
use serial_test::serial;

const BUDGET: Duration = Duration::from_secs(10);

const FFPROBE_HDR10: &str = r#"{
  "format": {"duration": "5400.0", "bit_rate": "48000000"},
  "streams": [
    {"index": 0, "codec_type": "video", "codec_name": "hevc", "width": 3840, "height": 2160,
     "color_transfer": "smpte2084", "color_primaries": "bt2020",
     "tags": {"BPS": "40000000"}},
    {"index": 1, "codec_type": "audio", "codec_name": "eac3", "channels": 6,
     "tags": {"language": "eng", "BPS": "768000"}}
  ]
}"#;

const MEDIAINFO_HDR10_PLUS: &str = r#"{
  "media": {"track": [
    {"@type": "General", "Format": "Matroska"},
    {"@type": "Video", "Format": "HEVC",
     "HDR_Format": "SMPTE ST 2094 App 4",
     "HDR_Format_Compatibility": "HDR10+ Profile B / HDR10"},
    {"@type": "Audio", "Format": "E-AC-3", "Format_Commercial_IfAny": "Dolby Digital Plus with Dolby Atmos",
     "Channels": "6", "Language": "en"}
  ]}
}"#;

fn tools_dir(lib: &TestLibrary) -> std::path::PathBuf {
    let dir = lib.dir.path().join("bin");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn register(tools: &mut ToolRegistry, name: &str, path: &Path) {
    tools.insert(name, path.to_path_buf(), BUDGET);
}

#[tokio::test]
#[serial]
async fn hdr10_plus_with_atmos_audio() {
    let lib = TestLibrary::new();
    let bin = tools_dir(&lib);
    let mut tools = ToolRegistry::default();
    register(&mut tools, "ffprobe", &stub_tool(&bin, "ffprobe", FFPROBE_HDR10));
    register(&mut tools, "mediainfo", &stub_tool(&bin, "mediainfo", MEDIAINFO_HDR10_PLUS));

    let file = lib.add_file("Film (2023).mkv");
    let record = lib.resolver_with_tools(tools).resolve(&file).await.unwrap().into_record();

    assert_eq!(record.hdr_format, HdrFormat::Hdr10Plus);
    assert_eq!(record.resolution, "4K (UHD)");
    assert_eq!(record.audio_codec, "Dolby Digital Plus 5.1 (Atmos)");
    assert_eq!(record.video_bitrate_kbps, Some(40000));
    assert_eq!(record.audio_bitrate_kbps, Some(768));
    assert_eq!(record.duration_secs, Some(5400.0));
    assert!(record.dv_profile.is_none());
}

#[tokio::test]
#[serial]
async fn ffprobe_alone_gives_hdr10() {
    let lib = TestLibrary::new();
    let bin = tools_dir(&lib);
    let mut tools = ToolRegistry::default();
    register(&mut tools, "ffprobe", &stub_tool(&bin, "ffprobe", FFPROBE_HDR10));

    let file = lib.add_file("Film.mkv");
    let record = lib.resolver_with_tools(tools).resolve(&file).await.unwrap().into_record();

    assert_eq!(record.hdr_format, HdrFormat::Hdr10);
    assert_eq!(record.audio_codec, "Dolby Digital Plus 5.1");
}

#[tokio::test]
#[serial]
async fn dolby_vision_from_rpu() {
    let lib = TestLibrary::new();
    let bin = tools_dir(&lib);
    let mut tools = ToolRegistry::default();
    register(&mut tools, "ffprobe", &stub_tool(&bin, "ffprobe", FFPROBE_HDR10));
    register(&mut tools, "ffmpeg", &script(&bin, "ffmpeg", "#!/bin/sh\nexit 0\n"));
    register(
        &mut tools,
        "dovi_tool",
        &script(
            &bin,
            "dovi_tool",
            "#!/bin/sh\ncase \"$1\" in\n  extract-rpu) printf 'rpu' > \"$5\" ;;\n  info) printf 'Parsing RPU file...\\n{\"dovi_profile\": 7, \"el_type\": \"FEL\"}\\n' ;;\nesac\n",
        ),
    );

    let file = lib.add_file("Film.mkv");
    let record = lib.resolver_with_tools(tools).resolve(&file).await.unwrap().into_record();

    assert_eq!(record.hdr_format, HdrFormat::DolbyVision);
    assert_eq!(record.hdr_detail, "DV Profile 7");
    assert_eq!(record.dv_profile, Some(7));
    assert_eq!(record.el_type, Some(EnhancementLayer::Fel));

    // Scratch directories are gone once the probe returns.
    let leftovers = std::fs::read_dir(lib.scratch())
        .map(|d| d.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
#[serial]
async fn failing_tool_degrades_to_remaining_sources() {
    let lib = TestLibrary::new();
    let bin = tools_dir(&lib);
    let mut tools = ToolRegistry::default();
    register(&mut tools, "ffprobe", &script(&bin, "ffprobe", "#!/bin/sh\necho boom >&2\nexit 1\n"));
    register(&mut tools, "mediainfo", &stub_tool(&bin, "mediainfo", MEDIAINFO_HDR10_PLUS));

    let file = lib.add_file("Film.mkv");
    let record = lib.resolver_with_tools(tools).resolve(&file).await.unwrap().into_record();

    assert_eq!(record.hdr_format, HdrFormat::Hdr10Plus);
    assert_eq!(record.resolution, "Unknown");
    assert_eq!(record.audio_codec, "Dolby Digital Plus 5.1 (Atmos)");
}

#[tokio::test]
#[serial]
async fn garbage_output_is_treated_as_absent() {
    let lib = TestLibrary::new();
    let bin = tools_dir(&lib);
    let mut tools = ToolRegistry::default();
    register(&mut tools, "ffprobe", &stub_tool(&bin, "ffprobe", "not json at all"));

    let file = lib.add_file("Film.mkv");
    let record = lib.resolver_with_tools(tools).resolve(&file).await.unwrap().into_record();

    assert_eq!(record.hdr_format, HdrFormat::Sdr);
    assert_eq!(record.resolution, "Unknown");
}

#[tokio::test]
#[serial]
async fn hung_tool_is_killed_at_its_deadline() {
    let lib = TestLibrary::new();
    let bin = tools_dir(&lib);
    let mut tools = ToolRegistry::default();
    tools.insert(
        "ffprobe",
        script(&bin, "ffprobe", "#!/bin/sh\nexec sleep 30\n"),
        Duration::from_millis(200),
    );

    let file = lib.add_file("Film.mkv");
    let started = std::time::Instant::now();
    let record = lib.resolver_with_tools(tools).resolve(&file).await.unwrap().into_record();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(record.hdr_format, HdrFormat::Sdr);
}
