//! # hdrscan-av
//!
//! Probe adapters and technical metadata resolution for video files.
//!
//! - **Tool discovery** ([`ToolRegistry`]): find ffprobe, mediainfo, ffmpeg
//!   and dovi_tool and attach a time budget to each
//! - **Command execution** ([`ToolCommand`]): async subprocess builder that
//!   kills and reaps a process at its deadline
//! - **Scratch space** ([`Workspace`]): per-run temp directory removed on drop
//! - **Probing** ([`Prober`]): run every backend and collect a [`ProbeData`]
//! - **Classification** ([`classify::classify`]): ordered dynamic-range
//!   detection cascade
//! - **Bitrates, tracks and codecs** ([`bitrate`], [`tracks`], [`codec`])
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hdrscan_av::{classify, codec, Prober, ToolRegistry, ToolsConfig};
//!
//! # async fn example() {
//! let tools = Arc::new(ToolRegistry::discover(&ToolsConfig::default()));
//! let prober = Prober::new(tools, "/tmp/hdrscan");
//! let data = prober.probe("/media/movie.mkv".as_ref()).await;
//!
//! let hdr = classify::classify(&data);
//! println!("{} / {}", hdr.detail, codec::canonical_audio_codec(&data, "en"));
//! # }
//! ```

mod error;
pub mod bitrate;
pub mod classify;
pub mod codec;
pub mod command;
pub mod probe;
pub mod tools;
pub mod tracks;
pub mod workspace;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use probe::{ProbeData, Prober};
pub use tools::{ToolInfo, ToolRegistry, ToolsConfig};
pub use workspace::Workspace;
