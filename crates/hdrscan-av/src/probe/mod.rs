//! Media probing through external analysis tools.
//!
//! [`Prober::probe`] runs every backend against a file and collects whatever
//! each one could provide into a [`ProbeData`]. A backend that is missing,
//! times out, fails or prints garbage simply leaves its slot empty; the
//! classification and resolution stages fall back accordingly.

pub mod dovi;
pub mod ffprobe;
pub mod mediainfo;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use dovi::RpuSummary;
pub use ffprobe::{FfprobeReport, FfprobeStream};
pub use mediainfo::{MediaInfoReport, MediaInfoTrack};

use crate::tools::ToolRegistry;
use crate::Error;

/// Everything the probe backends learned about one file.
#[derive(Debug, Clone, Default)]
pub struct ProbeData {
    /// Whether the file could be opened at all.
    pub readable: bool,
    pub ffprobe: Option<FfprobeReport>,
    pub mediainfo: Option<MediaInfoReport>,
    pub rpu: Option<RpuSummary>,
}

/// Runs the probe backends with a shared tool registry.
#[derive(Debug, Clone)]
pub struct Prober {
    tools: Arc<ToolRegistry>,
    scratch_root: PathBuf,
}

impl Prober {
    /// `scratch_root` hosts the per-run directories for RPU extraction.
    pub fn new(tools: Arc<ToolRegistry>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            scratch_root: scratch_root.into(),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Probe a file with every backend concurrently.
    pub async fn probe(&self, path: &Path) -> ProbeData {
        if let Err(e) = tokio::fs::File::open(path).await {
            tracing::warn!(path = %path.display(), "file is not readable: {e}");
            return ProbeData::default();
        }

        let (ffprobe, mediainfo, rpu) = tokio::join!(
            ffprobe::probe(&self.tools, path),
            mediainfo::probe(&self.tools, path),
            dovi::rpu_summary(&self.tools, path, &self.scratch_root),
        );

        ProbeData {
            readable: true,
            ffprobe: settle("ffprobe", path, ffprobe),
            mediainfo: settle("mediainfo", path, mediainfo),
            rpu: settle("dovi", path, rpu).flatten(),
        }
    }
}

/// Downgrade a backend failure to "no data", logging at a level matching how
/// surprising the failure is.
fn settle<T>(stage: &str, path: &Path, result: crate::Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e @ (Error::ToolUnavailable { .. } | Error::ToolFailed { .. })) => {
            tracing::debug!(stage, path = %path.display(), "{e}");
            None
        }
        Err(e) => {
            tracing::warn!(stage, path = %path.display(), "{e}");
            None
        }
    }
}
