//! Dolby Vision RPU extraction and analysis.
//!
//! The first second of the primary video stream is copied out as a raw HEVC
//! elementary stream, `dovi_tool extract-rpu` pulls the RPU payload from it,
//! and `dovi_tool info -f 0` reports the profile of the first frame.

use std::path::Path;

use hdrscan_common::EnhancementLayer;
use serde::Deserialize;

use crate::tools::{ToolRegistry, DOVI_TOOL, FFMPEG};
use crate::workspace::Workspace;
use crate::Result;

/// Profile information read from the first RPU frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpuSummary {
    pub profile: u8,
    pub el_type: Option<EnhancementLayer>,
}

#[derive(Debug, Deserialize)]
struct DoviFrameInfo {
    dovi_profile: Option<u8>,
    #[serde(default)]
    el_type: Option<String>,
}

/// Parse `dovi_tool info -f 0` output: a summary line followed by a JSON
/// document describing the frame.
pub fn parse_info(output: &str) -> Option<RpuSummary> {
    let (_summary, json) = output.trim().split_once('\n')?;
    let info: DoviFrameInfo = match serde_json::from_str(json.trim()) {
        Ok(info) => info,
        Err(e) => {
            tracing::debug!("dovi_tool info output is not JSON: {e}");
            return None;
        }
    };

    Some(RpuSummary {
        profile: info.dovi_profile?,
        el_type: info.el_type.as_deref().and_then(EnhancementLayer::parse),
    })
}

/// Extract and analyze the RPU of `path` inside a fresh scratch directory
/// under `scratch_root`.
///
/// `Ok(None)` means the stream carries no readable RPU. Tool failures,
/// timeouts and missing tools are returned as errors; the scratch directory
/// is removed on every path out of this function.
pub async fn rpu_summary(
    tools: &ToolRegistry,
    path: &Path,
    scratch_root: &Path,
) -> Result<Option<RpuSummary>> {
    // Fail fast before spending an ffmpeg run when dovi_tool is missing.
    tools.require(DOVI_TOOL)?;

    let workspace = Workspace::new_in(scratch_root)?;
    let sample = workspace.temp_file("sample.hevc");
    let rpu = workspace.temp_file("RPU.bin");

    tools
        .command(FFMPEG)?
        .args(["-v", "error", "-nostdin", "-y", "-i"])
        .arg(path)
        .args(["-map", "0:v:0", "-c:v", "copy", "-to", "1", "-f", "hevc"])
        .arg(&sample)
        .execute()
        .await?;

    tools
        .command(DOVI_TOOL)?
        .args(["extract-rpu", "-i"])
        .arg(&sample)
        .arg("-o")
        .arg(&rpu)
        .execute()
        .await?;

    match tokio::fs::metadata(&rpu).await {
        Ok(meta) if meta.len() > 0 => {}
        Ok(_) => {
            tracing::debug!(path = %path.display(), "empty RPU payload");
            return Ok(None);
        }
        Err(_) => {
            tracing::debug!(path = %path.display(), "no RPU payload produced");
            return Ok(None);
        }
    }

    let info = tools
        .command(DOVI_TOOL)?
        .args(["info", "-i"])
        .arg(&rpu)
        .args(["-f", "0"])
        .execute()
        .await?;

    Ok(parse_info(&info.stdout))
}
