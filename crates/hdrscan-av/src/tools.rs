//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the locations of the analysis
//! tools (ffprobe, mediainfo, ffmpeg, dovi_tool) together with the time budget
//! each invocation is allowed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::ToolCommand;
use crate::{Error, Result};

pub const FFPROBE: &str = "ffprobe";
pub const MEDIAINFO: &str = "mediainfo";
pub const FFMPEG: &str = "ffmpeg";
pub const DOVI_TOOL: &str = "dovi_tool";

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &[FFPROBE, MEDIAINFO, FFMPEG, DOVI_TOOL];

/// Tool paths and time budgets, usually the `[tools]` section of the config.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default)]
    pub mediainfo_path: Option<PathBuf>,

    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub dovi_tool_path: Option<PathBuf>,

    #[serde(default = "default_ffprobe_timeout")]
    pub ffprobe_timeout_secs: u64,

    #[serde(default = "default_mediainfo_timeout")]
    pub mediainfo_timeout_secs: u64,

    /// Budget for the sample extraction and RPU analysis steps.
    #[serde(default = "default_extract_timeout")]
    pub extract_timeout_secs: u64,
}

fn default_ffprobe_timeout() -> u64 {
    15
}

fn default_mediainfo_timeout() -> u64 {
    10
}

fn default_extract_timeout() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: None,
            mediainfo_path: None,
            ffmpeg_path: None,
            dovi_tool_path: None,
            ffprobe_timeout_secs: default_ffprobe_timeout(),
            mediainfo_timeout_secs: default_mediainfo_timeout(),
            extract_timeout_secs: default_extract_timeout(),
        }
    }
}

impl ToolsConfig {
    fn custom_path(&self, name: &str) -> Option<&Path> {
        match name {
            FFPROBE => self.ffprobe_path.as_deref(),
            MEDIAINFO => self.mediainfo_path.as_deref(),
            FFMPEG => self.ffmpeg_path.as_deref(),
            DOVI_TOOL => self.dovi_tool_path.as_deref(),
            _ => None,
        }
    }

    fn timeout_for(&self, name: &str) -> Duration {
        let secs = match name {
            FFPROBE => self.ffprobe_timeout_secs,
            MEDIAINFO => self.mediainfo_timeout_secs,
            _ => self.extract_timeout_secs,
        };
        Duration::from_secs(secs)
    }
}

/// A resolved external tool.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Tool name (e.g. "ffprobe").
    pub name: String,
    /// Resolved path to the executable.
    pub path: PathBuf,
    /// Maximum execution time before the tool is killed.
    pub timeout: Duration,
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of version output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool configurations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolConfig>,
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides from config).
    ///
    /// A configured path is used when it exists; otherwise [`which::which`]
    /// locates the tool. Tools that are not found are omitted, and every
    /// later lookup for them reports [`Error::ToolUnavailable`].
    pub fn discover(config: &ToolsConfig) -> Self {
        let mut registry = Self::default();

        for &name in KNOWN_TOOLS {
            let resolved = match config.custom_path(name) {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(tool = name, path = %p.display(), "configured tool path does not exist, searching PATH");
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            match resolved {
                Some(path) => {
                    tracing::debug!(tool = name, path = %path.display(), "tool discovered");
                    registry.insert(name, path, config.timeout_for(name));
                }
                None => tracing::debug!(tool = name, "tool not found"),
            }
        }

        registry
    }

    /// Register (or replace) a tool explicitly.
    pub fn insert(&mut self, name: &str, path: PathBuf, timeout: Duration) {
        self.tools.insert(
            name.to_string(),
            ToolConfig {
                name: name.to_string(),
                path,
                timeout,
            },
        );
    }

    /// Return the [`ToolConfig`] for the given tool, or
    /// [`Error::ToolUnavailable`] if it was not found during discovery.
    pub fn require(&self, name: &str) -> Result<&ToolConfig> {
        self.tools
            .get(name)
            .ok_or_else(|| Error::tool_unavailable(name))
    }

    /// A [`ToolCommand`] for the tool with its configured timeout applied.
    pub fn command(&self, name: &str) -> Result<ToolCommand> {
        let tool = self.require(name)?;
        let mut cmd = ToolCommand::new(tool.path.clone());
        cmd.timeout(tool.timeout);
        Ok(cmd)
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(cfg) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(name, &cfg.path),
                    path: Some(cfg.path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run the tool's version flag and return the first line of stdout.
fn detect_version(name: &str, path: &Path) -> Option<String> {
    let version_arg = match name {
        FFMPEG | FFPROBE => "-version",
        _ => "--version",
    };

    let output = std::process::Command::new(path)
        .arg(version_arg)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
