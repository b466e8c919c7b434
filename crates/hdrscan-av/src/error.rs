//! Error types for hdrscan-av.

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while probing media.
///
/// None of these are fatal to a scan: callers degrade every variant to
/// "no data" for the affected field and continue down their fallback chain.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The external tool is not installed or could not be spawned.
    #[error("tool not available: {tool}")]
    ToolUnavailable { tool: String },

    /// The tool ran past its deadline and was killed.
    #[error("{tool} timed out after {}s", timeout.as_secs())]
    ToolTimeout { tool: String, timeout: Duration },

    /// The tool exited with a non-zero status.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// The tool ran but its output could not be interpreted.
    #[error("failed to parse {tool} output: {message}")]
    MalformedOutput { tool: String, message: String },

    /// The specified file was not found.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a tool unavailable error.
    pub fn tool_unavailable(tool: impl Into<String>) -> Self {
        Self::ToolUnavailable { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a malformed output error.
    pub fn malformed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedOutput {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}
