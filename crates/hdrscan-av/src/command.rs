//! Builder for executing external tool commands with timeout support.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::{Error, Result};

/// Default command timeout when a tool has no configured budget.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use hdrscan_av::ToolCommand;
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// # async fn example() -> hdrscan_av::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("mediainfo"))
///     .arg("--Output=JSON")
///     .arg("/path/to/video.mkv")
///     .timeout(Duration::from_secs(10))
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Duration,
    stdin_data: Option<Vec<u8>>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            stdin_data: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(s.as_ref().to_os_string());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(iter.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Provide data to be written to the process's stdin.
    pub fn stdin(&mut self, data: Vec<u8>) -> &mut Self {
        self.stdin_data = Some(data);
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// A process still running when the timeout elapses is killed and reaped
    /// before this returns.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolUnavailable`] if the executable does not exist.
    /// - [`Error::ToolTimeout`] if the process outlives its timeout.
    /// - [`Error::ToolFailed`] if the process exits with a non-zero status
    ///   (message includes stderr) or cannot be spawned.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if self.stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_unavailable(&program_name)
            } else {
                Error::tool_failed(&program_name, format!("failed to spawn: {e}"))
            }
        })?;

        let stdin_pipe = child.stdin.take();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdin_data = self.stdin_data.clone();

        let run = async {
            let feed = async move {
                if let (Some(mut pipe), Some(data)) = (stdin_pipe, stdin_data) {
                    // The child may exit without draining stdin.
                    let _ = pipe.write_all(&data).await;
                }
            };
            let ((), stdout, stderr) =
                tokio::join!(feed, read_pipe(stdout_pipe), read_pipe(stderr_pipe));
            let status = child.wait().await;
            (status, stdout, stderr)
        };

        let outcome = tokio::time::timeout(self.timeout, run).await;

        let (status, stdout, stderr) = match outcome {
            Ok(result) => result,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(tool = %program_name, "failed to kill timed out process: {e}");
                }
                return Err(Error::ToolTimeout {
                    tool: program_name,
                    timeout: self.timeout,
                });
            }
        };

        let status = status?;
        let output = ToolOutput {
            status,
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        };

        if !status.success() {
            return Err(Error::tool_failed(
                program_name,
                format!("exited with status {}: {}", status, output.stderr.trim()),
            ));
        }

        Ok(output)
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}
