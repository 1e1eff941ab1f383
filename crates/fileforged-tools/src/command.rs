//! Builder for executing external tool commands.

use std::ffi::{OsStr, OsString};
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use crate::{Error, Result};

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Combined stdout and stderr, in the order the process wrote them (lossy UTF-8).
    pub output: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// Both standard streams are redirected into a single anonymous capture file,
/// so the text returned is the interleaved stream a terminal would show. The
/// call blocks until the process exits; there is no timeout.
///
/// # Example
///
/// ```no_run
/// use fileforged_tools::ToolCommand;
///
/// let output = ToolCommand::new("ffmpeg")
///     .arg("-y")
///     .arg("-i").arg("/uploads/clip.mov")
///     .arg("/outputs/clip.mp4")
///     .execute()?;
/// println!("{}", output.output);
/// # Ok::<(), fileforged_tools::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(s.as_ref().to_os_string());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl AsRef<OsStr>>) -> &mut Self {
        self.args
            .extend(iter.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Short program name used in errors and logs.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Shell-like rendering of the command line, for logging.
    pub fn display(&self) -> String {
        let mut line = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Execute the command, capturing the combined output stream.
    ///
    /// # Errors
    ///
    /// - Returns [`Error::ToolNotFound`] if the executable does not exist.
    /// - Returns [`Error::ToolFailed`] if spawning fails or the process exits
    ///   with a non-zero status; the captured text is kept in the error.
    pub fn execute(&self) -> Result<ToolOutput> {
        let tool = self.tool_name();

        let mut capture = tempfile::tempfile()?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(capture.try_clone()?))
            .stderr(Stdio::from(capture.try_clone()?));

        #[cfg(feature = "tracing")]
        tracing::debug!("Running {}", self.display());

        let status = cmd.status().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(&tool)
            } else {
                Error::tool_failed(&tool, format!("failed to spawn: {e}"), String::new())
            }
        })?;

        capture.seek(SeekFrom::Start(0))?;
        let mut raw = Vec::new();
        capture.read_to_end(&mut raw)?;
        let output = String::from_utf8_lossy(&raw).to_string();

        if !status.success() {
            return Err(Error::tool_failed(
                tool,
                format!("exited with {status}"),
                output,
            ));
        }

        Ok(ToolOutput { status, output })
    }
}
