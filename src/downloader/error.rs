//! Error types for external tool invocation.

use thiserror::Error;

/// Errors that can occur while invoking a download tool.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The tool executable was not found on PATH.
    #[error("{tool} command not found\n  Suggestion: Install {tool} and ensure it is on PATH")]
    ToolNotInstalled {
        /// Tool program name.
        tool: String,
    },

    /// The tool exited with a non-zero status.
    #[error("{tool} failed with code {code}. Stderr: {stderr}")]
    ToolFailed {
        /// Tool program name.
        tool: String,
        /// Process exit code (-1 when terminated by a signal).
        code: i32,
        /// Captured stderr text.
        stderr: String,
    },

    /// The tool finished without producing any detectable files.
    #[error("{tool} finished, but no files were detected")]
    NoOutput {
        /// Tool program name.
        tool: String,
    },

    /// Spawning or communicating with the tool process failed.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        /// Tool program name.
        tool: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Maps a process spawn error, distinguishing a missing executable
    /// from other IO failures.
    #[must_use]
    pub fn from_spawn(tool: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::ToolNotInstalled {
                tool: tool.to_string(),
            }
        } else {
            Self::Spawn {
                tool: tool.to_string(),
                source,
            }
        }
    }
}
