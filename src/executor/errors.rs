//! Error types for external tool execution

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running an external tool
#[derive(Error, Debug)]
pub enum ToolError {
    /// The process could not be started
    #[error("Failed to start '{}': {source}", .program.display())]
    Spawn {
        /// Executable that was launched.
        program: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The argument string could not be split into words
    #[error("Invalid arguments for '{}': {reason}", .program.display())]
    InvalidArguments {
        /// Executable the arguments were meant for.
        program: PathBuf,
        /// Parse failure description.
        reason: String,
    },

    /// The process exited with a non-zero code under a hard policy
    #[error("'{}' exited with code {code}", .program.display())]
    NonZeroExit {
        /// Executable that failed.
        program: PathBuf,
        /// Exit code, `-1` when killed by a signal.
        code: i32,
    },

    /// The process did not finish in time and was killed
    #[error("'{}' timed out after {timeout:?}", .program.display())]
    TimeoutExceeded {
        /// Executable that was killed.
        program: PathBuf,
        /// Configured limit.
        timeout: Duration,
    },

    /// Waiting on or reading from the process failed
    #[error("I/O error while running '{}': {source}", .program.display())]
    Io {
        /// Executable being run.
        program: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A tool could not be downloaded
    #[error("Failed to download {url}: {reason}")]
    Download {
        /// Source URL.
        url: String,
        /// Failure description.
        reason: String,
    },
}
