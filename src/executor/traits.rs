//! External tool execution traits
//!
//! This module defines the seam between build targets and the processes
//! they launch, plus the value types that cross it.

use super::errors::ToolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Trait for launching external tools
pub trait ToolRunner: Send + Sync {
    /// Runs the invocation to completion and reports its exit code.
    ///
    /// A non-zero exit is not an error at this level; the caller classifies
    /// it with a [`FailurePolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] if the process cannot be started, times out,
    /// or its output cannot be read.
    fn run(&self, invocation: &ToolInvocation) -> Result<ProcessResult, ToolError>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for Arc<T> {
    fn run(&self, invocation: &ToolInvocation) -> Result<ProcessResult, ToolError> {
        (**self).run(invocation)
    }
}

/// A single external process launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Executable path or name on `PATH`
    pub program: PathBuf,
    /// Argument string, split with shell-word rules
    pub args: String,
    /// Working directory
    pub cwd: PathBuf,
    /// Kill the process after this long (None = wait forever)
    pub timeout: Option<Duration>,
}

impl ToolInvocation {
    /// Creates a new invocation without a timeout
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: args.into(),
            cwd: cwd.into(),
            timeout: None,
        }
    }

    /// Sets the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Splits the argument string into words.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] on unbalanced quotes.
    pub fn argv(&self) -> Result<Vec<String>, ToolError> {
        shell_words::split(&self.args).map_err(|e| ToolError::InvalidArguments {
            program: self.program.clone(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program.display(), self.args)
    }
}

/// Result of an external process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code, `-1` when terminated by a signal
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Wall-clock duration
    pub duration: Duration,
}

impl ProcessResult {
    /// Returns true if the process exited with code 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// How a call site treats a non-zero exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log a warning and continue
    Warn,
    /// Abort the pipeline
    #[default]
    Fail,
}

impl FailurePolicy {
    /// Classifies a finished process under this policy
    #[must_use]
    pub fn classify(self, result: &ProcessResult) -> ProcessOutcome {
        match (result.is_success(), self) {
            (true, _) => ProcessOutcome::Success,
            (false, Self::Warn) => ProcessOutcome::SoftFailure,
            (false, Self::Fail) => ProcessOutcome::HardFailure,
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warn => write!(f, "warn"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Classification of a process result at its call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Exit code 0
    Success,
    /// Non-zero exit, logged and tolerated
    SoftFailure,
    /// Non-zero exit, aborts the pipeline
    HardFailure,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(code: i32) -> ProcessResult {
        ProcessResult {
            exit_code: code,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(FailurePolicy::Warn.classify(&result(0)), ProcessOutcome::Success);
        assert_eq!(FailurePolicy::Fail.classify(&result(0)), ProcessOutcome::Success);
        assert_eq!(
            FailurePolicy::Warn.classify(&result(1)),
            ProcessOutcome::SoftFailure
        );
        assert_eq!(
            FailurePolicy::Fail.classify(&result(-1)),
            ProcessOutcome::HardFailure
        );
    }

    #[test]
    fn test_policy_serde() {
        let policy: FailurePolicy = serde_yaml::from_str("warn").unwrap();
        assert_eq!(policy, FailurePolicy::Warn);
        assert_eq!(FailurePolicy::default(), FailurePolicy::Fail);
        assert_eq!(FailurePolicy::Warn.to_string(), "warn");
    }

    #[test]
    fn test_argv_splits_quoted_words() {
        let inv = ToolInvocation::new("nuget", r#"restore "/src/My App.sln" -NonInteractive"#, "/src");
        assert_eq!(
            inv.argv().unwrap(),
            vec!["restore", "/src/My App.sln", "-NonInteractive"]
        );
    }

    #[test]
    fn test_argv_rejects_unbalanced_quotes() {
        let inv = ToolInvocation::new("nuget", r#"restore "oops"#, "/src");
        assert!(matches!(inv.argv(), Err(ToolError::InvalidArguments { .. })));
    }

    #[test]
    fn test_invocation_display() {
        let inv = ToolInvocation::new("7za", "a out.zip *", "/ready")
            .with_timeout(Some(Duration::from_secs(1)));
        assert_eq!(inv.to_string(), "7za a out.zip *");
        assert_eq!(inv.timeout, Some(Duration::from_secs(1)));
    }
}
