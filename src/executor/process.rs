//! Process-backed tool runner
//!
//! Every launched child is owned by a [`ChildGuard`] for its whole life. The
//! guard kills and reaps the process when it is dropped without having been
//! waited on, so an early return or a timeout never leaves a process behind.
//! Output is streamed line by line into the log while it is captured.

use super::errors::ToolError;
use super::traits::{ProcessResult, ToolInvocation, ToolRunner};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs tools as local child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Creates a runner that inherits the current environment
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ProcessResult, ToolError> {
        let argv = invocation.argv()?;
        let program = invocation.program.clone();

        tracing::debug!(
            program = %program.display(),
            args = %invocation.args,
            cwd = %invocation.cwd.display(),
            "Starting external tool"
        );

        let start = Instant::now();
        let child = Command::new(&program)
            .args(&argv)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut guard = ChildGuard::new(child, program.clone());
        let label = tool_label(&program);
        let stdout = guard
            .child
            .stdout
            .take()
            .map(|out| spawn_reader(out, label.clone(), false));
        let stderr = guard
            .child
            .stderr
            .take()
            .map(|err| spawn_reader(err, label, true));

        let status = guard.wait(invocation.timeout)?;

        // Descendants may keep the pipes open after the child exits, so the
        // output is bounded by the same deadline as the process.
        let deadline = invocation.timeout.map(|limit| (start + limit, limit));
        let result = ProcessResult {
            exit_code: status.code().unwrap_or(-1),
            stdout: collect_output(stdout, deadline, &program)?,
            stderr: collect_output(stderr, deadline, &program)?,
            duration: start.elapsed(),
        };

        tracing::debug!(
            program = %program.display(),
            exit_code = result.exit_code,
            duration_ms = result.duration.as_millis(),
            "External tool finished"
        );
        Ok(result)
    }
}

/// Owns a child process until it has been reaped
struct ChildGuard {
    child: Child,
    program: PathBuf,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child, program: PathBuf) -> Self {
        Self {
            child,
            program,
            reaped: false,
        }
    }

    /// Waits for exit, killing the child if `timeout` elapses first.
    fn wait(&mut self, timeout: Option<Duration>) -> Result<ExitStatus, ToolError> {
        let Some(limit) = timeout else {
            let status = self.child.wait().map_err(|e| self.io(e))?;
            self.reaped = true;
            return Ok(status);
        };

        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = self.child.try_wait().map_err(|e| self.io(e))? {
                self.reaped = true;
                return Ok(status);
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    program = %self.program.display(),
                    timeout_ms = limit.as_millis(),
                    "External tool timed out, killing it"
                );
                self.terminate();
                return Err(ToolError::TimeoutExceeded {
                    program: self.program.clone(),
                    timeout: limit,
                });
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(e) = self.child.kill() {
            tracing::debug!(program = %self.program.display(), error = %e, "Kill failed");
        }
        if let Err(e) = self.child.wait() {
            tracing::debug!(program = %self.program.display(), error = %e, "Reap failed");
        }
        self.reaped = true;
    }

    fn io(&self, source: std::io::Error) -> ToolError {
        ToolError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn tool_label(program: &Path) -> String {
    program
        .file_name()
        .map_or_else(|| program.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Forwards each line to the log and sends everything that was read once
/// the stream closes
fn spawn_reader<R: Read + Send + 'static>(stream: R, tool: String, is_stderr: bool) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut captured = String::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let trimmed = line.trim_end_matches(['\r', '\n']);
                    if is_stderr {
                        tracing::warn!(tool = %tool, "{trimmed}");
                    } else {
                        tracing::info!(tool = %tool, "{trimmed}");
                    }
                    captured.push_str(trimmed);
                    captured.push('\n');
                }
            }
        }
        // The receiver is gone when the run already timed out.
        let _ = tx.send(captured);
    });
    rx
}

/// Waits for a reader's output, giving up at the deadline.
///
/// A reader still blocked at the deadline is left behind; it ends when the
/// last process holding the pipe exits.
fn collect_output(
    output: Option<Receiver<String>>,
    deadline: Option<(Instant, Duration)>,
    program: &Path,
) -> Result<String, ToolError> {
    let Some(rx) = output else {
        return Ok(String::new());
    };
    let Some((at, limit)) = deadline else {
        return Ok(rx.recv().unwrap_or_default());
    };
    match rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
        Ok(text) => Ok(text),
        Err(RecvTimeoutError::Disconnected) => Ok(String::new()),
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(
                program = %program.display(),
                timeout_ms = limit.as_millis(),
                "Output still open after the tool exited, giving up"
            );
            Err(ToolError::TimeoutExceeded {
                program: program.to_path_buf(),
                timeout: limit,
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, cwd: &Path) -> ToolInvocation {
        ToolInvocation::new("sh", format!("-c {}", shell_words::quote(script)), cwd)
    }

    #[test]
    fn test_run_captures_stdout() {
        let dir = TempDir::new().unwrap();
        let result = ProcessRunner::new()
            .run(&sh("echo hello; echo world", dir.path()))
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.stdout, "hello\nworld\n");
        assert!(result.stderr.is_empty());
    }

    #[test]
    fn test_run_reports_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let result = ProcessRunner::new()
            .run(&sh("echo bad >&2; exit 3", dir.path()))
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stderr, "bad\n");
    }

    #[test]
    fn test_run_uses_working_directory() {
        let dir = TempDir::new().unwrap();
        let result = ProcessRunner::new().run(&sh("pwd -P", dir.path())).unwrap();

        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(PathBuf::from(result.stdout.trim()), expected);
    }

    #[test]
    fn test_run_inherits_environment() {
        let dir = TempDir::new().unwrap();
        let result = ProcessRunner::new()
            .run(&sh("test -n \"$PATH\" && echo ok", dir.path()))
            .unwrap();
        assert_eq!(result.stdout, "ok\n");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = TempDir::new().unwrap();
        let inv = ToolInvocation::new("/definitely/not/here/tool", "", dir.path());
        let err = ProcessRunner::new().run(&inv).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[test]
    fn test_timeout_kills_process() {
        let dir = TempDir::new().unwrap();
        let inv = sh("sleep 10", dir.path()).with_timeout(Some(Duration::from_millis(200)));

        let start = Instant::now();
        let err = ProcessRunner::new().run(&inv).unwrap_err();

        assert!(matches!(err, ToolError::TimeoutExceeded { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_timeout_covers_inherited_pipes() {
        let dir = TempDir::new().unwrap();
        let inv = sh("sleep 6 & exit 0", dir.path()).with_timeout(Some(Duration::from_millis(300)));

        let start = Instant::now();
        let err = ProcessRunner::new().run(&inv).unwrap_err();

        assert!(matches!(err, ToolError::TimeoutExceeded { .. }));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_timeout_not_hit_by_fast_process() {
        let dir = TempDir::new().unwrap();
        let inv = sh("exit 0", dir.path()).with_timeout(Some(Duration::from_secs(10)));
        let result = ProcessRunner::new().run(&inv).unwrap();
        assert!(result.is_success());
    }
}
