//! Scripted tool runner for tests

use super::errors::ToolError;
use super::traits::{ProcessResult, ToolInvocation, ToolRunner};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

type Hook = Box<dyn Fn(&ToolInvocation) + Send + Sync>;
type ErrorHook = Box<dyn Fn(&ToolInvocation) -> ToolError + Send + Sync>;

/// Records invocations instead of launching processes.
///
/// Tools are matched by the file name of the program path.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    exit_codes: HashMap<String, i32>,
    hooks: HashMap<String, Hook>,
    errors: HashMap<String, ErrorHook>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call to `tool` exit with `code`
    pub fn exit_code(mut self, tool: &str, code: i32) -> Self {
        self.exit_codes.insert(tool.to_string(), code);
        self
    }

    /// Runs `hook` whenever `tool` is invoked, e.g. to fake its outputs
    pub fn on<F>(mut self, tool: &str, hook: F) -> Self
    where
        F: Fn(&ToolInvocation) + Send + Sync + 'static,
    {
        self.hooks.insert(tool.to_string(), Box::new(hook));
        self
    }

    /// Makes every call to `tool` fail before producing an exit code
    pub fn fail_with<F>(mut self, tool: &str, error: F) -> Self
    where
        F: Fn(&ToolInvocation) -> ToolError + Send + Sync + 'static,
    {
        self.errors.insert(tool.to_string(), Box::new(error));
        self
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().clone()
    }

    /// Tool names in call order
    pub fn tools(&self) -> Vec<String> {
        self.calls().iter().map(tool_name).collect()
    }
}

fn tool_name(inv: &ToolInvocation) -> String {
    inv.program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl ToolRunner for RecordingRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ProcessResult, ToolError> {
        invocation.argv()?;
        self.calls.lock().push(invocation.clone());

        let name = tool_name(invocation);
        if let Some(error) = self.errors.get(&name) {
            return Err(error(invocation));
        }
        if let Some(hook) = self.hooks.get(&name) {
            hook(invocation);
        }
        Ok(ProcessResult {
            exit_code: self.exit_codes.get(&name).copied().unwrap_or(0),
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
        })
    }
}
