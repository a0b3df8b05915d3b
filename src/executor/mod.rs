//! External tool execution layer
//!
//! This module contains the [`ToolRunner`] seam used by build targets and
//! the process-backed implementation.

mod args;
mod errors;
mod process;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use args::{expand_variables, quote_path, unresolved_variables};
pub use errors::ToolError;
pub use process::ProcessRunner;
pub use traits::{FailurePolicy, ProcessOutcome, ProcessResult, ToolInvocation, ToolRunner};
