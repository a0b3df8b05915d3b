//! # targetline - A target-dependency build orchestrator
//!
//! targetline models a release pipeline as named targets with declared
//! dependencies, optional guards and actions. Requesting a terminal target
//! resolves its dependency closure depth-first and runs each target once, in
//! order, stopping at the first hard failure.
//!
//! ## Features
//!
//! - **Target graph**: duplicate, unknown and cyclic definitions are rejected
//!   before any action runs
//! - **Guards**: closures or declarative [`Condition`]s over an environment
//!   snapshot
//! - **Tool runner**: external processes with captured output, a timeout and
//!   per call site failure policies
//! - **Release pipeline**: compile, merge, stage, package, archive and
//!   publish through phase directories
//!
//! ## Example
//!
//! ```rust
//! use targetline::{ActionError, Target, TargetGraph};
//!
//! let mut graph: TargetGraph<()> = TargetGraph::new();
//! graph.register(Target::new("Clean").build()).unwrap();
//! graph
//!     .register(Target::new("Compile").depends_on("Clean").executes(|_| Ok::<_, ActionError>(())))
//!     .unwrap();
//!
//! let report = graph.run("Compile", &()).unwrap();
//! assert_eq!(report.executed(), vec!["Clean", "Compile"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod build;
pub mod executor;
pub mod infrastructure;
pub mod target;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use executor::{
    FailurePolicy, ProcessOutcome, ProcessResult, ProcessRunner, ToolError, ToolInvocation,
    ToolRunner, expand_variables,
};
pub use infrastructure::{CallSite, Config, ConfigError, init_logging};
pub use target::{
    ActionError, Condition, Environment, GraphError, HasEnvironment, PlanEntry, RunError,
    RunReport, Target, TargetBuilder, TargetGraph, TargetOutcome, TargetStatus,
};

/// Version of the targetline crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
