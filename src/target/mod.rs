//! Target-dependency execution engine
//!
//! A [`TargetGraph`] holds named [`Target`]s, each with declared
//! dependencies, an optional guard and an action. Asking the graph to run a
//! terminal target resolves its dependency closure and executes it in order,
//! each target at most once per invocation.

pub mod condition;
pub mod errors;
pub mod graph;
pub mod target_def;
pub mod types;


pub use condition::{Condition, Environment};
pub use errors::{ActionError, GraphError, RunError};
pub use graph::TargetGraph;
pub use target_def::{Action, Guard, HasEnvironment, Target, TargetBuilder};
pub use types::{PlanEntry, RunReport, TargetOutcome, TargetStatus};
