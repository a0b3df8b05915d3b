//! Prelude module for common imports

// Re-export target graph types
pub use crate::target::condition::{Condition, Environment};
pub use crate::target::errors::{ActionError, GraphError, RunError};
pub use crate::target::graph::TargetGraph;
pub use crate::target::target_def::{HasEnvironment, Target, TargetBuilder};
pub use crate::target::types::{PlanEntry, RunReport, TargetOutcome, TargetStatus};

// Re-export executor types
pub use crate::executor::{FailurePolicy, ProcessRunner, ToolInvocation, ToolRunner};

// Re-export pipeline types
pub use crate::build::{BuildContext, BuildLayout, StagingPhase, VersionDescriptor};
