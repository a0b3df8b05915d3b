//! The release pipeline as a target graph

use super::actions;
use super::context::BuildContext;
use crate::infrastructure::Config;
use crate::target::{ActionError, Condition, GraphError, Target, TargetGraph};

/// Logs build information
pub const INFORMATION: &str = "Information";
/// Bootstraps the build tools
pub const CHECK_TOOLS: &str = "CheckTools";
/// Empties the build directories
pub const CLEAN: &str = "Clean";
/// Restores solution dependencies
pub const RESTORE: &str = "Restore";
/// Compiles the solution
pub const COMPILE: &str = "Compile";
/// Merges dependencies into the executable
pub const MERGE: &str = "Merge";
/// Lays out the shippable files
pub const STAGE: &str = "Stage";
/// Creates packages
pub const PACKAGE: &str = "Package";
/// Creates the archive
pub const ARCHIVE: &str = "Archive";
/// Publishes locally
pub const PUBLISH: &str = "Publish";

/// Target run when none is requested
pub const DEFAULT_TARGET: &str = PUBLISH;

type Step = fn(&BuildContext) -> Result<(), ActionError>;

/// Chain order; each target depends on the one before it
const CHAIN: [(&str, &str, Step); 10] = [
    (INFORMATION, "Log host, configuration and version", actions::information),
    (CHECK_TOOLS, "Download the package manager and restore build tools", actions::check_tools),
    (CLEAN, "Recreate the temporary build root and artifacts directory", actions::clean),
    (RESTORE, "Restore solution dependencies", actions::restore),
    (COMPILE, "Compile the solution into the build phase", actions::compile),
    (MERGE, "Merge dependency libraries into the main executable", actions::merge),
    (STAGE, "Copy the executable and config files into the ready phase", actions::stage),
    (PACKAGE, "Create one package per manifest template", actions::package),
    (ARCHIVE, "Zip the ready phase", actions::archive),
    (PUBLISH, "Copy executables to the local standalone directory", actions::publish),
];

/// Builds the release pipeline.
///
/// Publish only runs when the configured distribution variable is set.
///
/// # Errors
///
/// Returns [`GraphError`] if a target definition is rejected, e.g. an empty
/// distribution variable name.
pub fn define_pipeline(config: &Config) -> Result<TargetGraph<BuildContext>, GraphError> {
    let publish_guard = Condition::env_set(config.distribution_env.clone());
    publish_guard.validate(PUBLISH)?;

    let mut graph = TargetGraph::new();
    let mut previous: Option<&str> = None;
    for (id, description, step) in CHAIN {
        let mut builder = Target::new(id).description(description);
        if let Some(dep) = previous {
            builder = builder.depends_on(dep);
        }
        if id == PUBLISH {
            builder = builder.only_when_condition(publish_guard.clone());
        }
        graph.register(builder.executes(step))?;
        previous = Some(id);
    }
    Ok(graph)
}
