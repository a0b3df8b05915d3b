//! Shared state handed to every build target

use super::paths::BuildLayout;
use super::version::VersionDescriptor;
use crate::executor::{
    ProcessOutcome, ProcessResult, ToolError, ToolInvocation, ToolRunner, expand_variables,
    unresolved_variables,
};
use crate::infrastructure::{CallSite, Config};
use crate::target::{ActionError, Environment, HasEnvironment};
use heck::ToKebabCase;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// One external tool launch and how it was classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolRecord {
    /// Call site that launched the tool
    pub site: CallSite,
    /// Program and arguments
    pub command: String,
    /// Exit code
    pub exit_code: i32,
    /// True when a non-zero exit was tolerated
    pub soft_failure: bool,
}

/// Read-mostly context for one pipeline run.
///
/// Everything here is computed once before the first target runs. The only
/// mutable part is the log of tool launches.
pub struct BuildContext {
    config: Config,
    layout: BuildLayout,
    version: VersionDescriptor,
    env: Environment,
    runner: Box<dyn ToolRunner>,
    tool_log: Mutex<Vec<ToolRecord>>,
}

impl BuildContext {
    /// Creates a context
    pub fn new(
        config: Config,
        layout: BuildLayout,
        version: VersionDescriptor,
        env: Environment,
        runner: Box<dyn ToolRunner>,
    ) -> Self {
        Self {
            config,
            layout,
            version,
            env,
            runner,
            tool_log: Mutex::new(Vec::new()),
        }
    }

    /// Loaded configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolved paths
    #[must_use]
    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    /// Version of this run
    #[must_use]
    pub fn version(&self) -> &VersionDescriptor {
        &self.version
    }

    /// Project name in kebab case, used for shipped file names
    #[must_use]
    pub fn project_kebab(&self) -> String {
        self.config.project.to_kebab_case()
    }

    /// File name of the executable in the Ready phase
    #[must_use]
    pub fn staged_executable_name(&self) -> String {
        match Path::new(&self.config.main_assembly).extension() {
            Some(ext) => format!("{}.{}", self.project_kebab(), ext.to_string_lossy()),
            None => self.project_kebab(),
        }
    }

    /// File name of the distribution archive
    #[must_use]
    pub fn archive_name(&self) -> String {
        format!("{}.{}.zip", self.project_kebab(), self.version.sem_version)
    }

    /// True when no CI system is detected
    #[must_use]
    pub fn is_local_build(&self) -> bool {
        self.env.get("CI").is_none()
    }

    /// Placeholders available to configured argument templates
    #[must_use]
    pub fn variables(&self) -> HashMap<String, String> {
        let pairs = [
            ("PROJECT", self.config.project.clone()),
            ("PROJECT_KEBAB", self.project_kebab()),
            ("MAIN_ASSEMBLY", self.config.main_assembly.clone()),
            ("CONFIGURATION", self.config.configuration.clone()),
            ("SEMVER", self.version.sem_version.clone()),
            ("PACKAGE_VERSION", self.version.package_version.clone()),
            ("BUILD_COUNTER", self.version.build_counter.to_string()),
            ("ROOT", self.layout.root.display().to_string()),
            ("TEMP_ROOT", self.layout.temp_root.display().to_string()),
        ];
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    /// Expands `${VAR}` placeholders from [`Self::variables`].
    ///
    /// Unknown placeholders are left in place and logged as warnings.
    #[must_use]
    pub fn expand(&self, template: &str) -> String {
        let vars = self.variables();
        for name in unresolved_variables(template, &vars) {
            tracing::warn!(variable = %name, "Unknown placeholder in '{template}'");
        }
        expand_variables(template, &vars)
    }

    /// Placeholders in `template` that [`Self::expand`] cannot fill
    #[must_use]
    pub fn unresolved(&self, template: &str) -> Vec<String> {
        unresolved_variables(template, &self.variables())
    }

    /// Launches a tool and applies the call site's failure policy.
    ///
    /// A tolerated failure is logged and returned as `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Tool`] if the tool cannot run, times out, or
    /// exits non-zero under a hard policy.
    pub fn invoke(
        &self,
        site: CallSite,
        program: &Path,
        args: &str,
        cwd: &Path,
    ) -> Result<ProcessResult, ActionError> {
        let invocation = ToolInvocation::new(program, args, cwd)
            .with_timeout(self.config.tool_timeout());
        tracing::debug!(%site, command = %invocation, "Launching tool");

        let result = self.runner.run(&invocation)?;
        let policy = self.config.failure_policy.for_site(site);
        let outcome = policy.classify(&result);

        self.tool_log.lock().push(ToolRecord {
            site,
            command: invocation.to_string(),
            exit_code: result.exit_code,
            soft_failure: outcome == ProcessOutcome::SoftFailure,
        });

        match outcome {
            ProcessOutcome::Success => Ok(result),
            ProcessOutcome::SoftFailure => {
                tracing::warn!(
                    %site,
                    exit_code = result.exit_code,
                    "'{}' failed, continuing",
                    program.display()
                );
                Ok(result)
            }
            ProcessOutcome::HardFailure => Err(ToolError::NonZeroExit {
                program: program.to_path_buf(),
                code: result.exit_code,
            }
            .into()),
        }
    }

    /// Tool launches so far, in order
    #[must_use]
    pub fn tool_records(&self) -> Vec<ToolRecord> {
        self.tool_log.lock().clone()
    }

    /// Tool launches whose failure was tolerated
    #[must_use]
    pub fn soft_failures(&self) -> Vec<ToolRecord> {
        self.tool_log
            .lock()
            .iter()
            .filter(|r| r.soft_failure)
            .cloned()
            .collect()
    }
}

impl HasEnvironment for BuildContext {
    fn environment(&self) -> &Environment {
        &self.env
    }
}
