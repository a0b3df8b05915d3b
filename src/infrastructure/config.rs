//! Configuration management
//!
//! Settings come from `targetline.yaml` at the repository root when it
//! exists, otherwise from built-in defaults. Every path is relative to the
//! repository root unless it is absolute.

use crate::executor::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up at the repository root
pub const CONFIG_FILE_NAME: &str = "targetline.yaml";

/// Errors loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for [`Config`]
    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A value is out of range
    #[error("Invalid config value for '{field}': {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Main project name
    pub project: String,
    /// Solution file
    pub solution: PathBuf,
    /// File name of the compiled executable to merge and ship
    pub main_assembly: String,
    /// Build configuration passed to the compiler
    pub configuration: String,
    /// Source directory, working directory for restore and packaging
    pub source_dir: PathBuf,
    /// Build tools directory
    pub tools_dir: PathBuf,
    /// Artifacts output directory
    pub artifacts_dir: PathBuf,
    /// Local development directory receiving the standalone app
    pub dev_dir: PathBuf,
    /// Temporary build root holding the staging phase directories
    pub temp_dir: PathBuf,
    /// Environment variable naming the local distribution root
    pub distribution_env: String,
    /// Copy the archive into the local package feed on publish
    pub publish_feed: bool,
    /// Log level
    pub log_level: String,
    /// Kill external tools after this many seconds (None = no limit)
    pub tool_timeout_secs: Option<u64>,
    /// External tool locations
    pub tools: ToolsConfig,
    /// Per call site handling of non-zero exits
    pub failure_policy: FailurePolicies,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: "App".to_string(),
            solution: PathBuf::from("src/App.sln"),
            main_assembly: "App.exe".to_string(),
            configuration: "Release".to_string(),
            source_dir: PathBuf::from("src"),
            tools_dir: PathBuf::from("tools"),
            artifacts_dir: PathBuf::from("_artifacts"),
            dev_dir: PathBuf::from("_dev"),
            temp_dir: PathBuf::from(".tmp/build"),
            distribution_env: "DlLocalPackages".to_string(),
            publish_feed: false,
            log_level: "info".to_string(),
            tool_timeout_secs: None,
            tools: ToolsConfig::default(),
            failure_policy: FailurePolicies::default(),
        }
    }
}

impl Config {
    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads `targetline.yaml` from `root`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is invalid.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            tracing::debug!(root = %root.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Checks required values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("project", self.project.as_str()),
            ("main_assembly", self.main_assembly.as_str()),
            ("configuration", self.configuration.as_str()),
            ("distribution_env", self.distribution_env.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "cannot be empty".to_string(),
                });
            }
        }
        if self.tool_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "tool_timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Tool timeout as a duration
    #[must_use]
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

/// External tool locations and argument templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Package manager executable
    pub package_manager: PathBuf,
    /// Where to download the package manager from when it is missing
    pub package_manager_url: String,
    /// Compiler executable (bare names are looked up on `PATH`)
    pub compiler: PathBuf,
    /// Assembly merging tool
    pub merger: PathBuf,
    /// Archiver
    pub archiver: PathBuf,
    /// Arguments for the merging tool, `${VAR}` placeholders allowed
    pub merge_args: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            package_manager: PathBuf::from("tools/nuget/nuget.exe"),
            package_manager_url: "https://dist.nuget.org/win-x86-commandline/latest/nuget.exe"
                .to_string(),
            compiler: PathBuf::from("msbuild"),
            merger: PathBuf::from("tools/LibZ.Tool/tools/libz.exe"),
            archiver: PathBuf::from("tools/7-Zip.CommandLine/tools/7za.exe"),
            merge_args: "inject-dll --assembly ${MAIN_ASSEMBLY} --include *.dll --move"
                .to_string(),
        }
    }
}

/// Places in the pipeline that launch external tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallSite {
    /// Tool package restore
    CheckTools,
    /// Solution dependency restore
    Restore,
    /// Compiler
    Compile,
    /// Assembly merge
    Merge,
    /// Package creation
    Package,
    /// Archive creation
    Archive,
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CheckTools => "check_tools",
            Self::Restore => "restore",
            Self::Compile => "compile",
            Self::Merge => "merge",
            Self::Package => "package",
            Self::Archive => "archive",
        };
        f.write_str(name)
    }
}

/// Failure policy for each call site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FailurePolicies {
    /// Tool package restore
    pub check_tools: FailurePolicy,
    /// Solution dependency restore
    pub restore: FailurePolicy,
    /// Compiler
    pub compile: FailurePolicy,
    /// Assembly merge
    pub merge: FailurePolicy,
    /// Package creation
    pub package: FailurePolicy,
    /// Archive creation
    pub archive: FailurePolicy,
}

impl Default for FailurePolicies {
    fn default() -> Self {
        Self {
            check_tools: FailurePolicy::Warn,
            restore: FailurePolicy::Warn,
            compile: FailurePolicy::Fail,
            merge: FailurePolicy::Warn,
            package: FailurePolicy::Fail,
            archive: FailurePolicy::Warn,
        }
    }
}

impl FailurePolicies {
    /// Policy for a call site
    #[must_use]
    pub fn for_site(&self, site: CallSite) -> FailurePolicy {
        match site {
            CallSite::CheckTools => self.check_tools,
            CallSite::Restore => self.restore,
            CallSite::Compile => self.compile,
            CallSite::Merge => self.merge,
            CallSite::Package => self.package,
            CallSite::Archive => self.archive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.configuration, "Release");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.distribution_env, "DlLocalPackages");
        assert!(config.tool_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_failure_policies() {
        let policies = FailurePolicies::default();
        assert_eq!(policies.for_site(CallSite::Restore), FailurePolicy::Warn);
        assert_eq!(policies.for_site(CallSite::Merge), FailurePolicy::Warn);
        assert_eq!(policies.for_site(CallSite::Compile), FailurePolicy::Fail);
        assert_eq!(policies.for_site(CallSite::Package), FailurePolicy::Fail);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r"
project: Simcha
main_assembly: NugetComposer.exe
tool_timeout_secs: 600
failure_policy:
  restore: fail
tools:
  compiler: /opt/msbuild/msbuild
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.project, "Simcha");
        assert_eq!(config.main_assembly, "NugetComposer.exe");
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.failure_policy.restore, FailurePolicy::Fail);
        assert_eq!(config.failure_policy.merge, FailurePolicy::Warn);
        assert_eq!(config.tools.compiler, PathBuf::from("/opt/msbuild/msbuild"));
        assert_eq!(config.tools.archiver, ToolsConfig::default().archiver);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("projekt: Typo\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_empty_and_zero() {
        let config = Config {
            project: "  ".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "project", .. })
        ));

        let config = Config {
            tool_timeout_secs: Some(0),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "tool_timeout_secs",
                ..
            })
        ));
    }

    #[test]
    fn test_discover_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_discover_reads_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "project: Simcha\n").unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap().project, "Simcha");
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "project: [unclosed\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_call_site_display() {
        assert_eq!(CallSite::CheckTools.to_string(), "check_tools");
        assert_eq!(CallSite::Archive.to_string(), "archive");
    }
}
