//! Staging phase directories and repository layout

#![allow(clippy::must_use_candidate)]

use crate::infrastructure::Config;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One directory-scoped stage of the artifact pipeline.
///
/// Each phase directory is owned by one target; downstream targets only
/// read what the owner is documented to produce there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingPhase {
    /// Raw compiler output, owned by Compile
    Build,
    /// Compiler output with dependencies merged in, owned by Merge
    Merge,
    /// Ready-to-ship layout, owned by Stage
    Ready,
    /// Packaging scaffold, owned by Package
    Scaffold,
    /// Produced packages, owned by Package
    Nuget,
    /// Produced archive, owned by Archive
    Zip,
}

impl StagingPhase {
    /// All phases in pipeline order
    pub const ALL: [StagingPhase; 6] = [
        Self::Build,
        Self::Merge,
        Self::Ready,
        Self::Scaffold,
        Self::Nuget,
        Self::Zip,
    ];

    /// Directory segment under the temporary build root
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Merge => "merge",
            Self::Ready => "ready",
            Self::Scaffold => "nuget-scaffold",
            Self::Nuget => "nuget",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for StagingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Directory of `phase` for `project` under the temporary build root.
///
/// Pure path arithmetic; nothing is created.
pub fn phase_dir(root: &Path, phase: StagingPhase, project: &str) -> PathBuf {
    root.join(phase.dir_name()).join(project)
}

/// Absolute locations the pipeline reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// Repository root
    pub root: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Solution file
    pub solution: PathBuf,
    /// Build tools directory
    pub tools_dir: PathBuf,
    /// Artifacts directory
    pub artifacts_dir: PathBuf,
    /// Local development directory
    pub dev_dir: PathBuf,
    /// Temporary build root
    pub temp_root: PathBuf,
    /// Project name, the last segment of every phase directory
    pub project: String,
    /// Resolved tool executables
    pub tools: ToolPaths,
}

/// Resolved tool executables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// Package manager
    pub package_manager: PathBuf,
    /// Compiler
    pub compiler: PathBuf,
    /// Assembly merger
    pub merger: PathBuf,
    /// Archiver
    pub archiver: PathBuf,
}

impl BuildLayout {
    /// Resolves every configured path against `root`
    pub fn new(root: impl Into<PathBuf>, config: &Config) -> Self {
        let root = root.into();
        let at = |p: &Path| root.join(p);
        Self {
            source_dir: at(&config.source_dir),
            solution: at(&config.solution),
            tools_dir: at(&config.tools_dir),
            artifacts_dir: at(&config.artifacts_dir),
            dev_dir: at(&config.dev_dir),
            temp_root: at(&config.temp_dir),
            project: config.project.clone(),
            tools: ToolPaths {
                package_manager: resolve_tool(&root, &config.tools.package_manager),
                compiler: resolve_tool(&root, &config.tools.compiler),
                merger: resolve_tool(&root, &config.tools.merger),
                archiver: resolve_tool(&root, &config.tools.archiver),
            },
            root,
        }
    }

    /// Directory of a staging phase for this project
    pub fn phase_dir(&self, phase: StagingPhase) -> PathBuf {
        phase_dir(&self.temp_root, phase, &self.project)
    }

    /// Package manifest listing the build tools
    pub fn tools_manifest(&self) -> PathBuf {
        self.tools_dir.join("packages.config")
    }

    /// Configuration files copied verbatim into the Ready phase
    pub fn config_resources_dir(&self) -> PathBuf {
        self.source_dir.join("build").join("_res").join("config")
    }

    /// Package manifest templates
    pub fn package_templates_dir(&self) -> PathBuf {
        self.source_dir.join("build").join("_res").join("nuget")
    }

    /// Local standalone-app directory receiving published executables
    pub fn standalone_dir(&self) -> PathBuf {
        self.dev_dir.join("app.standalone")
    }
}

/// Bare names stay as they are so they are looked up on `PATH`
fn resolve_tool(root: &Path, tool: &Path) -> PathBuf {
    if tool.components().count() == 1 && !tool.is_absolute() {
        tool.to_path_buf()
    } else {
        root.join(tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_dir() {
        let root = Path::new("/repo/.tmp/build");
        assert_eq!(
            phase_dir(root, StagingPhase::Merge, "Simcha"),
            PathBuf::from("/repo/.tmp/build/merge/Simcha")
        );
        assert_eq!(
            phase_dir(root, StagingPhase::Scaffold, "Simcha"),
            PathBuf::from("/repo/.tmp/build/nuget-scaffold/Simcha")
        );
    }

    #[test]
    fn test_phase_dir_is_stable() {
        let root = Path::new("/r");
        for phase in StagingPhase::ALL {
            assert_eq!(phase_dir(root, phase, "P"), phase_dir(root, phase, "P"));
        }
    }

    #[test]
    fn test_phase_dirs_are_distinct() {
        let root = Path::new("/r");
        let dirs: std::collections::HashSet<_> = StagingPhase::ALL
            .iter()
            .map(|p| phase_dir(root, *p, "P"))
            .collect();
        assert_eq!(dirs.len(), StagingPhase::ALL.len());
    }

    #[test]
    fn test_layout_from_config() {
        let config = Config {
            project: "Simcha".to_string(),
            ..Config::default()
        };
        let layout = BuildLayout::new("/repo", &config);

        assert_eq!(layout.solution, PathBuf::from("/repo/src/App.sln"));
        assert_eq!(layout.temp_root, PathBuf::from("/repo/.tmp/build"));
        assert_eq!(
            layout.phase_dir(StagingPhase::Ready),
            PathBuf::from("/repo/.tmp/build/ready/Simcha")
        );
        assert_eq!(
            layout.config_resources_dir(),
            PathBuf::from("/repo/src/build/_res/config")
        );
        assert_eq!(
            layout.standalone_dir(),
            PathBuf::from("/repo/_dev/app.standalone")
        );
    }

    #[test]
    fn test_resolve_tool() {
        let config = Config::default();
        let layout = BuildLayout::new("/repo", &config);
        assert_eq!(layout.tools.compiler, PathBuf::from("msbuild"));
        assert_eq!(
            layout.tools.package_manager,
            PathBuf::from("/repo/tools/nuget/nuget.exe")
        );
        assert_eq!(
            resolve_tool(Path::new("/repo"), Path::new("/usr/bin/7za")),
            PathBuf::from("/usr/bin/7za")
        );
    }
}
