//! Release pipeline
//!
//! The concrete targets of a .NET application release: tool bootstrap,
//! compilation, assembly merge, staging, packaging, archiving and local
//! publishing. Artifacts travel between [`StagingPhase`] directories under a
//! temporary build root.

pub mod actions;
mod context;
mod download;
mod fs;
mod paths;
mod pipeline;
mod version;

pub use context::{BuildContext, ToolRecord};
pub use download::download_if_missing;
pub use fs::{
    CopyOutcome, FileExistsPolicy, copy_dir_recursive, copy_file, ensure_clean_dir, ensure_dir,
    glob_files,
};
pub use paths::{BuildLayout, StagingPhase, ToolPaths, phase_dir};
pub use pipeline::{
    ARCHIVE, CHECK_TOOLS, CLEAN, COMPILE, DEFAULT_TARGET, INFORMATION, MERGE, PACKAGE, PUBLISH,
    RESTORE, STAGE, define_pipeline,
};
pub use version::{CalendarScheme, VersionDescriptor, VersionScheme};
