//! Target actions of the build pipeline
//!
//! Each function is the body of one target. They only read what an
//! upstream target is documented to leave in its phase directory.

use super::context::BuildContext;
use super::download::download_if_missing;
use super::fs::{
    FileExistsPolicy, copy_dir_recursive, copy_file, ensure_clean_dir, ensure_dir, glob_files,
};
use super::paths::StagingPhase;
use crate::executor::{FailurePolicy, quote_path};
use crate::infrastructure::CallSite;
use crate::target::{ActionError, HasEnvironment};
use chrono::Datelike;
use std::path::Path;

/// Logs the host kind, configuration and version of this run.
pub fn information(ctx: &BuildContext) -> Result<(), ActionError> {
    let version = ctx.version();
    tracing::info!(
        host = if ctx.is_local_build() { "local" } else { "ci" },
        configuration = %ctx.config().configuration,
        build_counter = version.build_counter,
        "Build information"
    );
    tracing::info!(
        sem_version = %version.sem_version,
        assembly_version = %version.assembly_version,
        file_version = %version.file_version,
        "Version {}",
        version.informational_version
    );
    Ok(())
}

/// Makes sure the package manager exists, then restores the build tools.
pub fn check_tools(ctx: &BuildContext) -> Result<(), ActionError> {
    let layout = ctx.layout();
    let package_manager = &layout.tools.package_manager;

    if let Err(e) = download_if_missing(&ctx.config().tools.package_manager_url, package_manager) {
        if ctx.config().failure_policy.check_tools == FailurePolicy::Warn {
            tracing::warn!(error = %e, "Package manager unavailable, skipping tool restore");
            return Ok(());
        }
        return Err(e.into());
    }

    let args = format!(
        "install {} -OutputDirectory {} -ExcludeVersion",
        quote_path(&layout.tools_manifest()),
        quote_path(&layout.tools_dir)
    );
    ctx.invoke(CallSite::CheckTools, package_manager, &args, &layout.source_dir)?;
    Ok(())
}

/// Recreates the temporary build root and the artifacts directory empty.
pub fn clean(ctx: &BuildContext) -> Result<(), ActionError> {
    let layout = ctx.layout();
    ensure_clean_dir(&layout.temp_root)?;
    ensure_clean_dir(&layout.artifacts_dir)?;
    tracing::debug!(temp_root = %layout.temp_root.display(), "Cleaned build directories");
    Ok(())
}

/// Restores solution dependencies.
pub fn restore(ctx: &BuildContext) -> Result<(), ActionError> {
    let layout = ctx.layout();
    let args = format!("restore {}", quote_path(&layout.solution));
    ctx.invoke(
        CallSite::Restore,
        &layout.tools.package_manager,
        &args,
        &layout.source_dir,
    )?;
    Ok(())
}

/// Builds the solution into the Build phase with the run's version stamped in.
pub fn compile(ctx: &BuildContext) -> Result<(), ActionError> {
    let layout = ctx.layout();
    let out = layout.phase_dir(StagingPhase::Build);
    ensure_dir(&out)?;

    ctx.invoke(
        CallSite::Compile,
        &layout.tools.compiler,
        &compile_args(ctx, &out),
        &layout.root,
    )?;
    Ok(())
}

fn compile_args(ctx: &BuildContext, out: &Path) -> String {
    let version = ctx.version();
    let cpus = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    let property =
        |name: &str, value: &str| shell_words::quote(&format!("/p:{name}={value}")).into_owned();

    [
        quote_path(&ctx.layout().solution),
        "/t:Rebuild".to_string(),
        property("Configuration", &ctx.config().configuration),
        // The compiler expects a trailing separator on output directories.
        property("OutDir", &format!("{}/", out.display())),
        property("AssemblyVersion", &version.assembly_version),
        property("FileVersion", &version.file_version),
        property("InformationalVersion", &version.informational_version),
        format!("/m:{cpus}"),
        format!("/nr:{}", ctx.is_local_build()),
        "/v:quiet".to_string(),
    ]
    .join(" ")
}

/// Copies compiler output into the Merge phase and inlines dependencies.
pub fn merge(ctx: &BuildContext) -> Result<(), ActionError> {
    let layout = ctx.layout();
    let build = layout.phase_dir(StagingPhase::Build);
    let out = layout.phase_dir(StagingPhase::Merge);

    let copied = copy_dir_recursive(&build, &out, FileExistsPolicy::Overwrite)?;
    tracing::debug!(files = copied, "Copied build output");

    let args = ctx.expand(&ctx.config().tools.merge_args);
    ctx.invoke(CallSite::Merge, &layout.tools.merger, &args, &out)?;
    Ok(())
}

/// Puts the merged executable and the config files into the Ready phase.
///
/// Existing files in Ready are kept.
pub fn stage(ctx: &BuildContext) -> Result<(), ActionError> {
    let layout = ctx.layout();
    let merged = layout
        .phase_dir(StagingPhase::Merge)
        .join(&ctx.config().main_assembly);
    if !merged.is_file() {
        return Err(ActionError::MissingArtifact(merged.display().to_string()));
    }

    let ready = layout.phase_dir(StagingPhase::Ready);
    ensure_dir(&ready)?;
    copy_file(
        &merged,
        &ready.join(ctx.staged_executable_name()),
        FileExistsPolicy::Skip,
    )?;

    for file in glob_files(&layout.config_resources_dir(), "*.json")? {
        if let Some(name) = file.file_name() {
            copy_file(&file, &ready.join(name), FileExistsPolicy::Skip)?;
        }
    }
    Ok(())
}

/// Builds one package per manifest template from a scaffold of Ready.
pub fn package(ctx: &BuildContext) -> Result<(), ActionError> {
    let layout = ctx.layout();
    let scaffold = layout.phase_dir(StagingPhase::Scaffold);
    let out = layout.phase_dir(StagingPhase::Nuget);
    ensure_dir(&out)?;
    copy_dir_recursive(
        &layout.phase_dir(StagingPhase::Ready),
        &scaffold.join("tools"),
        FileExistsPolicy::Overwrite,
    )?;

    let templates = glob_files(&layout.package_templates_dir(), "*.nuspec")?;
    if templates.is_empty() {
        tracing::info!("No package templates found");
    }

    let version = ctx.version();
    let properties = format!(
        "Configuration={};currentyear={}",
        ctx.config().configuration,
        version.captured_at.year()
    );
    for template in templates {
        let args = format!(
            "pack {} -Version {} -Properties {} -BasePath {} -OutputDirectory {} -NoPackageAnalysis",
            quote_path(&template),
            version.package_version,
            shell_words::quote(&properties),
            quote_path(&scaffold),
            quote_path(&out)
        );
        ctx.invoke(
            CallSite::Package,
            &layout.tools.package_manager,
            &args,
            &layout.source_dir,
        )?;
    }
    Ok(())
}

/// Zips the Ready phase into the Zip phase.
pub fn archive(ctx: &BuildContext) -> Result<(), ActionError> {
    let layout = ctx.layout();
    let out = layout.phase_dir(StagingPhase::Zip);
    ensure_dir(&out)?;

    let zip = out.join(ctx.archive_name());
    let args = format!("a {} *", quote_path(&zip));
    ctx.invoke(
        CallSite::Archive,
        &layout.tools.archiver,
        &args,
        &layout.phase_dir(StagingPhase::Ready),
    )?;
    Ok(())
}

/// Copies shipped executables to the local standalone directory.
///
/// With `publish_feed` enabled the archives are also copied into the
/// distribution root.
pub fn publish(ctx: &BuildContext) -> Result<(), ActionError> {
    let config = ctx.config();
    let layout = ctx.layout();
    let dist_root = ctx
        .environment()
        .non_empty(&config.distribution_env)
        .ok_or_else(|| {
            ActionError::Failed(format!("{} is not set", config.distribution_env))
        })?;

    if config.publish_feed {
        let feed = Path::new(dist_root).join(ctx.project_kebab());
        for zip in glob_files(&layout.phase_dir(StagingPhase::Zip), "**/*")? {
            if let Some(name) = zip.file_name() {
                copy_file(&zip, &feed.join(name), FileExistsPolicy::Skip)?;
            }
        }
        tracing::info!(feed = %feed.display(), "Published to local feed");
    }

    let standalone = layout.standalone_dir();
    ensure_dir(&standalone)?;
    for exe in glob_files(&layout.phase_dir(StagingPhase::Ready), "**/*.exe")? {
        if let Some(name) = exe.file_name() {
            copy_file(&exe, &standalone.join(name), FileExistsPolicy::Overwrite)?;
        }
    }
    tracing::info!(dir = %standalone.display(), "Published standalone app");
    Ok(())
}
