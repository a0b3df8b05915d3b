//! Filesystem helpers for staging artifacts

use crate::target::ActionError;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What to do when a copy destination already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileExistsPolicy {
    /// Report an error
    Fail,
    /// Keep the existing file
    Skip,
    /// Replace the existing file
    Overwrite,
}

/// Result of a single file copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The destination was written
    Copied,
    /// The destination existed and was kept
    Skipped,
}

/// Creates `dir` and its parents if missing.
///
/// # Errors
///
/// Returns [`ActionError::Io`] if creation fails.
pub fn ensure_dir(dir: &Path) -> Result<(), ActionError> {
    fs::create_dir_all(dir)
        .map_err(|e| ActionError::io(format!("Failed to create {}", dir.display()), e))
}

/// Removes `dir` with its contents and recreates it empty.
///
/// # Errors
///
/// Returns [`ActionError::Io`] if removal or creation fails.
pub fn ensure_clean_dir(dir: &Path) -> Result<(), ActionError> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .map_err(|e| ActionError::io(format!("Failed to remove {}", dir.display()), e))?;
    }
    ensure_dir(dir)
}

/// Copies one file, creating the destination's parent directory.
///
/// # Errors
///
/// Returns [`ActionError::Io`] if the copy fails, or if the destination
/// exists under [`FileExistsPolicy::Fail`].
pub fn copy_file(
    src: &Path,
    dest: &Path,
    policy: FileExistsPolicy,
) -> Result<CopyOutcome, ActionError> {
    if dest.exists() {
        match policy {
            FileExistsPolicy::Skip => {
                tracing::debug!(dest = %dest.display(), "Keeping existing file");
                return Ok(CopyOutcome::Skipped);
            }
            FileExistsPolicy::Fail => {
                return Err(ActionError::io(
                    format!("Refusing to overwrite {}", dest.display()),
                    std::io::Error::from(std::io::ErrorKind::AlreadyExists),
                ));
            }
            FileExistsPolicy::Overwrite => {}
        }
    }
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dest).map_err(|e| {
        ActionError::io(
            format!("Failed to copy {} to {}", src.display(), dest.display()),
            e,
        )
    })?;
    Ok(CopyOutcome::Copied)
}

/// Copies the contents of `src` into `dest`, preserving relative paths.
///
/// Returns the number of files written.
///
/// # Errors
///
/// Returns [`ActionError::MissingArtifact`] if `src` is not a directory,
/// otherwise whatever [`copy_file`] reports.
pub fn copy_dir_recursive(
    src: &Path,
    dest: &Path,
    policy: FileExistsPolicy,
) -> Result<usize, ActionError> {
    if !src.is_dir() {
        return Err(ActionError::MissingArtifact(src.display().to_string()));
    }
    ensure_dir(dest)?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| {
            let context = format!("Failed to walk {}", src.display());
            ActionError::io(context, e.into())
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if copy_file(entry.path(), &target, policy)? == CopyOutcome::Copied {
            copied += 1;
        }
    }
    Ok(copied)
}

/// Files in `dir` matching `pattern`, sorted.
///
/// `pattern` may contain `**` to descend into subdirectories. A missing
/// directory yields an empty list.
///
/// # Errors
///
/// Returns [`ActionError::Failed`] if the pattern is malformed.
pub fn glob_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ActionError> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let full = format!("{escaped}/{pattern}");
    let entries = glob::glob(&full)
        .map_err(|e| ActionError::Failed(format!("Invalid pattern '{pattern}': {e}")))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_ensure_clean_dir_removes_contents() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        write(&target.join("stale/file.txt"), "old");

        ensure_clean_dir(&target).unwrap();

        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn test_copy_file_policies() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.json");
        let dest = dir.path().join("out/a.json");
        write(&src, "new");
        write(&dest, "old");

        assert_eq!(
            copy_file(&src, &dest, FileExistsPolicy::Skip).unwrap(),
            CopyOutcome::Skipped
        );
        assert_eq!(fs::read_to_string(&dest).unwrap(), "old");

        assert!(copy_file(&src, &dest, FileExistsPolicy::Fail).is_err());

        assert_eq!(
            copy_file(&src, &dest, FileExistsPolicy::Overwrite).unwrap(),
            CopyOutcome::Copied
        );
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_copy_dir_recursive() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("build");
        write(&src.join("App.exe"), "exe");
        write(&src.join("lib/Dep.dll"), "dll");

        let dest = dir.path().join("merge");
        assert_eq!(
            copy_dir_recursive(&src, &dest, FileExistsPolicy::Overwrite).unwrap(),
            2
        );
        assert_eq!(fs::read_to_string(dest.join("lib/Dep.dll")).unwrap(), "dll");
    }

    #[test]
    fn test_copy_dir_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = copy_dir_recursive(
            &dir.path().join("nope"),
            &dir.path().join("out"),
            FileExistsPolicy::Overwrite,
        );
        assert!(matches!(result, Err(ActionError::MissingArtifact(_))));
    }

    #[test]
    fn test_glob_files() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("b.json"), "{}");
        write(&dir.path().join("a.json"), "{}");
        write(&dir.path().join("notes.txt"), "");
        write(&dir.path().join("sub/c.exe"), "");

        let json = glob_files(dir.path(), "*.json").unwrap();
        let names: Vec<_> = json
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);

        assert_eq!(glob_files(dir.path(), "**/*.exe").unwrap().len(), 1);
        assert!(glob_files(&dir.path().join("missing"), "*").unwrap().is_empty());
    }
}
