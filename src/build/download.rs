//! Tool bootstrap downloads

use crate::executor::ToolError;
use std::fs;
use std::path::Path;

/// Downloads `url` to `dest` unless `dest` already exists.
///
/// Returns `true` when a download happened.
///
/// # Errors
///
/// Returns [`ToolError::Download`] on network or HTTP failure, or
/// [`ToolError::Io`] if the file cannot be written.
pub fn download_if_missing(url: &str, dest: &Path) -> Result<bool, ToolError> {
    if dest.is_file() {
        tracing::debug!(path = %dest.display(), "Tool already present");
        return Ok(false);
    }
    tracing::info!(url, dest = %dest.display(), "Downloading tool");

    let io_error = |source| ToolError::Io {
        program: dest.to_path_buf(),
        source,
    };
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let download_error = |e: reqwest::Error| ToolError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    };
    let bytes = reqwest::blocking::get(url)
        .and_then(reqwest::blocking::Response::error_for_status)
        .and_then(reqwest::blocking::Response::bytes)
        .map_err(download_error)?;

    fs::write(dest, &bytes).map_err(io_error)?;
    tracing::info!(bytes = bytes.len(), "Downloaded {}", dest.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_existing_file_is_not_downloaded() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("nuget.exe");
        fs::write(&dest, "present").unwrap();

        let downloaded = download_if_missing("http://127.0.0.1:1/never", &dest).unwrap();

        assert!(!downloaded);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "present");
    }

    #[test]
    fn test_unreachable_url_reports_download_error() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("tools/nuget.exe");

        let result = download_if_missing("http://127.0.0.1:1/nuget.exe", &dest);

        assert!(matches!(result, Err(ToolError::Download { .. })));
        assert!(!dest.exists());
    }
}
