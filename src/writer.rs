use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Directory created under the base directory for generated exports.
const EXPORT_DIR_NAME: &str = "project_export";

/// Builds the default destination for an export of `source_dir`.
///
/// The file lands in `<base_dir>/project_export/` and is named after the
/// source directory, lowercased with spaces and dashes turned into
/// underscores: `<name>_<YYYYmmdd_HHMMSS>.txt`, or `<name>_export.txt` when
/// no timestamp is given.
#[must_use]
pub fn default_output_path(
    base_dir: &Path,
    source_dir: &Path,
    timestamp: Option<DateTime<Local>>,
) -> PathBuf {
    let project_name = source_dir
        .file_name()
        .map(|name| {
            name.to_string_lossy()
                .to_lowercase()
                .replace([' ', '-'], "_")
        })
        .unwrap_or_else(|| "project".to_string());

    let filename = match timestamp {
        Some(ts) => format!("{}_{}.txt", project_name, ts.format("%Y%m%d_%H%M%S")),
        None => format!("{project_name}_export.txt"),
    };

    base_dir.join(EXPORT_DIR_NAME).join(filename)
}

/// Persists the assembled document.
pub(crate) struct Writer;

impl Writer {
    /// Writes a file atomically, creating parent directories as needed.
    ///
    /// Content goes to a sibling temporary file which is synced and then
    /// renamed over the target.
    pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let temp_path = temp_path_for(path);
        let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .sync_all()
            .map_err(|e| Error::io(&temp_path, e))?;

        drop(temp_file);

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            Error::io(path, e)
        })?;

        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }
}

/// `export.txt` becomes `export.txt.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
