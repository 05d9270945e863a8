use crate::document::thousands;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// How many leading bytes are decoded to decide whether a file is text.
const TEXT_PROBE_BYTES: u64 = 1024;

const BINARY_SENTINEL: &str = "[BINARY FILE - Cannot display content as text]";
const PERMISSION_SENTINEL: &str = "[PERMISSION DENIED - Cannot read file]";

/// A file accepted into the export.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// Path relative to the scanned root
    pub relative_path: String,

    /// Absolute path to the file
    pub absolute_path: PathBuf,

    /// Size on disk in bytes
    pub size: u64,

    /// Content, possibly truncated or replaced by a sentinel message.
    /// Always ends with a line break.
    pub content: String,
}

impl FileRecord {
    /// Creates a record, appending a trailing line break when missing.
    #[must_use]
    pub fn new(
        relative_path: String,
        absolute_path: PathBuf,
        size: u64,
        mut content: String,
    ) -> Self {
        if !content.ends_with('\n') {
            content.push('\n');
        }

        Self {
            relative_path,
            absolute_path,
            size,
            content,
        }
    }

    /// Returns the number of lines in the recorded content.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Decodes the first kilobyte of a file as UTF-8.
///
/// A multi-byte sequence cut off by the probe boundary still counts as
/// text. Permission errors answer `false`; any other I/O failure is returned.
pub(crate) fn is_text_file(path: &Path) -> io::Result<bool> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => return Ok(false),
        Err(e) => return Err(e),
    };

    let mut sample = Vec::with_capacity(TEXT_PROBE_BYTES as usize);
    match file.take(TEXT_PROBE_BYTES).read_to_end(&mut sample) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => return Ok(false),
        Err(e) => return Err(e),
    }

    Ok(match std::str::from_utf8(&sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    })
}

/// Reads at most `max_size` bytes of text and appends a truncation notice
/// when the file is larger.
///
/// Never fails: decode and permission problems become sentinel text so the
/// file still appears in the document.
pub(crate) fn read_content(path: &Path, size: u64, max_size: u64) -> String {
    match read_prefix(path, max_size) {
        Ok(mut content) => {
            if size > max_size {
                content.push_str(&format!(
                    "\n\n[... truncated {} bytes ...]",
                    thousands(size - max_size)
                ));
            }
            content
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => BINARY_SENTINEL.to_string(),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => PERMISSION_SENTINEL.to_string(),
        Err(e) => format!("[ERROR reading file: {e}]"),
    }
}

fn read_prefix(path: &Path, limit: u64) -> io::Result<String> {
    let file = File::open(path)?;
    let mut bytes = Vec::new();
    file.take(limit).read_to_end(&mut bytes)?;

    let hit_limit = bytes.len() as u64 == limit;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        // The cut landed inside a multi-byte character: keep the whole ones
        Err(e) if hit_limit && e.utf8_error().error_len().is_none() => {
            let valid = e.utf8_error().valid_up_to();
            let mut bytes = e.into_bytes();
            bytes.truncate(valid);
            String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }
        Err(e) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
    }
}
