use crate::{
    config::Config,
    error::{Error, Result},
    file::{self, FileRecord},
    rules::{ExclusionReason, RuleSet},
};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Why a visited file stayed out of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Rejected by the rule set
    Excluded(ExclusionReason),
    /// Larger than twice the size limit
    TooLarge {
        /// Size on disk
        size: u64,
        /// Configured per-file limit
        limit: u64,
    },
    /// The leading bytes do not decode as UTF-8, or the file cannot be opened
    NotText,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluded(reason) => reason.fmt(f),
            Self::TooLarge { size, limit } => {
                write!(f, "too large ({size} bytes, limit {limit})")
            }
            Self::NotText => f.write_str("binary or unreadable"),
        }
    }
}

/// One visited file, in traversal order.
#[derive(Debug, Clone)]
pub enum ScanEntry {
    /// Content goes into the document
    Included(FileRecord),
    /// Counted as skipped, not written
    Skipped {
        /// Path relative to the root
        relative_path: String,
        /// Decision that kept it out
        reason: SkipReason,
    },
    /// Unexpected I/O failure; written as an inline error block
    Failed {
        /// Path relative to the root
        relative_path: String,
        /// Error text
        message: String,
    },
}

/// Counters and entries collected by one traversal.
#[derive(Debug, Default, Clone)]
pub struct ScanOutcome {
    /// Every visited file, in traversal order
    pub entries: Vec<ScanEntry>,
    /// Files whose content was included
    pub files_processed: usize,
    /// Files skipped or failed
    pub files_skipped: usize,
    /// Sum of `min(size, max_file_size)` over included files
    pub total_size: u64,
}

impl ScanOutcome {
    fn include(&mut self, record: FileRecord, counted_bytes: u64) {
        self.files_processed += 1;
        self.total_size += counted_bytes;
        self.entries.push(ScanEntry::Included(record));
    }

    fn skip(&mut self, relative_path: String, reason: SkipReason) {
        self.files_skipped += 1;
        self.entries.push(ScanEntry::Skipped {
            relative_path,
            reason,
        });
    }

    fn fail(&mut self, relative_path: String, message: String) {
        self.files_skipped += 1;
        self.entries.push(ScanEntry::Failed {
            relative_path,
            message,
        });
    }

    /// Iterates over the included records.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.entries.iter().filter_map(|entry| match entry {
            ScanEntry::Included(record) => Some(record),
            _ => None,
        })
    }
}

/// Walks the root directory and decides the fate of every file.
pub(crate) struct Scanner {
    root_dir: PathBuf,
    rules: RuleSet,
    output_identity: Option<PathBuf>,
}

impl Scanner {
    /// Creates a new scanner from configuration.
    ///
    /// The output file is resolved once here; a file that does not exist yet
    /// cannot be recognised during the walk.
    pub(crate) fn new(config: &Config, output_file: Option<&Path>) -> Self {
        let output_identity = output_file.and_then(|path| fs::canonicalize(path).ok());

        Self {
            root_dir: config.root_dir.clone(),
            rules: config.rules.clone(),
            output_identity,
        }
    }

    /// Walks the tree and returns every per-file decision.
    ///
    /// Excluded folders are pruned before descent. Per-file problems are
    /// recorded in the outcome and never abort the walk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Export`] if the root itself cannot be read.
    pub(crate) fn scan(&self) -> Result<ScanOutcome> {
        let mut outcome = ScanOutcome::default();

        debug!("Starting scan of {}", self.root_dir.display());

        let walker = WalkDir::new(&self.root_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry));

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(Error::export(Error::from(e))),
                Err(e) => {
                    warn!("Walk error: {}", e);
                    continue;
                }
            };

            if !is_file(&entry) {
                continue;
            }

            if self.is_output_file(entry.path()) {
                trace!("Skipping the export file itself: {}", entry.path().display());
                continue;
            }

            self.visit(&entry, &mut outcome);
        }

        debug!(
            "Scan complete: {} processed, {} skipped, {} bytes",
            outcome.files_processed, outcome.files_skipped, outcome.total_size
        );

        Ok(outcome)
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }

        let pruned = self
            .rules
            .should_exclude_folder(&entry.file_name().to_string_lossy());
        if pruned {
            debug!("Pruning folder: {}", entry.path().display());
        }
        pruned
    }

    fn is_output_file(&self, path: &Path) -> bool {
        self.output_identity
            .as_deref()
            .is_some_and(|output| fs::canonicalize(path).is_ok_and(|p| p == output))
    }

    fn visit(&self, entry: &DirEntry, outcome: &mut ScanOutcome) {
        let path = entry.path();
        let relative_path = relative_path(path, &self.root_dir);

        trace!("Processing file: {}", relative_path);

        if let Some(reason) = self.rules.should_exclude_file(path) {
            debug!("Skipping {}: {}", relative_path, reason);
            outcome.skip(relative_path, SkipReason::Excluded(reason));
            return;
        }

        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                warn!("Failed to stat {}: {}", relative_path, e);
                outcome.fail(relative_path, e.to_string());
                return;
            }
        };

        let limit = self.rules.max_file_size();
        if size > limit.saturating_mul(2) {
            debug!("Skipping {}: {} bytes exceeds twice the limit", relative_path, size);
            outcome.skip(relative_path, SkipReason::TooLarge { size, limit });
            return;
        }

        match file::is_text_file(path) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Skipping non-text file: {}", relative_path);
                outcome.skip(relative_path, SkipReason::NotText);
                return;
            }
            Err(e) => {
                warn!("Failed to probe {}: {}", relative_path, e);
                outcome.fail(relative_path, e.to_string());
                return;
            }
        }

        let content = file::read_content(path, size, limit);
        let record = FileRecord::new(relative_path, path.to_path_buf(), size, content);
        trace!("Included {} ({} lines)", record.relative_path, record.line_count());
        outcome.include(record, size.min(limit));
    }
}

/// Regular files, plus any symlink that does not resolve to a directory.
/// Dangling links are visited so their stat failure is recorded.
fn is_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && !entry.path().is_dir())
}

fn relative_path(path: &Path, root: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetKind;
    use assert_fs::prelude::*;

    fn scan_with(config: &Config) -> ScanOutcome {
        Scanner::new(config, config.output_file.as_deref())
            .scan()
            .unwrap()
    }

    fn full_config(root: &Path) -> Config {
        Config::builder()
            .root_dir(root)
            .preset(PresetKind::Full)
            .build()
            .unwrap()
    }

    fn included_paths(outcome: &ScanOutcome) -> Vec<String> {
        outcome
            .records()
            .map(|r| r.relative_path.replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_scanner_empty_directory() {
        let temp = assert_fs::TempDir::new().unwrap();

        let outcome = scan_with(&full_config(temp.path()));

        assert_eq!(outcome.files_processed, 0);
        assert_eq!(outcome.files_skipped, 0);
        assert_eq!(outcome.total_size, 0);
        assert!(outcome.entries.is_empty());
    }

    #[test]
    fn test_scanner_nested_directories_sorted() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("src/main.rs").write_str("fn main() {}").unwrap();
        temp.child("src/lib.rs").write_str("pub fn test() {}").unwrap();
        temp.child("README.md").write_str("# readme").unwrap();

        let outcome = scan_with(&full_config(temp.path()));

        assert_eq!(
            included_paths(&outcome),
            vec!["README.md", "src/lib.rs", "src/main.rs"]
        );
        assert_eq!(outcome.files_processed, 3);
    }

    #[test]
    fn test_scanner_prunes_before_descent() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.js").write_str("let a = 1;").unwrap();
        // Would be counted as skipped (not text) if the folder were visited
        temp.child("node_modules/x.js")
            .write_binary(&[0xff, 0xfe, 0xfd])
            .unwrap();

        let outcome = scan_with(&full_config(temp.path()));

        assert_eq!(included_paths(&outcome), vec!["a.js"]);
        assert_eq!(outcome.files_skipped, 0);
        assert_eq!(outcome.entries.len(), 1);
    }

    #[test]
    fn test_scanner_prunes_user_folder_patterns() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("keep/a.md").write_str("keep").unwrap();
        temp.child("generated_v1/b.md").write_str("drop").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .exclude_folders(["generated_*"])
            .build()
            .unwrap();
        let outcome = scan_with(&config);

        assert_eq!(included_paths(&outcome), vec!["keep/a.md"]);
    }

    #[test]
    fn test_scanner_counts_exclusions() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("notes.md").write_str("notes").unwrap();
        temp.child("main.rs").write_str("fn main() {}").unwrap();
        temp.child("photo.png").write_binary(&[0x89, 0x50]).unwrap();

        // Minimal preset admits markdown only among these
        let config = Config::builder().root_dir(temp.path()).build().unwrap();
        let outcome = scan_with(&config);

        assert_eq!(outcome.files_processed, 1);
        assert_eq!(outcome.files_skipped, 2);
        assert!(outcome.entries.iter().any(|e| matches!(
            e,
            ScanEntry::Skipped { relative_path, reason: SkipReason::Excluded(ExclusionReason::NotIncluded { .. }) }
                if relative_path == "main.rs"
        )));
    }

    #[test]
    fn test_scanner_skips_binary_content() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("text.txt").write_str("hello").unwrap();
        temp.child("data.txt").write_binary(&[0xc3, 0x28, 0xa0, 0xa1]).unwrap();

        let outcome = scan_with(&full_config(temp.path()));

        assert_eq!(included_paths(&outcome), vec!["text.txt"]);
        assert_eq!(outcome.files_skipped, 1);
        assert!(outcome.entries.iter().any(|e| matches!(
            e,
            ScanEntry::Skipped { reason: SkipReason::NotText, .. }
        )));
    }

    #[test]
    fn test_scanner_truncation_and_size_limits() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("small.txt").write_str(&"a".repeat(50)).unwrap();
        temp.child("medium.txt").write_str(&"b".repeat(150)).unwrap();
        temp.child("huge.txt").write_str(&"c".repeat(201)).unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .preset(PresetKind::Full)
            .max_file_size(100)
            .build()
            .unwrap();
        let outcome = scan_with(&config);

        assert_eq!(included_paths(&outcome), vec!["medium.txt", "small.txt"]);
        assert_eq!(outcome.files_skipped, 1);
        assert_eq!(outcome.total_size, 150);

        let medium = outcome
            .records()
            .find(|r| r.relative_path == "medium.txt")
            .unwrap();
        assert_eq!(medium.size, 150);
        assert!(medium.content.starts_with(&"b".repeat(100)));
        assert!(!medium.content.starts_with(&"b".repeat(101)));
        assert!(medium.content.ends_with("[... truncated 50 bytes ...]\n"));
    }

    #[test]
    fn test_scanner_exactly_twice_limit_is_kept() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("edge.txt").write_str(&"e".repeat(200)).unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .preset(PresetKind::Full)
            .max_file_size(100)
            .build()
            .unwrap();
        let outcome = scan_with(&config);

        assert_eq!(outcome.files_processed, 1);
        assert_eq!(outcome.total_size, 100);
    }

    #[test]
    fn test_scanner_skips_existing_output_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("a").unwrap();
        let output = temp.child("out/export.md");
        output.write_str("previous export").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .output_file(output.path())
            .build()
            .unwrap();
        let outcome = scan_with(&config);

        assert_eq!(included_paths(&outcome), vec!["a.md"]);
        assert_eq!(outcome.files_skipped, 0);
    }

    #[test]
    fn test_scanner_adds_trailing_newline() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("no newline").unwrap();

        let outcome = scan_with(&full_config(temp.path()));
        let record = outcome.records().next().unwrap();

        assert_eq!(record.content, "no newline\n");
        assert!(record.absolute_path.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_scanner_records_dangling_symlink_as_failure() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.txt").write_str("alive").unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing.txt"), temp.path().join("link.txt"))
            .unwrap();

        let outcome = scan_with(&full_config(temp.path()));

        assert_eq!(outcome.files_processed, 1);
        assert_eq!(outcome.files_skipped, 1);
        assert!(outcome.entries.iter().any(|entry| matches!(
            entry,
            ScanEntry::Failed { relative_path, .. } if relative_path == "link.txt"
        )));
    }

    #[cfg(unix)]
    #[test]
    fn test_scanner_does_not_descend_linked_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("real/inner.txt").write_str("inner").unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("alias"))
            .unwrap();

        let outcome = scan_with(&full_config(temp.path()));

        assert_eq!(included_paths(&outcome), vec!["real/inner.txt"]);
        assert_eq!(outcome.files_skipped, 0);
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::TooLarge {
            size: 300,
            limit: 100,
        };
        assert_eq!(reason.to_string(), "too large (300 bytes, limit 100)");
        assert_eq!(SkipReason::NotText.to_string(), "binary or unreadable");
    }
}
