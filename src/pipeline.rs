use crate::{
    config::Config,
    document::{DocumentAssembler, Summary},
    error::{Error, Result},
    scanner::Scanner,
    writer::{Writer, default_output_path},
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of one export, returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Files whose content was included
    pub files_processed: usize,

    /// Files excluded, too large, binary or unreadable
    pub files_skipped: usize,

    /// Included bytes, each file capped at the size limit
    pub total_size: u64,

    /// Destination of the document
    pub output_file: PathBuf,

    /// Whether the document was actually written
    pub written: bool,

    /// The full document text
    #[serde(skip)]
    pub content: String,
}

/// Orchestrates scan, assembly and write for one configuration.
pub struct Pipeline {
    config: Config,
    output_file: PathBuf,
    scanner: Scanner,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// Without an explicit output file, the document goes to
    /// `project_export/` under the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory is needed for the default
    /// output path and cannot be determined.
    pub fn new(config: Config) -> Result<Self> {
        let output_file = match &config.output_file {
            Some(path) => path.clone(),
            None => {
                let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
                default_output_path(&cwd, &config.root_dir, Some(chrono::Local::now()))
            }
        };

        let scanner = Scanner::new(&config, Some(&output_file));

        Ok(Self {
            config,
            output_file,
            scanner,
        })
    }

    /// Destination the document will be written to.
    #[must_use]
    pub fn output_file(&self) -> &std::path::Path {
        &self.output_file
    }

    /// Executes the export and returns its counters and document.
    ///
    /// # Process
    ///
    /// 1. **Scan**: walks the root, pruning excluded folders and reading files
    /// 2. **Assemble**: renders the banner, file blocks and summary
    /// 3. **Write**: persists the document atomically (skipped in dry run)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Export`] if the walk aborts or the document cannot be
    /// written.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use llm_context_builder::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .root_dir("./my-project")
    ///     .output_file("context.txt")
    ///     .build()?;
    ///
    /// let result = Pipeline::new(config)?.run()?;
    /// println!("{} files exported", result.files_processed);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(root_dir = %self.config.root_dir.display()))]
    pub fn run(self) -> Result<ScanResult> {
        let start_time = Instant::now();
        let generated_at = timestamp();

        info!("Starting export with preset '{}'", self.config.preset);

        info!("Stage 1/3: Scanning directory...");
        let outcome = self.scanner.scan()?;
        info!(
            "✓ Scanned {} files ({} processed, {} skipped) in {:.2}s",
            outcome.entries.len(),
            outcome.files_processed,
            outcome.files_skipped,
            start_time.elapsed().as_secs_f64()
        );

        info!("Stage 2/3: Assembling document...");
        let assembler = DocumentAssembler::new(
            self.config.root_dir.display().to_string(),
            self.config.preset_name(),
            generated_at,
        );
        let summary = Summary {
            files_processed: outcome.files_processed,
            files_skipped: outcome.files_skipped,
            total_size: outcome.total_size,
            completed_at: timestamp(),
            output_file: self.output_file.display().to_string(),
        };
        let content = assembler.assemble(&outcome.entries, &summary);

        let written = if self.config.dry_run {
            warn!("Dry run mode enabled - skipping file write");
            false
        } else {
            info!("Stage 3/3: Writing {}...", self.output_file.display());
            Writer::write_atomic(&self.output_file, &content).map_err(Error::export)?;
            true
        };

        info!(
            "✓ Export completed in {:.2}s",
            start_time.elapsed().as_secs_f64()
        );

        Ok(ScanResult {
            files_processed: outcome.files_processed,
            files_skipped: outcome.files_skipped,
            total_size: outcome.total_size,
            output_file: self.output_file,
            written,
            content,
        })
    }
}

fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetKind;
    use assert_fs::prelude::*;

    fn run(config: Config) -> ScanResult {
        Pipeline::new(config).unwrap().run().unwrap()
    }

    /// Drops the two lines that carry wall-clock time.
    fn without_timestamps(content: &str) -> String {
        content
            .lines()
            .filter(|line| !line.starts_with("Generated: ") && !line.starts_with("Export completed: "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_empty_directory_produces_valid_document() {
        let temp = assert_fs::TempDir::new().unwrap();
        let output = temp.child("out/export.txt");

        let config = Config::builder()
            .root_dir(temp.path())
            .output_file(output.path())
            .dry_run(true)
            .build()
            .unwrap();
        let result = run(config);

        assert_eq!(result.files_processed, 0);
        assert_eq!(result.files_skipped, 0);
        assert!(!result.written);
        assert!(result.content.contains("LLM CONTEXT EXPORT"));
        assert!(result.content.contains("EXPORT SUMMARY"));
        assert!(result.content.contains("Files processed: 0\n"));
        assert!(!result.content.contains("FILE: "));
        assert!(!output.exists());
    }

    #[test]
    fn test_single_markdown_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("notes.md").write_str("0123456789").unwrap();
        let output = temp.child("out/export.txt");

        let config = Config::builder()
            .root_dir(temp.path())
            .output_file(output.path())
            .build()
            .unwrap();
        let result = run(config);

        assert_eq!(result.files_processed, 1);
        assert_eq!(result.files_skipped, 0);
        assert_eq!(result.total_size, 10);
        assert_eq!(result.content.matches("FILE: notes.md\n").count(), 1);
        assert_eq!(result.content.matches("END: notes.md\n").count(), 1);
        assert!(result.content.contains("SIZE: 10 bytes\n"));
        assert!(result.content.contains("Preset: Minimal Export\n"));
        assert!(result.written);
        output.assert(result.content.as_str());
    }

    #[test]
    fn test_excluded_subtree_is_never_read() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.js").write_str("export const a = 1;").unwrap();
        temp.child("node_modules/x.js")
            .write_binary(&[0xff, 0xfe, 0x00, 0xc3])
            .unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .preset(PresetKind::Web)
            .dry_run(true)
            .build()
            .unwrap();
        let result = run(config);

        assert_eq!(result.files_processed, 1);
        assert_eq!(result.files_skipped, 0);
        assert!(!result.content.contains("node_modules"));
    }

    #[test]
    fn test_export_is_idempotent_apart_from_timestamps() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("README.md").write_str("# Demo\n").unwrap();
        temp.child("docs/guide.md").write_str("Guide").unwrap();
        temp.child("config.yaml").write_str("key: value\n").unwrap();

        let build = || {
            Config::builder()
                .root_dir(temp.path())
                .output_file(temp.path().join("export.txt"))
                .dry_run(true)
                .build()
                .unwrap()
        };

        let first = run(build());
        let second = run(build());

        assert_eq!(
            without_timestamps(&first.content),
            without_timestamps(&second.content)
        );
        assert_eq!(first.files_processed, 3);
    }

    #[test]
    fn test_output_inside_tree_is_not_exported() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.txt").write_str("alpha").unwrap();
        let output = temp.child("context.txt");

        let build = || {
            Config::builder()
                .root_dir(temp.path())
                .output_file(output.path())
                .build()
                .unwrap()
        };

        let first = run(build());
        assert_eq!(first.files_processed, 1);

        // The first export now exists inside the scanned tree
        let second = run(build());
        assert_eq!(second.files_processed, 1);
        assert_eq!(second.files_skipped, 0);
        assert!(!second.content.contains("FILE: context.txt"));
    }

    #[test]
    fn test_truncation_in_document() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("big.txt").write_str(&"z".repeat(1_500)).unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .max_file_size(1_000)
            .dry_run(true)
            .output_file(temp.path().join("out.txt"))
            .build()
            .unwrap();
        let result = run(config);

        assert_eq!(result.total_size, 1_000);
        assert!(result.content.contains("SIZE: 1,500 bytes\n"));
        assert!(result.content.contains("[... truncated 500 bytes ...]\n"));
        assert!(result.content.contains("Total content size: 1,000 bytes\n"));
    }

    #[test]
    fn test_write_failure_is_export_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("a").unwrap();
        temp.child("blocker").write_str("not a directory").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .output_file(temp.path().join("blocker/out.txt"))
            .build()
            .unwrap();
        let err = Pipeline::new(config).unwrap().run().unwrap_err();

        assert!(err.is_export());
        assert!(err.to_string().starts_with("Export failed: Cannot access"));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_renders_error_block() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("alive").unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone.md"), temp.path().join("link.md"))
            .unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .output_file(temp.path().join("out.txt"))
            .dry_run(true)
            .build()
            .unwrap();
        let result = run(config);

        assert_eq!(result.files_processed, 1);
        assert_eq!(result.files_skipped, 1);
        assert!(result.content.contains("FILE: link.md\nERROR: "));
        assert!(result.content.contains("Files skipped: 1\n"));
    }

    #[test]
    fn test_result_serialization_omits_content() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .root_dir(temp.path())
            .output_file(temp.path().join("out.txt"))
            .dry_run(true)
            .build()
            .unwrap();
        let result = run(config);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["files_processed"], 0);
        assert_eq!(json["written"], false);
        assert!(json.get("content").is_none());
    }
}
