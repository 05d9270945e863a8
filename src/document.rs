//! Text layout of the exported document.
//!
//! The assembler is pure: it never touches the filesystem and takes its
//! timestamps from the caller, so two runs over the same tree differ only in
//! the `Generated:` and `Export completed:` lines.

use crate::file::FileRecord;
use crate::scanner::ScanEntry;
use num_format::{Locale, ToFormattedString};
use std::fmt::Write as _;

const BANNER_RULE_WIDTH: usize = 100;
const FILE_RULE_WIDTH: usize = 80;

/// Formats a count with `,` thousands separators.
pub(crate) fn thousands(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

/// Final counters written into the trailing summary block.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Files whose content made it into the document
    pub files_processed: usize,
    /// Files excluded, too large, binary or unreadable
    pub files_skipped: usize,
    /// Sum of included bytes, each file capped at the size limit
    pub total_size: u64,
    /// Completion timestamp, already formatted
    pub completed_at: String,
    /// Where the document is (or would be) written
    pub output_file: String,
}

/// Composes the banner, per-file blocks and summary into one string.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    source: String,
    preset_name: String,
    generated_at: String,
}

impl DocumentAssembler {
    /// Creates an assembler for one export.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        preset_name: impl Into<String>,
        generated_at: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            preset_name: preset_name.into(),
            generated_at: generated_at.into(),
        }
    }

    /// Renders the complete document.
    #[must_use]
    pub fn assemble(&self, entries: &[ScanEntry], summary: &Summary) -> String {
        let mut out = String::new();
        self.write_banner(&mut out);

        for entry in entries {
            match entry {
                ScanEntry::Included(record) => write_file_block(&mut out, record),
                ScanEntry::Failed {
                    relative_path,
                    message,
                } => write_error_block(&mut out, relative_path, message),
                ScanEntry::Skipped { .. } => {}
            }
        }

        write_summary(&mut out, summary);
        out
    }

    fn write_banner(&self, out: &mut String) {
        let rule = "=".repeat(BANNER_RULE_WIDTH);
        let _ = write!(
            out,
            "{rule}\n\
             LLM CONTEXT EXPORT\n\
             {rule}\n\
             Generated: {}\n\
             Source: {}\n\
             Preset: {}\n\
             Export Tool: llm-context-builder\n\
             {rule}\n\
             \n\
             INSTRUCTIONS FOR LLM:\n\
             This file contains the complete source code and documentation for a project.\n\
             Each file is clearly marked with headers and footers.\n\
             Use this context to understand the project structure and help with development tasks.\n\
             {rule}\n",
            self.generated_at, self.source, self.preset_name
        );
    }
}

fn write_file_block(out: &mut String, record: &FileRecord) {
    let rule = "=".repeat(FILE_RULE_WIDTH);
    let _ = write!(
        out,
        "\n{rule}\nFILE: {}\nPATH: {}\nSIZE: {} bytes\n{rule}\n",
        record.relative_path,
        record.absolute_path.display(),
        thousands(record.size)
    );
    out.push_str(&record.content);
    let _ = write!(out, "\n{rule}\nEND: {}\n{rule}\n", record.relative_path);
}

fn write_error_block(out: &mut String, relative_path: &str, message: &str) {
    let rule = "=".repeat(FILE_RULE_WIDTH);
    let _ = write!(
        out,
        "\n{rule}\nFILE: {relative_path}\nERROR: {message}\n{rule}\n"
    );
}

fn write_summary(out: &mut String, summary: &Summary) {
    let rule = "=".repeat(BANNER_RULE_WIDTH);
    let _ = write!(
        out,
        "\n\n{rule}\n\
         EXPORT SUMMARY\n\
         {rule}\n\
         Files processed: {}\n\
         Files skipped: {}\n\
         Total content size: {} bytes\n\
         Export completed: {}\n\
         Output file: {}\n\
         {rule}\n",
        thousands(summary.files_processed as u64),
        thousands(summary.files_skipped as u64),
        thousands(summary.total_size),
        summary.completed_at,
        summary.output_file
    );
}
