//! Include/exclude rules for files and folders.
//!
//! Patterns use shell-glob semantics (`*`, `?`, `[...]`) and are matched
//! against a single path component. Every pattern is tried twice: once as
//! written against the literal name, and once lowercased against the
//! lowercased name, so `Thumbs.db` and `THUMBS.DB` behave the same on any
//! platform.

use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::fmt;
use std::path::Path;

/// Default per-file truncation threshold when neither preset nor user sets one.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_000_000;

const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[
    // Images
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".svg", ".webp", ".tiff",
    // Video
    ".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm", ".mkv", ".m4v",
    // Audio
    ".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a",
    // Archives
    ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".dmg", ".iso",
    // Executables
    ".exe", ".dll", ".so", ".dylib", ".app", ".deb", ".rpm",
    // Office documents
    ".doc", ".xls", ".ppt", ".docx", ".xlsx", ".pptx", ".pdf",
    // Other binary
    ".bin", ".dat", ".db", ".sqlite", ".sqlite3", ".pyc", ".pyo", ".class",
    // Fonts
    ".ttf", ".otf", ".woff", ".woff2", ".eot",
    // Cache/temp
    ".cache", ".tmp", ".temp",
];

const DEFAULT_EXCLUDED_FOLDERS: &[&str] = &[
    // Version control
    ".git", ".svn", ".hg", ".bzr",
    // Build/cache
    "__pycache__", "node_modules", ".cache", "build", "dist", "target",
    // Virtual environments
    "venv", "env", ".venv", ".env", "virtualenv",
    // Test/coverage
    "test_*", "tests_*", "*_test", "*_tests", "coverage", ".nyc_output", ".pytest_cache",
    // IDE/editor
    ".vscode", ".idea", ".vs", ".sublime-project", ".sublime-workspace",
    // OS
    ".DS_Store", "Thumbs.db", "$RECYCLE.BIN",
    // Previous exports
    "project_export", "exports", "combined_*",
    // Dependencies
    "vendor", "packages", "bower_components",
    // Logs
    "logs", "log",
];

const DEFAULT_EXCLUDED_FILES: &[&str] = &[
    // Logs
    "*.log", "*.logs",
    // Temporary files
    "*.tmp", "*.temp", "*~", ".#*", "*.swp", "*.swo",
    // OS files
    ".DS_Store", "Thumbs.db", "desktop.ini",
    // Lock files
    "*.lock", "package-lock.json", "yarn.lock", "Pipfile.lock", "poetry.lock",
    // Environment files (may contain secrets)
    ".env", ".env.*", "*.env",
    // IDE files
    "*.sublime-project", "*.sublime-workspace",
    // Minified/bundled assets
    "*.min.js", "*.min.css", "*.bundle.js", "*.bundle.css",
    // Exporter scripts
    "export_project.py", "llm_context_builder.py",
];

/// Why a file was left out of the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// An allow-list is configured and the extension is not on it
    NotIncluded {
        /// Lowercased extension with leading dot (empty when none)
        extension: String,
    },
    /// The extension is on the exclusion list
    ExcludedExtension {
        /// Lowercased extension with leading dot
        extension: String,
    },
    /// The file name matched an exclusion pattern
    ExcludedPattern {
        /// The first pattern that matched
        pattern: String,
    },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotIncluded { extension } => write!(f, "not in include list ({extension})"),
            Self::ExcludedExtension { extension } => write!(f, "excluded extension ({extension})"),
            Self::ExcludedPattern { pattern } => write!(f, "excluded pattern ({pattern})"),
        }
    }
}

/// An ordered list of glob patterns compiled for dual-case matching.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    literal: GlobSet,
    lowered: GlobSet,
}

impl PatternSet {
    /// Compiles `patterns`, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if any pattern is not a valid glob.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let literal = build_globset(patterns.iter().map(String::as_str))?;
        let lowercase: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();
        let lowered = build_globset(lowercase.iter().map(String::as_str))?;

        Ok(Self {
            patterns,
            literal,
            lowered,
        })
    }

    /// Returns the earliest pattern matching `name`, trying the literal name
    /// first and then the lowercased name against the lowercased pattern.
    #[must_use]
    pub fn matches_any_pattern(&self, name: &str) -> Option<&str> {
        let literal = self.literal.matches(name);
        let lowered = self.lowered.matches(name.to_lowercase());

        literal
            .into_iter()
            .chain(lowered)
            .min()
            .map(|index| self.patterns[index].as_str())
    }

    /// Returns true if any pattern matches `name`.
    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.matches_any_pattern(name).is_some()
    }

    /// The patterns in evaluation order.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

fn build_globset<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        // fnmatch semantics: a backslash is an ordinary character
        let glob = GlobBuilder::new(&shell_pattern(pattern))
            .backslash_escape(false)
            .build()
            .map_err(|e| Error::invalid_pattern(pattern, e.kind().to_string()))?;
        builder.add(glob);
    }

    builder
        .build()
        .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))
}

/// Rewrites a shell pattern so globset reads it the way `fnmatch` does.
///
/// Braces carry no alternation and are matched literally, as is a `[` that
/// never closes. Complete character classes pass through unchanged.
fn shell_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut translated = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' => translated.push_str("[{]"),
            '}' => translated.push_str("[}]"),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    translated.extend(&chars[i..=end]);
                    i = end;
                }
                None => translated.push_str("[[]"),
            },
            c => translated.push(c),
        }
        i += 1;
    }

    translated
}

/// Index of the `]` closing the class opened at `start`. A `]` right after
/// the opening bracket (or after `!`) is a member, not the terminator.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut member = start + 1;
    if chars.get(member) == Some(&'!') {
        member += 1;
    }
    if chars.get(member) == Some(&']') {
        member += 1;
    }

    chars
        .get(member..)?
        .iter()
        .position(|&c| c == ']')
        .map(|offset| member + offset)
}

/// Normalises a user-supplied extension to lowercase with a leading dot.
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Returns the lowercased extension of `path` with its leading dot, or an
/// empty string when the file has none.
#[must_use]
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Immutable filtering decisions for one export.
///
/// Built once from defaults, a preset and user overrides (see
/// [`RuleSetBuilder`]); answers yes/no questions with no side effects.
#[derive(Debug, Clone)]
pub struct RuleSet {
    include_extensions: Option<Vec<String>>,
    exclude_extensions: Vec<String>,
    exclude_folders: PatternSet,
    exclude_files: PatternSet,
    max_file_size: u64,
}

impl RuleSet {
    /// Creates a builder with no user rules.
    #[must_use]
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// Returns true if a directory with this name must not be descended into.
    #[must_use]
    pub fn should_exclude_folder(&self, name: &str) -> bool {
        self.exclude_folders.is_match(name)
    }

    /// Decides whether a file is left out, and why.
    ///
    /// The allow-list is consulted first and short-circuits the rest; then
    /// the extension exclusions; then the file name patterns. `None` means
    /// the file is included.
    #[must_use]
    pub fn should_exclude_file(&self, path: &Path) -> Option<ExclusionReason> {
        let extension = extension_of(path);

        if let Some(ref include) = self.include_extensions {
            if !include.contains(&extension) {
                return Some(ExclusionReason::NotIncluded { extension });
            }
        }

        if self.exclude_extensions.contains(&extension) {
            return Some(ExclusionReason::ExcludedExtension { extension });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        self.exclude_files
            .matches_any_pattern(&name)
            .map(|pattern| ExclusionReason::ExcludedPattern {
                pattern: pattern.to_string(),
            })
    }

    /// Truncation threshold in bytes.
    #[must_use]
    pub const fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// The extension allow-list, if one is configured.
    #[must_use]
    pub fn include_extensions(&self) -> Option<&[String]> {
        self.include_extensions.as_deref()
    }

    /// Folder patterns in evaluation order, built-in defaults last.
    #[must_use]
    pub fn exclude_folders(&self) -> &[String] {
        self.exclude_folders.patterns()
    }

    /// File patterns in evaluation order, built-in defaults last.
    #[must_use]
    pub fn exclude_files(&self) -> &[String] {
        self.exclude_files.patterns()
    }
}

/// Builder for a [`RuleSet`].
///
/// User rules are evaluated before the built-in defaults, which are always
/// appended and can't be removed.
#[derive(Debug, Clone, Default)]
pub struct RuleSetBuilder {
    include_extensions: Option<Vec<String>>,
    exclude_extensions: Vec<String>,
    exclude_folders: Vec<String>,
    exclude_files: Vec<String>,
    max_file_size: Option<u64>,
}

impl RuleSetBuilder {
    /// Replaces the extension allow-list. `None` or an empty list admits
    /// every extension.
    #[must_use]
    pub fn include_extensions<I, S>(mut self, extensions: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include_extensions = extensions.map(|exts| {
            exts.into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .collect()
        });
        self
    }

    /// Appends extensions to exclude.
    #[must_use]
    pub fn exclude_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_extensions
            .extend(extensions.into_iter().map(|e| normalize_extension(e.as_ref())));
        self
    }

    /// Appends folder name patterns to exclude.
    #[must_use]
    pub fn exclude_folders<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_folders.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Appends file name patterns to exclude.
    #[must_use]
    pub fn exclude_files<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_files.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the truncation threshold in bytes.
    #[must_use]
    pub const fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Appends the built-in defaults and compiles every pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid or the size limit is zero.
    pub fn build(self) -> Result<RuleSet> {
        let max_file_size = self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE);
        if max_file_size == 0 {
            return Err(Error::config("max_file_size must be greater than 0"));
        }

        let mut exclude_extensions = self.exclude_extensions;
        exclude_extensions.extend(DEFAULT_EXCLUDED_EXTENSIONS.iter().map(|e| (*e).to_string()));

        let mut exclude_folders = self.exclude_folders;
        exclude_folders.extend(DEFAULT_EXCLUDED_FOLDERS.iter().map(|p| (*p).to_string()));

        let mut exclude_files = self.exclude_files;
        exclude_files.extend(DEFAULT_EXCLUDED_FILES.iter().map(|p| (*p).to_string()));

        Ok(RuleSet {
            // An empty allow-list admits everything, same as none
            include_extensions: self.include_extensions.filter(|list| !list.is_empty()),
            exclude_extensions,
            exclude_folders: PatternSet::new(exclude_folders)?,
            exclude_files: PatternSet::new(exclude_files)?,
            max_file_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> RuleSet {
        RuleSet::builder().build().unwrap()
    }

    #[test]
    fn test_default_folders_are_pruned() {
        let rules = defaults();
        assert!(rules.should_exclude_folder("node_modules"));
        assert!(rules.should_exclude_folder(".git"));
        assert!(rules.should_exclude_folder("test_fixtures"));
        assert!(rules.should_exclude_folder("combined_2024"));
        assert!(!rules.should_exclude_folder("src"));
    }

    #[test]
    fn test_folder_match_is_case_tolerant() {
        let rules = RuleSet::builder()
            .exclude_folders(["Generated"])
            .build()
            .unwrap();

        assert!(rules.should_exclude_folder("Generated"));
        assert!(rules.should_exclude_folder("GENERATED"));
        assert!(rules.should_exclude_folder("NODE_MODULES"));
    }

    #[test]
    fn test_allow_list_dominates() {
        let rules = RuleSet::builder()
            .include_extensions(Some([".rs"]))
            .build()
            .unwrap();

        assert_eq!(rules.should_exclude_file(Path::new("src/main.rs")), None);
        assert_eq!(
            rules.should_exclude_file(Path::new("README.md")),
            Some(ExclusionReason::NotIncluded {
                extension: ".md".to_string()
            })
        );
        // Not even reaching the extension check
        assert_eq!(
            rules.should_exclude_file(Path::new("logo.png")),
            Some(ExclusionReason::NotIncluded {
                extension: ".png".to_string()
            })
        );
        assert!(rules.should_exclude_file(Path::new("Makefile")).is_some());
    }

    #[test]
    fn test_allow_list_is_case_insensitive_on_extension() {
        let rules = RuleSet::builder()
            .include_extensions(Some(["MD", "txt"]))
            .build()
            .unwrap();

        assert_eq!(rules.should_exclude_file(Path::new("NOTES.MD")), None);
        assert_eq!(rules.should_exclude_file(Path::new("a.txt")), None);
    }

    #[test]
    fn test_excluded_extension() {
        let rules = defaults();
        let reason = rules.should_exclude_file(Path::new("photo.JPG")).unwrap();
        assert_eq!(reason.to_string(), "excluded extension (.jpg)");
    }

    #[test]
    fn test_user_extension_exclusion() {
        let rules = RuleSet::builder()
            .exclude_extensions(["csv"])
            .build()
            .unwrap();

        assert_eq!(
            rules.should_exclude_file(Path::new("data.csv")),
            Some(ExclusionReason::ExcludedExtension {
                extension: ".csv".to_string()
            })
        );
    }

    #[test]
    fn test_name_pattern_applies_inside_allow_list() {
        let rules = RuleSet::builder()
            .include_extensions(Some([".js"]))
            .build()
            .unwrap();

        let reason = rules.should_exclude_file(Path::new("app.min.js")).unwrap();
        assert_eq!(
            reason,
            ExclusionReason::ExcludedPattern {
                pattern: "*.min.js".to_string()
            }
        );
        assert_eq!(rules.should_exclude_file(Path::new("app.js")), None);
    }

    #[test]
    fn test_user_patterns_reported_before_defaults() {
        let rules = RuleSet::builder()
            .exclude_files(["debug*"])
            .build()
            .unwrap();

        let reason = rules.should_exclude_file(Path::new("debug.log")).unwrap();
        assert_eq!(reason.to_string(), "excluded pattern (debug*)");
    }

    #[test]
    fn test_pattern_lowercase_fallback() {
        let set = PatternSet::new(["*.LOG"]).unwrap();
        assert_eq!(set.matches_any_pattern("server.log"), Some("*.LOG"));
        assert_eq!(set.matches_any_pattern("SERVER.LOG"), Some("*.LOG"));
        assert_eq!(set.matches_any_pattern("server.txt"), None);
    }

    #[test]
    fn test_character_classes_and_wildcards() {
        let set = PatternSet::new(["file[0-9].txt", "?.md"]).unwrap();
        assert!(set.is_match("file7.txt"));
        assert!(!set.is_match("fileA.txt"));
        assert!(set.is_match("a.md"));
        assert!(!set.is_match("ab.md"));
    }

    #[test]
    fn test_braces_are_literal() {
        let set = PatternSet::new(["{a,b}.txt"]).unwrap();
        assert!(set.is_match("{a,b}.txt"));
        assert!(!set.is_match("a.txt"));
        assert!(!set.is_match("b.txt"));

        let rules = RuleSet::builder()
            .exclude_folders(["{{cookiecutter.project_slug}}"])
            .build()
            .unwrap();
        assert!(rules.should_exclude_folder("{{cookiecutter.project_slug}}"));
        assert!(!rules.should_exclude_folder("project_slug"));
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        let rules = RuleSet::builder()
            .exclude_files(["[draft*"])
            .build()
            .unwrap();

        assert_eq!(
            rules.should_exclude_file(Path::new("[draft] notes.txt")),
            Some(ExclusionReason::ExcludedPattern {
                pattern: "[draft*".to_string()
            })
        );
        assert_eq!(rules.should_exclude_file(Path::new("draft.txt")), None);
    }

    #[test]
    fn test_closing_bracket_as_class_member() {
        let set = PatternSet::new(["[]x].md", "[!]]"]).unwrap();
        assert!(set.is_match("].md"));
        assert!(set.is_match("x.md"));
        assert!(set.is_match("q"));
        assert!(!set.is_match("]"));
    }

    #[test]
    fn test_shell_pattern_translation() {
        assert_eq!(shell_pattern("*.{js,ts}"), "*.[{]js,ts[}]");
        assert_eq!(shell_pattern("[draft"), "[[]draft");
        assert_eq!(shell_pattern("file[0-9].txt"), "file[0-9].txt");
        assert_eq!(shell_pattern("[!a]"), "[!a]");
        assert_eq!(shell_pattern("["), "[[]");
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = RuleSet::builder()
            .exclude_files(["file[z-a].txt"])
            .build()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_zero_size_limit_rejected() {
        assert!(RuleSet::builder().max_file_size(0).build().is_err());
    }

    #[test]
    fn test_defaults_are_appended() {
        let rules = RuleSet::builder()
            .exclude_folders(["fixtures"])
            .build()
            .unwrap();

        assert_eq!(rules.exclude_folders()[0], "fixtures");
        assert!(rules.exclude_folders().iter().any(|p| p == "node_modules"));
        assert_eq!(rules.max_file_size(), DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("PY"), ".py");
        assert_eq!(normalize_extension(".Rs"), ".rs");
        assert_eq!(normalize_extension(""), "");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b/archive.TAR.GZ")), ".gz");
        assert_eq!(extension_of(Path::new("Makefile")), "");
        assert_eq!(extension_of(Path::new(".bashrc")), "");
    }
}
