use crate::error::{Error, Result};
use crate::preset::PresetKind;
use crate::rules::RuleSet;
use std::path::PathBuf;

/// Configuration for one export.
///
/// Use [`Config::builder()`] to construct a new configuration. The rule set
/// is merged from three layers in a fixed order: built-in defaults, the
/// chosen preset, then explicit overrides.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Canonical root directory to scan
    pub root_dir: PathBuf,

    /// Destination of the document; excluded from its own scan if it exists
    pub output_file: Option<PathBuf>,

    /// Preset whose rules form the middle layer
    pub preset: PresetKind,

    /// Merged filtering rules
    pub rules: RuleSet,

    /// Assemble the document without writing it
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use llm_context_builder::{Config, PresetKind};
    ///
    /// let config = Config::builder()
    ///     .root_dir("./my-project")
    ///     .preset(PresetKind::Web)
    ///     .exclude_folders(["fixtures"])
    ///     .max_file_size(50_000)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Display name of the preset, as written into the document banner.
    #[must_use]
    pub fn preset_name(&self) -> &'static str {
        self.preset.preset().name
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    root_dir: Option<PathBuf>,
    output_file: Option<PathBuf>,
    preset: Option<PresetKind>,
    include_extensions: Option<Vec<String>>,
    exclude_extensions: Vec<String>,
    exclude_folders: Vec<String>,
    exclude_files: Vec<String>,
    max_file_size: Option<u64>,
    dry_run: bool,
}

impl ConfigBuilder {
    /// Sets the root directory to scan.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(path.into());
        self
    }

    /// Sets the output document path.
    #[must_use]
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Sets the preset. Defaults to [`PresetKind::Minimal`].
    #[must_use]
    pub fn preset(mut self, preset: PresetKind) -> Self {
        self.preset = Some(preset);
        self
    }

    /// Replaces the preset's extension allow-list.
    #[must_use]
    pub fn include_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Adds extensions to exclude.
    #[must_use]
    pub fn exclude_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_extensions
            .extend(extensions.into_iter().map(Into::into));
        self
    }

    /// Adds folder name patterns to prune.
    #[must_use]
    pub fn exclude_folders<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_folders.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Adds file name patterns to skip.
    #[must_use]
    pub fn exclude_files<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_files.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Overrides the preset's per-file size limit.
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Merges the layers and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Root directory doesn't exist or is not a directory
    /// - The size limit is zero
    /// - A folder or file pattern does not compile
    pub fn build(self) -> Result<Config> {
        let root_dir = self.root_dir.unwrap_or_else(|| PathBuf::from("."));

        if !root_dir.exists() {
            return Err(Error::config(format!(
                "Root directory does not exist: {}",
                root_dir.display()
            )));
        }

        if !root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                root_dir.display()
            )));
        }

        let root_dir = root_dir
            .canonicalize()
            .map_err(|e| Error::io(&root_dir, e))?;

        let preset_kind = self.preset.unwrap_or_default();
        let preset = preset_kind.preset();

        let include_extensions = self.include_extensions.or_else(|| {
            preset
                .include_extensions
                .map(|exts| exts.iter().map(|e| (*e).to_string()).collect())
        });

        let rules = RuleSet::builder()
            .include_extensions(include_extensions)
            .exclude_extensions(self.exclude_extensions)
            .exclude_folders(preset.exclude_folders.iter().copied())
            .exclude_folders(self.exclude_folders)
            .exclude_files(preset.exclude_files.iter().copied())
            .exclude_files(self.exclude_files)
            .max_file_size(self.max_file_size.unwrap_or(preset.max_file_size))
            .build()?;

        Ok(Config {
            root_dir,
            output_file: self.output_file,
            preset: preset_kind,
            rules,
            dry_run: self.dry_run,
        })
    }
}
