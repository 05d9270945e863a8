//! Filtering presets for common project stacks.
//!
//! A preset bundles an extension allow-list, folder and file exclusions, and a
//! per-file size limit tuned for one kind of project. Presets are the middle
//! layer of a [`Config`](crate::Config): built-in defaults come first, then the
//! preset, then user overrides.

use serde::Serialize;

/// Identifier of a built-in preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    /// React, Vue, Angular, HTML/CSS/JS projects
    Web,
    /// Python packages, Django, Flask, FastAPI projects
    Python,
    /// Node.js backends and npm packages
    Node,
    /// React Native, Flutter, native mobile apps
    Mobile,
    /// Documentation, blogs, static sites
    Docs,
    /// Only essential text files
    #[default]
    Minimal,
    /// Every text file, minimal exclusions
    Full,
}

impl PresetKind {
    /// Returns the ID string for this preset.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Python => "python",
            Self::Node => "node",
            Self::Mobile => "mobile",
            Self::Docs => "docs",
            Self::Minimal => "minimal",
            Self::Full => "full",
        }
    }

    /// Returns all available preset kinds, in listing order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Web,
            Self::Python,
            Self::Node,
            Self::Mobile,
            Self::Docs,
            Self::Minimal,
            Self::Full,
        ]
    }

    /// Parse preset kind from string ID.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "web" => Some(Self::Web),
            "python" => Some(Self::Python),
            "node" => Some(Self::Node),
            "mobile" => Some(Self::Mobile),
            "docs" => Some(Self::Docs),
            "minimal" => Some(Self::Minimal),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    /// Returns the full preset definition.
    #[must_use]
    pub fn preset(self) -> &'static Preset {
        match self {
            Self::Web => &WEB,
            Self::Python => &PYTHON,
            Self::Node => &NODE,
            Self::Mobile => &MOBILE,
            Self::Docs => &DOCS,
            Self::Minimal => &MINIMAL,
            Self::Full => &FULL,
        }
    }
}

impl std::fmt::Display for PresetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Filtering rules for one project stack.
#[derive(Debug, Clone, Serialize)]
pub struct Preset {
    /// Which preset this is
    pub kind: PresetKind,
    /// Human-readable name, written into the document banner
    pub name: &'static str,
    /// Description shown by `--list-presets`
    pub description: &'static str,
    /// Extension allow-list; `None` admits every extension
    pub include_extensions: Option<&'static [&'static str]>,
    /// Folder name patterns to prune
    pub exclude_folders: &'static [&'static str],
    /// File name patterns to skip
    pub exclude_files: &'static [&'static str],
    /// Truncation threshold in bytes
    pub max_file_size: u64,
}

static WEB: Preset = Preset {
    kind: PresetKind::Web,
    name: "Web Project",
    description: "React, Vue, Angular, HTML/CSS/JS projects",
    include_extensions: Some(&[
        ".js", ".jsx", ".ts", ".tsx", ".vue", ".html", ".css", ".scss", ".sass", ".less",
        ".json", ".md", ".txt", ".yaml", ".yml",
    ]),
    exclude_folders: &[
        "node_modules", "dist", "build", ".next", ".nuxt", "coverage", ".nyc_output",
    ],
    exclude_files: &["package-lock.json", "yarn.lock", "*.min.js", "*.min.css"],
    max_file_size: 100_000,
};

static PYTHON: Preset = Preset {
    kind: PresetKind::Python,
    name: "Python Project",
    description: "Python packages, Django, Flask, FastAPI projects",
    include_extensions: Some(&[
        ".py", ".pyi", ".pyx", ".pxd", ".md", ".rst", ".txt", ".toml", ".cfg", ".ini", ".yaml",
        ".yml", ".json",
    ]),
    exclude_folders: &[
        "__pycache__", ".pytest_cache", "venv", "env", ".venv", ".env", "dist", "build",
        "*.egg-info",
    ],
    exclude_files: &["*.pyc", "*.pyo", "*.pyd", ".coverage", "*.log"],
    max_file_size: 200_000,
};

static NODE: Preset = Preset {
    kind: PresetKind::Node,
    name: "Node.js Project",
    description: "Node.js, npm packages, backend projects",
    include_extensions: Some(&[".js", ".ts", ".json", ".md", ".txt", ".yaml", ".yml"]),
    exclude_folders: &["node_modules", "dist", "build", "coverage", ".nyc_output"],
    exclude_files: &["package-lock.json", "yarn.lock", "*.log"],
    max_file_size: 100_000,
};

static MOBILE: Preset = Preset {
    kind: PresetKind::Mobile,
    name: "Mobile Project",
    description: "React Native, Flutter, mobile app projects",
    include_extensions: Some(&[
        ".js", ".jsx", ".ts", ".tsx", ".dart", ".java", ".kt", ".swift", ".m", ".h", ".json",
        ".md", ".yaml", ".yml",
    ]),
    // Folder patterns match a single path component, so the nested entries never fire.
    exclude_folders: &["node_modules", "build", "ios/build", "android/build", ".dart_tool"],
    exclude_files: &["*.log", "Podfile.lock"],
    max_file_size: 150_000,
};

static DOCS: Preset = Preset {
    kind: PresetKind::Docs,
    name: "Documentation Project",
    description: "Documentation, blog, content projects",
    include_extensions: Some(&[
        ".md", ".rst", ".txt", ".adoc", ".org", ".tex", ".html", ".css", ".js", ".json", ".yaml",
        ".yml",
    ]),
    exclude_folders: &["_site", "public", "dist", "build", "node_modules"],
    exclude_files: &["*.log"],
    max_file_size: 500_000,
};

static MINIMAL: Preset = Preset {
    kind: PresetKind::Minimal,
    name: "Minimal Export",
    description: "Only essential text files",
    include_extensions: Some(&[".md", ".txt", ".json", ".yaml", ".yml"]),
    exclude_folders: &[],
    exclude_files: &[],
    max_file_size: 50_000,
};

static FULL: Preset = Preset {
    kind: PresetKind::Full,
    name: "Full Export",
    description: "Include everything (use with caution)",
    include_extensions: None,
    exclude_folders: &[".git", "__pycache__", "node_modules"],
    exclude_files: &["*.log"],
    max_file_size: 1_000_000,
};
