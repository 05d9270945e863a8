//! Heuristic classification of a project's technology stack.
//!
//! Detection looks at a shallow snapshot of the root (its entries plus a few
//! manifest files one level down), counts markdown files across the pruned
//! tree, and runs stack-specific detectors in a fixed priority order. Unreadable directories and malformed manifests are
//! treated as missing signals; detection itself never fails.

use crate::preset::PresetKind;
use crate::rules::RuleSet;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Manifests recorded when found one level below the root.
const NESTED_MANIFESTS: &[&str] = &[
    "package.json",
    "requirements.txt",
    "Cargo.toml",
    "pubspec.yaml",
    "pom.xml",
    "build.gradle",
];

const WEB_FILES: &[&str] = &[
    "index.html",
    "index.htm",
    "webpack.config.js",
    "vite.config.js",
    "rollup.config.js",
    "tsconfig.json",
    "tailwind.config.js",
];
const WEB_DIRS: &[&str] = &["src", "public", "static", "assets"];
const WEB_SOURCE_EXTENSIONS: &[&str] = &["html", "css", "js", "ts", "jsx", "tsx", "vue", "svelte"];
const WEB_TOOLING: &[&str] = &[
    "webpack",
    "vite",
    "rollup",
    "parcel",
    "typescript",
    "sass",
    "less",
];

const PYTHON_FILES: &[&str] = &[
    "requirements.txt",
    "setup.py",
    "pyproject.toml",
    "Pipfile",
    "setup.cfg",
    "tox.ini",
    "pytest.ini",
    "manage.py",
];

const FRONTEND_DEPENDENCIES: &[&str] = &["react", "vue", "@angular/core", "svelte"];
const BACKEND_DEPENDENCIES: &[&str] = &[
    "express",
    "koa",
    "fastify",
    "nest",
    "@nestjs/core",
    "apollo-server",
    "graphql",
    "mongoose",
    "sequelize",
    "typeorm",
    "prisma",
    "nodemon",
];

const MOBILE_MARKERS: &[&str] = &[
    "Podfile",
    "build.gradle",
    "AndroidManifest.xml",
    "ios",
    "android",
    "DIR:ios",
    "DIR:android",
];

const DOCS_TOOL_FILES: &[&str] = &[
    "_config.yml",
    "config.toml",
    "config.yaml",
    "gatsby-config.js",
    "mkdocs.yml",
    "docusaurus.config.js",
    "vuepress.config.js",
    "gitbook.json",
    "book.toml",
];
const DOCS_DIRS: &[&str] = &["docs", "documentation", "wiki", "_posts", "content"];
const DOCS_MIN_MARKDOWN: usize = 3;

const KEY_FILES_LIMIT: usize = 10;

type Detector = fn(&ProjectSignature) -> Option<ProjectType>;

/// Detectors in priority order; the first match wins. Web frameworks come
/// before generic language checks since a web project often carries
/// server-side files too.
const DETECTORS: &[(&str, Detector)] = &[
    ("web", detect_web),
    ("python", detect_python),
    ("node", detect_node),
    ("mobile", detect_mobile),
    ("docs", detect_docs),
];

/// Fine-grained stack label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    /// React single-page app
    React,
    /// Next.js
    #[serde(rename = "nextjs")]
    NextJs,
    /// Vue
    Vue,
    /// Nuxt
    Nuxt,
    /// Angular
    Angular,
    /// Svelte
    Svelte,
    /// Generic HTML/CSS/JS
    Web,
    /// Generic Python
    Python,
    /// Django
    Django,
    /// Flask
    Flask,
    /// `FastAPI`
    #[serde(rename = "fastapi")]
    FastApi,
    /// Generic Node.js backend
    Node,
    /// Express
    Express,
    /// React Native
    ReactNative,
    /// Flutter
    Flutter,
    /// Ionic
    Ionic,
    /// Native iOS or Android
    Mobile,
    /// Generic documentation
    Docs,
    /// Gatsby
    Gatsby,
    /// Hugo
    Hugo,
    /// Jekyll
    Jekyll,
}

impl ProjectType {
    /// Returns the label used in reports and JSON output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::React => "react",
            Self::NextJs => "nextjs",
            Self::Vue => "vue",
            Self::Nuxt => "nuxt",
            Self::Angular => "angular",
            Self::Svelte => "svelte",
            Self::Web => "web",
            Self::Python => "python",
            Self::Django => "django",
            Self::Flask => "flask",
            Self::FastApi => "fastapi",
            Self::Node => "node",
            Self::Express => "express",
            Self::ReactNative => "react-native",
            Self::Flutter => "flutter",
            Self::Ionic => "ionic",
            Self::Mobile => "mobile",
            Self::Docs => "docs",
            Self::Gatsby => "gatsby",
            Self::Hugo => "hugo",
            Self::Jekyll => "jekyll",
        }
    }

    /// Maps the label to its coarse preset.
    #[must_use]
    pub const fn preset(self) -> PresetKind {
        match self {
            Self::React
            | Self::NextJs
            | Self::Vue
            | Self::Nuxt
            | Self::Angular
            | Self::Svelte
            | Self::Web => PresetKind::Web,
            Self::Python | Self::Django | Self::Flask | Self::FastApi => PresetKind::Python,
            Self::Node | Self::Express => PresetKind::Node,
            Self::ReactNative | Self::Flutter | Self::Ionic | Self::Mobile => PresetKind::Mobile,
            Self::Docs | Self::Gatsby | Self::Hugo | Self::Jekyll => PresetKind::Docs,
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The parts of `package.json` detection cares about. A field of the wrong
/// shape reads as absent without discarding the others.
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    dependencies: Map<String, Value>,
    #[serde(default, rename = "devDependencies", deserialize_with = "lenient")]
    dev_dependencies: Map<String, Value>,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl PackageManifest {
    /// Runtime or dev dependency.
    fn depends_on(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }

    fn depends_on_any(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.depends_on(name))
    }
}

/// Shallow snapshot of a directory, taken once per detector.
#[derive(Debug, Default)]
pub struct ProjectSignature {
    root: PathBuf,
    /// Root file names, `DIR:<name>` for non-hidden directories and
    /// `<dir>/<manifest>` for manifests one level down, sorted.
    entries: Vec<String>,
    markdown_files: usize,
    has_git: bool,
    package: Option<PackageManifest>,
    requirements: Option<String>,
}

impl ProjectSignature {
    /// Reads the root listing and manifest contents. Errors leave the
    /// corresponding parts empty.
    #[must_use]
    pub fn capture(root: &Path) -> Self {
        let mut signature = Self {
            root: root.to_path_buf(),
            has_git: root.join(".git").exists(),
            ..Self::default()
        };

        for (name, path) in sorted_children(root) {
            if path.is_file() {
                signature.entries.push(name);
            } else if path.is_dir() && !name.starts_with('.') {
                signature.entries.push(format!("DIR:{name}"));

                for (child, child_path) in sorted_children(&path) {
                    if child_path.is_file() && NESTED_MANIFESTS.contains(&child.as_str()) {
                        signature.entries.push(format!("{name}/{child}"));
                    }
                }
            }
        }

        signature.package = fs::read_to_string(root.join("package.json"))
            .ok()
            .and_then(|text| match serde_json::from_str(&text) {
                Ok(manifest) => Some(manifest),
                Err(e) => {
                    debug!("Ignoring malformed package.json: {}", e);
                    None
                }
            });

        signature.markdown_files = project_files(root)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".md"))
            .count();

        signature.requirements = fs::read_to_string(root.join("requirements.txt"))
            .ok()
            .map(|text| text.to_lowercase());

        trace!("Captured {} entries under {}", signature.entries.len(), root.display());
        signature
    }

    fn has(&self, entry: &str) -> bool {
        self.entries.iter().any(|e| e == entry)
    }

    fn has_any(&self, entries: &[&str]) -> bool {
        entries.iter().any(|e| self.has(e))
    }

    fn has_dir(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.strip_prefix("DIR:") == Some(name))
    }
}

fn sorted_children(dir: &Path) -> Vec<(String, PathBuf)> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut children: Vec<_> = read_dir
        .filter_map(std::result::Result::ok)
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
        .collect();
    children.sort();
    children
}

/// Summary of a directory for `--detect`.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectInfo {
    /// Directory that was inspected
    pub path: PathBuf,
    /// Its final path component
    pub name: String,
    /// Detected stack, if any
    pub detected_type: Option<ProjectType>,
    /// Preset the stack maps to
    pub suggested_preset: PresetKind,
    /// Number of entries in the shallow snapshot
    pub files_found: usize,
    /// Whether the root holds a `.git` directory
    pub has_git: bool,
    /// First few non-directory entries
    pub key_files: Vec<String>,
}

/// Classifies a project directory.
#[derive(Debug)]
pub struct ProjectDetector {
    signature: ProjectSignature,
}

impl ProjectDetector {
    /// Captures the directory snapshot used by every query.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            signature: ProjectSignature::capture(root.as_ref()),
        }
    }

    /// Returns the first matching stack label, in priority order.
    #[must_use]
    pub fn detect(&self) -> Option<ProjectType> {
        DETECTORS.iter().find_map(|(name, detector)| {
            let found = detector(&self.signature);
            if let Some(project_type) = found {
                debug!("{} detector matched: {}", name, project_type);
            }
            found
        })
    }

    /// Maps the detected stack to a preset; [`PresetKind::Minimal`] when
    /// nothing matches.
    #[must_use]
    pub fn suggest_preset(&self) -> PresetKind {
        self.detect().map_or(PresetKind::Minimal, ProjectType::preset)
    }

    /// Collects everything `--detect` reports.
    #[must_use]
    pub fn project_info(&self) -> ProjectInfo {
        let signature = &self.signature;
        let detected_type = self.detect();

        ProjectInfo {
            path: signature.root.clone(),
            name: signature
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            detected_type,
            suggested_preset: detected_type.map_or(PresetKind::Minimal, ProjectType::preset),
            files_found: signature.entries.len(),
            has_git: signature.has_git,
            key_files: signature
                .entries
                .iter()
                .filter(|e| !e.starts_with("DIR:"))
                .take(KEY_FILES_LIMIT)
                .cloned()
                .collect(),
        }
    }
}

fn detect_web(signature: &ProjectSignature) -> Option<ProjectType> {
    if let Some(package) = &signature.package {
        if package.depends_on("react") {
            let named_next = package.name.as_deref().is_some_and(|n| n.contains("next"));
            if package.depends_on("next") || named_next {
                return Some(ProjectType::NextJs);
            }
            return Some(ProjectType::React);
        }
        if package.depends_on("vue") {
            if package.depends_on("nuxt") {
                return Some(ProjectType::Nuxt);
            }
            return Some(ProjectType::Vue);
        }
        if package.depends_on("@angular/core") {
            return Some(ProjectType::Angular);
        }
        if package.depends_on("svelte") {
            return Some(ProjectType::Svelte);
        }
        if package.depends_on("react-native") {
            return Some(ProjectType::ReactNative);
        }
        if package.depends_on_any(&["@ionic/react", "@ionic/angular", "@ionic/vue"]) {
            return Some(ProjectType::Ionic);
        }
        if package.depends_on("gatsby") {
            return Some(ProjectType::Gatsby);
        }
        if package.depends_on_any(WEB_TOOLING) {
            return Some(ProjectType::Web);
        }
    }

    if signature.has_any(WEB_FILES) {
        return Some(ProjectType::Web);
    }

    if WEB_DIRS.iter().any(|d| signature.has_dir(d)) && has_web_sources(&signature.root) {
        return Some(ProjectType::Web);
    }

    None
}

/// Searches the whole tree for a web source file, skipping the folders the
/// default rules prune anyway.
fn has_web_sources(root: &Path) -> bool {
    project_files(root).any(|entry| {
        entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| WEB_SOURCE_EXTENSIONS.contains(&ext))
    })
}

/// Files anywhere under `root`, skipping folders the default rules prune.
fn project_files(root: &Path) -> impl Iterator<Item = DirEntry> {
    let defaults = RuleSet::builder().build().ok();

    WalkDir::new(root)
        .into_iter()
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !defaults
                    .as_ref()
                    .is_some_and(|r| r.should_exclude_folder(&entry.file_name().to_string_lossy()))
        })
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
}

fn detect_python(signature: &ProjectSignature) -> Option<ProjectType> {
    if signature.has_any(PYTHON_FILES) {
        if signature.has("manage.py") {
            return Some(ProjectType::Django);
        }

        if let Some(requirements) = &signature.requirements {
            if requirements.contains("django") {
                return Some(ProjectType::Django);
            }
            if requirements.contains("flask") {
                return Some(ProjectType::Flask);
            }
            if requirements.contains("fastapi") {
                return Some(ProjectType::FastApi);
            }
        }

        return Some(ProjectType::Python);
    }

    signature
        .entries
        .iter()
        .any(|e| e.ends_with(".py"))
        .then_some(ProjectType::Python)
}

fn detect_node(signature: &ProjectSignature) -> Option<ProjectType> {
    if !signature.has("package.json") {
        return None;
    }
    let package = signature.package.as_ref()?;

    if package.depends_on_any(FRONTEND_DEPENDENCIES) {
        return None;
    }

    if package.depends_on_any(BACKEND_DEPENDENCIES) {
        if package.depends_on("express") {
            return Some(ProjectType::Express);
        }
        return Some(ProjectType::Node);
    }

    None
}

fn detect_mobile(signature: &ProjectSignature) -> Option<ProjectType> {
    if signature.has("pubspec.yaml") {
        return Some(ProjectType::Flutter);
    }

    // Only runtime dependencies count here
    if signature.has("package.json")
        && signature
            .package
            .as_ref()
            .is_some_and(|p| p.dependencies.contains_key("react-native"))
    {
        return Some(ProjectType::ReactNative);
    }

    signature
        .has_any(MOBILE_MARKERS)
        .then_some(ProjectType::Mobile)
}

fn detect_docs(signature: &ProjectSignature) -> Option<ProjectType> {
    if signature.has_any(DOCS_TOOL_FILES) {
        if signature.has("_config.yml") {
            return Some(ProjectType::Jekyll);
        }
        if signature.has("gatsby-config.js") {
            return Some(ProjectType::Gatsby);
        }
        if signature.has_any(&["config.toml", "config.yaml"]) {
            return Some(ProjectType::Hugo);
        }
        return Some(ProjectType::Docs);
    }

    if DOCS_DIRS.iter().any(|d| signature.has_dir(d)) {
        return Some(ProjectType::Docs);
    }

    (signature.markdown_files >= DOCS_MIN_MARKDOWN).then_some(ProjectType::Docs)
}
