use crate::error::{Result, ScribeError};
use crate::lint::terminology;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// MarkdownFlavor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkdownFlavor {
    Gfm,
    Commonmark,
}

impl MarkdownFlavor {
    pub fn all() -> &'static [MarkdownFlavor] {
        &[MarkdownFlavor::Gfm, MarkdownFlavor::Commonmark]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkdownFlavor::Gfm => "gfm",
            MarkdownFlavor::Commonmark => "commonmark",
        }
    }
}

impl fmt::Display for MarkdownFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkdownFlavor {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gfm" => Ok(MarkdownFlavor::Gfm),
            "commonmark" => Ok(MarkdownFlavor::Commonmark),
            other => Err(ScribeError::InvalidFlavor(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DocsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    #[serde(default = "default_docs_dir")]
    pub dir: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_docs_dir() -> String {
    paths::DEFAULT_DOCS_DIR.to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "markdown".to_string()]
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            dir: default_docs_dir(),
            extensions: default_extensions(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthoringConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthoringConfig {
    #[serde(default = "default_flavor")]
    pub markdown_flavor: MarkdownFlavor,
    #[serde(default = "default_indicators")]
    pub indicators: bool,
}

fn default_flavor() -> MarkdownFlavor {
    MarkdownFlavor::Gfm
}

fn default_indicators() -> bool {
    true
}

impl Default for AuthoringConfig {
    fn default() -> Self {
        Self {
            markdown_flavor: default_flavor(),
            indicators: default_indicators(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReloadConfig
// ---------------------------------------------------------------------------

pub const MIN_DEBOUNCE_MS: u64 = 50;
pub const MAX_DEBOUNCE_MS: u64 = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadConfig {
    #[serde(default = "default_reload_enabled")]
    pub enabled: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_reload_enabled() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            enabled: default_reload_enabled(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProjectConfig {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub authoring: AuthoringConfig,
    /// Project-specific rewrites layered over the built-in terminology
    /// rules: regex pattern → preferred term.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub terminology: BTreeMap<String, String>,
    #[serde(default)]
    pub reload: ReloadConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                title: None,
                description: None,
            },
            docs: DocsConfig::default(),
            authoring: AuthoringConfig::default(),
            terminology: BTreeMap::new(),
            reload: ReloadConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ScribeError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if paths::validate_slug(&self.project.name).is_err() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "project.name '{}' is not a valid slug (lowercase alphanumeric with hyphens)",
                    self.project.name
                ),
            });
        }

        // docs.dir must stay inside the project
        let dir = Path::new(&self.docs.dir);
        if dir.is_absolute() || dir.components().any(|c| c.as_os_str() == "..") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "docs.dir '{}' must be a relative path inside the project",
                    self.docs.dir
                ),
            });
        }

        if self.docs.extensions.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "docs.extensions is empty — no files will be linted".to_string(),
            });
        }
        for ext in &self.docs.extensions {
            if ext.starts_with('.') {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("docs.extensions entry '{ext}' should not include the dot"),
                });
            }
        }

        if !(MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS).contains(&self.reload.debounce_ms) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "reload.debounce_ms={} is outside {}..={} and will be clamped",
                    self.reload.debounce_ms, MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS
                ),
            });
        }

        for (pattern, term) in &self.terminology {
            if let Err(e) = terminology::compile_override(pattern) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("terminology pattern '{pattern}' does not compile: {e}"),
                });
            }
            if term.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("terminology pattern '{pattern}' maps to an empty term"),
                });
            }
        }

        warnings
    }

    /// Effective debounce window for the reload watcher.
    pub fn debounce_ms(&self) -> u64 {
        self.reload
            .debounce_ms
            .clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
