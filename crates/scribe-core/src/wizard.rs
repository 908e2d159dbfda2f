use crate::config::{Config, MarkdownFlavor, MAX_DEBOUNCE_MS, MIN_DEBOUNCE_MS};
use crate::error::{Result, ScribeError};
use crate::io;
use crate::paths;
use crate::skills;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Current wizard state format. Older blobs are migrated on load.
pub const STATE_VERSION: u32 = 2;

/// Content types the content step offers.
pub const CONTENT_TYPES: &[&str] = &["page", "post", "doc", "landing", "changelog"];

// ---------------------------------------------------------------------------
// WizardStep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Project,
    Content,
    Authoring,
    Integrations,
    Review,
}

impl WizardStep {
    pub fn all() -> &'static [WizardStep] {
        &[
            WizardStep::Project,
            WizardStep::Content,
            WizardStep::Authoring,
            WizardStep::Integrations,
            WizardStep::Review,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<WizardStep> {
        WizardStep::all().get(self.index() + 1).copied()
    }

    pub fn prev(self) -> Option<WizardStep> {
        self.index().checked_sub(1).and_then(|i| WizardStep::all().get(i)).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Project => "project",
            WizardStep::Content => "content",
            WizardStep::Authoring => "authoring",
            WizardStep::Integrations => "integrations",
            WizardStep::Review => "review",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Project => "Project basics",
            WizardStep::Content => "Content layout",
            WizardStep::Authoring => "Authoring rules",
            WizardStep::Integrations => "Integrations",
            WizardStep::Review => "Review & generate",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "project" => Ok(WizardStep::Project),
            "content" => Ok(WizardStep::Content),
            "authoring" => Ok(WizardStep::Authoring),
            "integrations" => Ok(WizardStep::Integrations),
            "review" => Ok(WizardStep::Review),
            other => Err(ScribeError::InvalidStep(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// WizardState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardState {
    /// Blobs without a version predate versioning and count as v1.
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub step: WizardStep,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn legacy_version() -> u32 {
    1
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            step: WizardStep::Project,
            fields: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Merge a partial field map, last write wins. Values are trimmed;
    /// empty keys are dropped.
    pub fn apply_fields<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in fields {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            self.fields.insert(key.to_string(), value.trim().to_string());
        }
        self.updated_at = Utc::now();
    }

    pub fn set_step(&mut self, step: WizardStep) {
        self.step = step;
        self.updated_at = Utc::now();
    }

    // -----------------------------------------------------------------------
    // Migration
    // -----------------------------------------------------------------------

    /// Bring an older state up to `STATE_VERSION`. v1 renamed two fields
    /// and stored the reload toggle as on/off. Newer-than-current versions
    /// are refused so a stale server never mangles them.
    pub fn migrate(mut self) -> Result<Self> {
        match self.version {
            0 | 1 => {
                if let Some(name) = self.fields.remove("site_name") {
                    self.fields.entry("project_name".to_string()).or_insert(name);
                }
                if let Some(reload) = self.fields.remove("reload") {
                    let mapped = match reload.as_str() {
                        "on" => "true".to_string(),
                        "off" => "false".to_string(),
                        other => other.to_string(),
                    };
                    self.fields.entry("live_reload".to_string()).or_insert(mapped);
                }
                for (key, default) in [
                    ("docs_dir", paths::DEFAULT_DOCS_DIR),
                    ("markdown_flavor", "gfm"),
                    ("indicators", "true"),
                    ("live_reload", "true"),
                    ("reload_debounce_ms", "200"),
                ] {
                    self.fields
                        .entry(key.to_string())
                        .or_insert_with(|| default.to_string());
                }
                self.version = STATE_VERSION;
                Ok(self)
            }
            STATE_VERSION => Ok(self),
            newer => Err(ScribeError::UnsupportedStateVersion(newer)),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate_step(&self, step: WizardStep) -> Vec<FieldError> {
        let mut errors = Vec::new();
        match step {
            WizardStep::Project => {
                match self.field("project_name") {
                    None | Some("") => {
                        errors.push(FieldError::new("project_name", "project name is required"))
                    }
                    Some(name) => {
                        if paths::validate_slug(name).is_err() {
                            errors.push(FieldError::new(
                                "project_name",
                                "must be lowercase alphanumeric with hyphens",
                            ));
                        }
                    }
                }
                if self.field("project_title").unwrap_or("").is_empty() {
                    errors.push(FieldError::new("project_title", "project title is required"));
                }
            }
            WizardStep::Content => {
                match self.field("docs_dir") {
                    None | Some("") => {
                        errors.push(FieldError::new("docs_dir", "docs directory is required"))
                    }
                    Some(dir) => {
                        let p = Path::new(dir);
                        if p.is_absolute() || p.components().any(|c| c.as_os_str() == "..") {
                            errors.push(FieldError::new(
                                "docs_dir",
                                "must be a relative path inside the project",
                            ));
                        }
                    }
                }
                let types = self.content_types();
                if types.is_empty() {
                    errors.push(FieldError::new(
                        "content_types",
                        "select at least one content type",
                    ));
                }
                for t in &types {
                    if !CONTENT_TYPES.contains(&t.as_str()) {
                        errors.push(FieldError::new(
                            "content_types",
                            format!("unknown content type '{t}'"),
                        ));
                    }
                }
            }
            WizardStep::Authoring => {
                if let Some(v) = self.field("markdown_flavor") {
                    if v.parse::<MarkdownFlavor>().is_err() {
                        errors.push(FieldError::new("markdown_flavor", "must be gfm or commonmark"));
                    }
                }
                if let Some(v) = self.field("indicators") {
                    if v != "true" && v != "false" {
                        errors.push(FieldError::new("indicators", "must be true or false"));
                    }
                }
            }
            WizardStep::Integrations => {
                if let Some(v) = self.field("live_reload") {
                    if v != "true" && v != "false" {
                        errors.push(FieldError::new("live_reload", "must be true or false"));
                    }
                }
                if let Some(v) = self.field("reload_debounce_ms") {
                    match v.parse::<u64>() {
                        Ok(ms) if (MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS).contains(&ms) => {}
                        _ => errors.push(FieldError::new(
                            "reload_debounce_ms",
                            format!(
                                "must be an integer between {MIN_DEBOUNCE_MS} and {MAX_DEBOUNCE_MS}"
                            ),
                        )),
                    }
                }
            }
            WizardStep::Review => {}
        }
        errors
    }

    pub fn validate_all(&self) -> Vec<FieldError> {
        WizardStep::all()
            .iter()
            .flat_map(|step| self.validate_step(*step))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Effective values (field or default)
    // -----------------------------------------------------------------------

    pub fn content_types(&self) -> Vec<String> {
        self.field("content_types")
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn docs_dir(&self) -> &str {
        match self.field("docs_dir") {
            Some(dir) if !dir.is_empty() => dir,
            _ => paths::DEFAULT_DOCS_DIR,
        }
    }

    pub fn markdown_flavor(&self) -> MarkdownFlavor {
        self.field("markdown_flavor")
            .and_then(|v| v.parse().ok())
            .unwrap_or(MarkdownFlavor::Gfm)
    }

    pub fn indicators(&self) -> bool {
        self.field("indicators").map(|v| v != "false").unwrap_or(true)
    }

    pub fn live_reload(&self) -> bool {
        self.field("live_reload").map(|v| v != "false").unwrap_or(true)
    }

    pub fn reload_debounce_ms(&self) -> u64 {
        self.field("reload_debounce_ms")
            .and_then(|v| v.parse().ok())
            .unwrap_or(200)
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Materialize the collected answers into a project: config, starter
    /// skill rules, and one starter document per content type. Existing
    /// files are reported as skipped unless `force` overwrites them.
    pub fn generate(&self, root: &Path, force: bool) -> Result<GenerateReport> {
        let errors = self.validate_all();
        if !errors.is_empty() {
            let summary = errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ScribeError::IncompleteWizard(summary));
        }

        let mut report = GenerateReport::default();

        let mut config = Config::new(self.field("project_name").unwrap_or_default());
        config.project.title = self.field("project_title").map(str::to_string);
        config.project.description = self
            .field("project_description")
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        config.docs.dir = self.docs_dir().to_string();
        config.authoring.markdown_flavor = self.markdown_flavor();
        config.authoring.indicators = self.indicators();
        config.reload.enabled = self.live_reload();
        config.reload.debounce_ms = self.reload_debounce_ms();

        if paths::config_path(root).exists() && !force {
            report.skipped.push(paths::CONFIG_FILE.to_string());
        } else {
            config.save(root)?;
            report.written.push(paths::CONFIG_FILE.to_string());
        }

        if paths::skills_path(root).exists() && !force {
            report.skipped.push(paths::SKILLS_FILE.to_string());
        } else {
            skills::default_set().save(root)?;
            report.written.push(paths::SKILLS_FILE.to_string());
        }

        let docs_dir = root.join(self.docs_dir());
        io::ensure_dir(&docs_dir)?;
        for content_type in self.content_types() {
            let rel = format!("{}/{}/index.md", self.docs_dir(), content_type);
            let path = docs_dir.join(&content_type).join("index.md");
            if path.exists() && !force {
                report.skipped.push(rel);
                continue;
            }
            let title = title_case(&content_type);
            let starter = format!(
                "---\ntitle: {title}\ntype: {content_type}\ndraft: true\n---\n\n# {title}\n"
            );
            io::atomic_write(&path, starter.as_bytes())?;
            report.written.push(rel);
        }

        io::ensure_gitignore_entry(root, ".scribe/dist/")?;
        io::ensure_gitignore_entry(root, "*.bak")?;

        Ok(report)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn complete_state() -> WizardState {
        let mut state = WizardState::new();
        state.apply_fields([
            ("project_name".to_string(), "my-site".to_string()),
            ("project_title".to_string(), "My Site".to_string()),
            ("docs_dir".to_string(), "docs".to_string()),
            ("content_types".to_string(), "page, post".to_string()),
            ("markdown_flavor".to_string(), "gfm".to_string()),
            ("indicators".to_string(), "true".to_string()),
            ("live_reload".to_string(), "true".to_string()),
            ("reload_debounce_ms".to_string(), "200".to_string()),
        ]);
        state
    }

    #[test]
    fn step_order_and_bounds() {
        assert_eq!(WizardStep::Project.next(), Some(WizardStep::Content));
        assert_eq!(WizardStep::Integrations.next(), Some(WizardStep::Review));
        assert_eq!(WizardStep::Review.next(), None);
        assert_eq!(WizardStep::Review.prev(), Some(WizardStep::Integrations));
        assert_eq!(WizardStep::Project.prev(), None);
    }

    #[test]
    fn step_roundtrip() {
        for step in WizardStep::all() {
            let parsed: WizardStep = step.as_str().parse().unwrap();
            assert_eq!(parsed, *step);
        }
        assert!("summary".parse::<WizardStep>().is_err());
    }

    #[test]
    fn apply_fields_trims_and_overwrites() {
        let mut state = WizardState::new();
        state.apply_fields([("project_name".to_string(), "  my-site  ".to_string())]);
        assert_eq!(state.field("project_name"), Some("my-site"));
        state.apply_fields([("project_name".to_string(), "other".to_string())]);
        assert_eq!(state.field("project_name"), Some("other"));
    }

    #[test]
    fn project_step_requires_name_and_title() {
        let state = WizardState::new();
        let errors = state.validate_step(WizardStep::Project);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"project_name"));
        assert!(fields.contains(&"project_title"));
    }

    #[test]
    fn project_step_rejects_bad_slug() {
        let mut state = WizardState::new();
        state.apply_fields([
            ("project_name".to_string(), "My Site".to_string()),
            ("project_title".to_string(), "My Site".to_string()),
        ]);
        let errors = state.validate_step(WizardStep::Project);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "project_name");
    }

    #[test]
    fn content_step_rejects_traversal_and_unknown_types() {
        let mut state = WizardState::new();
        state.apply_fields([
            ("docs_dir".to_string(), "../outside".to_string()),
            ("content_types".to_string(), "page, wiki".to_string()),
        ]);
        let errors = state.validate_step(WizardStep::Content);
        assert!(errors.iter().any(|e| e.field == "docs_dir"));
        assert!(errors
            .iter()
            .any(|e| e.field == "content_types" && e.message.contains("wiki")));
    }

    #[test]
    fn integrations_step_bounds_debounce() {
        let mut state = WizardState::new();
        state.apply_fields([("reload_debounce_ms".to_string(), "10".to_string())]);
        assert!(!state.validate_step(WizardStep::Integrations).is_empty());
        state.apply_fields([("reload_debounce_ms".to_string(), "250".to_string())]);
        assert!(state.validate_step(WizardStep::Integrations).is_empty());
    }

    #[test]
    fn review_step_has_no_field_checks() {
        assert!(WizardState::new().validate_step(WizardStep::Review).is_empty());
    }

    #[test]
    fn complete_state_validates() {
        assert!(complete_state().validate_all().is_empty());
    }

    #[test]
    fn migrate_v1_renames_and_defaults() {
        let json = r#"{
            "version": 1,
            "step": "content",
            "fields": {"site_name": "legacy-site", "reload": "off"}
        }"#;
        let state: WizardState = serde_json::from_str(json).unwrap();
        let state = state.migrate().unwrap();
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.field("project_name"), Some("legacy-site"));
        assert!(state.field("site_name").is_none());
        assert_eq!(state.field("live_reload"), Some("false"));
        assert!(state.field("reload").is_none());
        assert_eq!(state.field("markdown_flavor"), Some("gfm"));
        assert_eq!(state.field("reload_debounce_ms"), Some("200"));
        assert_eq!(state.step, WizardStep::Content);
    }

    #[test]
    fn migrate_unversioned_blob_counts_as_v1() {
        let json = r#"{"fields": {"site_name": "old"}}"#;
        let state: WizardState = serde_json::from_str(json).unwrap();
        assert_eq!(state.version, 1);
        let state = state.migrate().unwrap();
        assert_eq!(state.field("project_name"), Some("old"));
    }

    #[test]
    fn migrate_current_version_is_untouched() {
        let state = complete_state();
        let before = state.fields.clone();
        let migrated = state.migrate().unwrap();
        assert_eq!(migrated.fields, before);
    }

    #[test]
    fn migrate_rejects_newer_version() {
        let mut state = WizardState::new();
        state.version = STATE_VERSION + 1;
        assert!(matches!(
            state.migrate(),
            Err(ScribeError::UnsupportedStateVersion(v)) if v == STATE_VERSION + 1
        ));
    }

    #[test]
    fn migrate_does_not_clobber_existing_new_names() {
        let json = r#"{
            "version": 1,
            "fields": {"site_name": "old", "project_name": "kept"}
        }"#;
        let state: WizardState = serde_json::from_str(json).unwrap();
        let state = state.migrate().unwrap();
        assert_eq!(state.field("project_name"), Some("kept"));
    }

    #[test]
    fn generate_writes_project_files() {
        let dir = TempDir::new().unwrap();
        let report = complete_state().generate(dir.path(), false).unwrap();
        assert!(report.written.contains(&".scribe/config.yaml".to_string()));
        assert!(report.written.contains(&".scribe/skills.json".to_string()));
        assert!(report.written.contains(&"docs/page/index.md".to_string()));
        assert!(report.written.contains(&"docs/post/index.md".to_string()));
        assert!(report.skipped.is_empty());

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.project.name, "my-site");
        assert_eq!(config.project.title.as_deref(), Some("My Site"));

        let starter =
            std::fs::read_to_string(dir.path().join("docs/page/index.md")).unwrap();
        assert!(starter.starts_with("---\ntitle: Page\ntype: page\ndraft: true\n---\n"));

        let gitignore = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert!(gitignore.contains(".scribe/dist/"));
        assert!(gitignore.contains("*.bak"));
    }

    #[test]
    fn generate_skips_existing_without_force() {
        let dir = TempDir::new().unwrap();
        let state = complete_state();
        state.generate(dir.path(), false).unwrap();
        std::fs::write(dir.path().join("docs/page/index.md"), "edited\n").unwrap();

        let report = state.generate(dir.path(), false).unwrap();
        assert!(report.skipped.contains(&".scribe/config.yaml".to_string()));
        assert!(report.skipped.contains(&"docs/page/index.md".to_string()));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("docs/page/index.md")).unwrap(),
            "edited\n"
        );

        let report = state.generate(dir.path(), true).unwrap();
        assert!(report.written.contains(&"docs/page/index.md".to_string()));
        assert_ne!(
            std::fs::read_to_string(dir.path().join("docs/page/index.md")).unwrap(),
            "edited\n"
        );
    }

    #[test]
    fn generate_refuses_incomplete_state() {
        let dir = TempDir::new().unwrap();
        let state = WizardState::new();
        assert!(matches!(
            state.generate(dir.path(), false),
            Err(ScribeError::IncompleteWizard(_))
        ));
        assert!(!dir.path().join(".scribe").exists());
    }

    #[test]
    fn state_json_shape() {
        let state = complete_state();
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains(r#""version":2"#));
        assert!(json.contains(r#""step":"project""#));
        let parsed: WizardState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.field("project_name"), Some("my-site"));
    }
}
