use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("not initialized: run 'quill init'")]
    NotInitialized,

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("duplicate skill name: {0}")]
    DuplicateSkill(String),

    #[error("invalid rule in skill '{skill}': {reason}")]
    InvalidSkillRule { skill: String, reason: String },

    #[error("invalid pattern '{pattern}' in skill '{skill}': {reason}")]
    InvalidSkillPattern {
        skill: String,
        pattern: String,
        reason: String,
    },

    #[error("invalid terminology pattern '{pattern}': {reason}")]
    InvalidTermPattern { pattern: String, reason: String },

    #[error("invalid lint pass: {0}")]
    InvalidPass(String),

    #[error("invalid markdown flavor: {0}")]
    InvalidFlavor(String),

    #[error("invalid wizard step: {0}")]
    InvalidStep(String),

    #[error("unsupported wizard state version: {0}")]
    UnsupportedStateVersion(u32),

    #[error("wizard state incomplete: {0}")]
    IncompleteWizard(String),

    #[error("invalid change kind: {0}")]
    InvalidChangeKind(String),

    #[error("bundle source not found: {0}")]
    MissingBundleSource(String),

    #[error("bundle has no sources: {0}")]
    EmptyBundle(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScribeError>;
