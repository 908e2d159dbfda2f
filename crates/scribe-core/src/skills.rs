use crate::error::{Result, ScribeError};
use crate::io;
use crate::paths;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Minimum score a rule must reach before `best` will activate it.
pub const MIN_ACTIVATION_SCORE: u32 = 2;

pub const KEYWORD_WEIGHT: u32 = 2;
pub const PATTERN_WEIGHT: u32 = 3;

// ---------------------------------------------------------------------------
// Rule file model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Tie-breaker between rules with equal scores. Higher wins.
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSet {
    #[serde(default = "default_version")]
    pub version: u32,
    pub skills: Vec<SkillRule>,
}

fn default_version() -> u32 {
    1
}

impl SkillSet {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::skills_path(root);
        if !path.exists() {
            return Err(ScribeError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let set: SkillSet = serde_json::from_str(&data)?;
        Ok(set)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::skills_path(root);
        let mut data = serde_json::to_string_pretty(self)?;
        data.push('\n');
        io::atomic_write(&path, data.as_bytes())
    }

    /// Structural checks that don't require compiling anything against a
    /// prompt: unique slug names, non-empty keywords, patterns that compile.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for rule in &self.skills {
            paths::validate_slug(&rule.name)?;
            if !seen.insert(rule.name.as_str()) {
                return Err(ScribeError::DuplicateSkill(rule.name.clone()));
            }
            if rule.keywords.is_empty() && rule.patterns.is_empty() {
                return Err(ScribeError::InvalidSkillRule {
                    skill: rule.name.clone(),
                    reason: "needs at least one keyword or pattern".to_string(),
                });
            }
            for kw in &rule.keywords {
                if kw.trim().is_empty() {
                    return Err(ScribeError::InvalidSkillRule {
                        skill: rule.name.clone(),
                        reason: "empty keyword".to_string(),
                    });
                }
            }
            for pattern in &rule.patterns {
                if let Err(e) = Regex::new(pattern) {
                    return Err(ScribeError::InvalidSkillPattern {
                        skill: rule.name.clone(),
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn matcher(&self) -> Result<SkillMatcher> {
        self.validate()?;
        let mut rules = Vec::with_capacity(self.skills.len());
        for rule in &self.skills {
            let mut keywords = Vec::with_capacity(rule.keywords.len());
            for kw in &rule.keywords {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(kw))).map_err(|e| {
                    ScribeError::InvalidSkillRule {
                        skill: rule.name.clone(),
                        reason: format!("keyword '{kw}' does not compile: {e}"),
                    }
                })?;
                keywords.push((kw.clone(), re));
            }
            let mut patterns = Vec::with_capacity(rule.patterns.len());
            for pattern in &rule.patterns {
                let re =
                    Regex::new(pattern).map_err(|e| ScribeError::InvalidSkillPattern {
                        skill: rule.name.clone(),
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?;
                patterns.push((pattern.clone(), re));
            }
            rules.push(CompiledRule {
                name: rule.name.clone(),
                description: rule.description.clone(),
                priority: rule.priority,
                keywords,
                patterns,
            });
        }
        Ok(SkillMatcher { rules })
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

struct CompiledRule {
    name: String,
    description: String,
    priority: i32,
    keywords: Vec<(String, Regex)>,
    patterns: Vec<(String, Regex)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillMatch {
    pub name: String,
    pub description: String,
    pub score: u32,
    pub priority: i32,
    pub matched_keywords: Vec<String>,
    pub matched_patterns: Vec<String>,
}

pub struct SkillMatcher {
    rules: Vec<CompiledRule>,
}

impl SkillMatcher {
    /// Score every rule against `prompt` and return the hits, best first.
    ///
    /// A keyword counts once no matter how often it occurs; keywords match
    /// case-insensitively on word boundaries. Ties break on priority, then
    /// name, so the ordering is stable across runs.
    pub fn match_prompt(&self, prompt: &str) -> Vec<SkillMatch> {
        let mut matches = Vec::new();
        for rule in &self.rules {
            let matched_keywords: Vec<String> = rule
                .keywords
                .iter()
                .filter(|(_, re)| re.is_match(prompt))
                .map(|(kw, _)| kw.clone())
                .collect();
            let matched_patterns: Vec<String> = rule
                .patterns
                .iter()
                .filter(|(_, re)| re.is_match(prompt))
                .map(|(p, _)| p.clone())
                .collect();
            let score = matched_keywords.len() as u32 * KEYWORD_WEIGHT
                + matched_patterns.len() as u32 * PATTERN_WEIGHT;
            if score > 0 {
                matches.push(SkillMatch {
                    name: rule.name.clone(),
                    description: rule.description.clone(),
                    score,
                    priority: rule.priority,
                    matched_keywords,
                    matched_patterns,
                });
            }
        }
        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.priority.cmp(&a.priority))
                .then(a.name.cmp(&b.name))
        });
        matches
    }

    /// Top match, if any clears the activation threshold.
    pub fn best(&self, prompt: &str) -> Option<SkillMatch> {
        self.match_prompt(prompt)
            .into_iter()
            .find(|m| m.score >= MIN_ACTIVATION_SCORE)
    }
}

// ---------------------------------------------------------------------------
// Starter rules
// ---------------------------------------------------------------------------

/// Rule set written by `quill init`. Covers the authoring workflows the
/// wizard and lint passes are built around.
pub fn default_set() -> SkillSet {
    fn rule(
        name: &str,
        description: &str,
        keywords: &[&str],
        patterns: &[&str],
        priority: i32,
    ) -> SkillRule {
        SkillRule {
            name: name.to_string(),
            description: description.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            priority,
        }
    }

    SkillSet {
        version: 1,
        skills: vec![
            rule(
                "content-modeling",
                "Designing content types, fields, and taxonomies",
                &["content type", "content model", "schema", "field", "taxonomy"],
                &[r"(?i)\bmodel(?:ing)?\s+(?:the\s+)?content\b"],
                2,
            ),
            rule(
                "frontmatter-hygiene",
                "Keeping document metadata consistent and valid",
                &["frontmatter", "front matter", "metadata", "yaml header"],
                &[r"(?i)\bfront[- ]?matter\b"],
                1,
            ),
            rule(
                "markdown-style",
                "Formatting and linting markdown prose",
                &["markdown", "formatting", "style guide", "lint"],
                &[r"(?i)\blint(?:ing|er)?\b"],
                1,
            ),
            rule(
                "media-management",
                "Handling images and other embedded assets",
                &["image", "asset", "upload", "figure", "screenshot"],
                &[],
                0,
            ),
            rule(
                "publishing-workflow",
                "Drafting, reviewing, and releasing content",
                &["publish", "draft", "review", "release", "schedule"],
                &[r"(?i)\bgo\s+live\b"],
                1,
            ),
            rule(
                "localization",
                "Translating content across languages",
                &["locale", "translation", "i18n", "language"],
                &[],
                0,
            ),
        ],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
