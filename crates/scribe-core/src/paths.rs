use crate::error::{Result, ScribeError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SCRIBE_DIR: &str = ".scribe";
pub const DIST_DIR: &str = ".scribe/dist";

pub const CONFIG_FILE: &str = ".scribe/config.yaml";
pub const SKILLS_FILE: &str = ".scribe/skills.json";
pub const BUNDLE_FILE: &str = ".scribe/bundle.yaml";

/// Logical-name to hashed-name map written next to bundled outputs.
pub const BUNDLE_MAP: &str = "manifest.json";

pub const DEFAULT_DOCS_DIR: &str = "docs";
pub const ASSETS_DIR: &str = "assets";

/// Suffix appended to a file path when the lint engine snapshots it.
pub const BACKUP_SUFFIX: &str = ".bak";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn scribe_dir(root: &Path) -> PathBuf {
    root.join(SCRIBE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn skills_path(root: &Path) -> PathBuf {
    root.join(SKILLS_FILE)
}

pub fn bundle_file(root: &Path) -> PathBuf {
    root.join(BUNDLE_FILE)
}

pub fn dist_dir(root: &Path) -> PathBuf {
    root.join(DIST_DIR)
}

pub fn bundle_map_path(root: &Path) -> PathBuf {
    dist_dir(root).join(BUNDLE_MAP)
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(BACKUP_SUFFIX);
    PathBuf::from(s)
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(ScribeError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        for slug in ["my-handbook", "a", "docs-site-2", "x1"] {
            validate_slug(slug).unwrap_or_else(|_| panic!("expected valid: {slug}"));
        }
    }

    #[test]
    fn invalid_slugs() {
        for slug in [
            "",
            "-starts-with-dash",
            "ends-with-dash-",
            "has spaces",
            "UPPER",
            "a_b",
        ] {
            assert!(validate_slug(slug).is_err(), "expected invalid: {slug}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.scribe/config.yaml")
        );
        assert_eq!(
            skills_path(root),
            PathBuf::from("/tmp/proj/.scribe/skills.json")
        );
        assert_eq!(
            bundle_map_path(root),
            PathBuf::from("/tmp/proj/.scribe/dist/manifest.json")
        );
        assert_eq!(
            backup_path(Path::new("docs/guide.md")),
            PathBuf::from("docs/guide.md.bak")
        );
    }
}
