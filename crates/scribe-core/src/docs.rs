use crate::config::Config;
use crate::error::Result;
use crate::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A markdown file split into an optional frontmatter block and a body.
///
/// The frontmatter is kept as the raw text of the whole block, delimiters
/// included, and is written back byte for byte. Lint passes only ever touch
/// the body, so author formatting and key order in the YAML survive a
/// rewrite untouched.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    frontmatter: Option<String>,
    body: String,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, &content))
    }

    /// Split `content` at the closing `---` line. A block that never closes
    /// is not frontmatter; the whole file becomes the body.
    pub fn parse(path: &Path, content: &str) -> Self {
        let (frontmatter, body) = split_frontmatter(content);
        Self {
            path: path.to_path_buf(),
            frontmatter: frontmatter.map(str::to_string),
            body: body.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: String) {
        self.body = body;
    }

    pub fn frontmatter_raw(&self) -> Option<&str> {
        self.frontmatter.as_deref()
    }

    /// Parsed view of the frontmatter for reads. YAML that doesn't parse is
    /// logged and treated as absent; the raw text is still written back.
    pub fn frontmatter_fields(&self) -> Option<serde_yaml::Value> {
        let inner = self.frontmatter_inner()?;
        match serde_yaml::from_str(inner) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "invalid frontmatter yaml");
                None
            }
        }
    }

    fn frontmatter_inner(&self) -> Option<&str> {
        let raw = self.frontmatter.as_deref()?;
        let (_, after_open) = raw.split_once('\n')?;
        let s = after_open.trim_end_matches(['\r', '\n']);
        let s = s.strip_suffix("---")?;
        let s = s.strip_suffix('\n').unwrap_or(s);
        Some(s.strip_suffix('\r').unwrap_or(s))
    }

    /// Full file content, frontmatter block first.
    pub fn content(&self) -> String {
        match &self.frontmatter {
            Some(fm) => format!("{fm}{}", self.body),
            None => self.body.clone(),
        }
    }

    pub fn save(&self) -> Result<()> {
        io::atomic_write(&self.path, self.content().as_bytes())
    }
}

fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content.strip_prefix("---") else {
        return (None, content);
    };
    let Some(after_open) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) else {
        return (None, content);
    };
    let open_len = content.len() - after_open.len();
    let mut offset = 0usize;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let end = open_len + offset + line.len();
            return (Some(&content[..end]), &content[end..]);
        }
        offset += line.len();
    }
    (None, content)
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Markdown files under the configured docs directory, sorted by path.
/// Hidden files and directories are skipped, as is anything whose extension
/// is not in `docs.extensions` (which also screens out `.bak` snapshots).
pub fn list_docs(root: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let dir = root.join(&config.docs.dir);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    let walker = WalkDir::new(&dir).into_iter().filter_entry(|e| {
        let hidden = e
            .file_name()
            .to_str()
            .map(|n| n.starts_with('.'))
            .unwrap_or(false);
        e.depth() == 0 || !hidden
    });
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches_ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| config.docs.extensions.iter().any(|x| x == e))
            .unwrap_or(false);
        if matches_ext {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
