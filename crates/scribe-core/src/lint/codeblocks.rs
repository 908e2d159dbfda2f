use super::{rewrite_lines, FenceTracker, LineChange, LineKind};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Tag untagged fenced code blocks with a language inferred from their
/// content. Only the opening fence line is rewritten; fence characters and
/// indentation are preserved. A fence that never closes is left alone.
pub fn apply(body: &str) -> (String, Vec<LineChange>) {
    let lines: Vec<&str> = body.lines().collect();
    let mut retag: HashMap<usize, String> = HashMap::new();
    let mut tracker = FenceTracker::new();
    let mut pending: Option<(usize, String)> = None;
    let mut block: Vec<&str> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        match tracker.observe(line) {
            LineKind::FenceOpen => {
                let trimmed = line.trim_start_matches(' ');
                let indent = &line[..line.len() - trimmed.len()];
                let ch = if trimmed.starts_with('`') { '`' } else { '~' };
                let run: String = trimmed.chars().take_while(|c| *c == ch).collect();
                if trimmed[run.len()..].trim().is_empty() {
                    pending = Some((idx, format!("{indent}{run}")));
                    block.clear();
                }
            }
            LineKind::Code => {
                if pending.is_some() {
                    block.push(line);
                }
            }
            LineKind::FenceClose => {
                if let Some((open_idx, prefix)) = pending.take() {
                    let lang = detect_language(&block);
                    retag.insert(open_idx, format!("{prefix}{lang}"));
                }
                block.clear();
            }
            LineKind::Prose => {}
        }
    }

    rewrite_lines(body, |idx, _| retag.get(&idx).cloned())
}

// ---------------------------------------------------------------------------
// Language heuristics
// ---------------------------------------------------------------------------

static YAML_KEY_RE: OnceLock<Regex> = OnceLock::new();
static TOML_SECTION_RE: OnceLock<Regex> = OnceLock::new();

fn yaml_key_re() -> &'static Regex {
    YAML_KEY_RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*:\s+\S").unwrap())
}

fn toml_section_re() -> &'static Regex {
    TOML_SECTION_RE.get_or_init(|| Regex::new(r"^\[[A-Za-z0-9_.-]+\]$").unwrap())
}

/// Best-effort language guess, checked in a fixed order so the result is
/// deterministic for mixed content. Falls back to `text`.
fn detect_language(lines: &[&str]) -> &'static str {
    let content: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    let Some(first) = content.first() else {
        return "text";
    };

    if let Some(interp) = first.strip_prefix("#!") {
        if interp.contains("python") {
            return "python";
        }
        if interp.contains("node") {
            return "javascript";
        }
        return "bash";
    }
    if content.iter().any(|l| l.starts_with("$ ")) {
        return "bash";
    }
    if (first.starts_with('{') || first.starts_with('['))
        && lines.iter().any(|l| l.contains("\":"))
    {
        return "json";
    }
    if first.starts_with('<') {
        return "html";
    }
    if content.iter().any(|l| yaml_key_re().is_match(l)) {
        return "yaml";
    }
    if content.iter().any(|l| {
        matches!(
            l.split_whitespace().next().unwrap_or(""),
            "SELECT" | "INSERT" | "UPDATE" | "DELETE" | "CREATE" | "ALTER" | "DROP"
        )
    }) {
        return "sql";
    }
    if content.iter().any(|l| {
        l.starts_with("fn ")
            || l.starts_with("pub fn ")
            || l.starts_with("let ")
            || l.starts_with("use ")
            || l.starts_with("impl ")
    }) {
        return "rust";
    }
    if content
        .iter()
        .any(|l| l.contains("function ") || l.starts_with("const ") || l.contains("=>"))
    {
        return "javascript";
    }
    if content
        .iter()
        .any(|l| l.starts_with("def ") || l.starts_with("import ") || l.contains("print("))
    {
        return "python";
    }
    if content.iter().any(|l| toml_section_re().is_match(l))
        && content.iter().any(|l| l.contains(" = "))
    {
        return "toml";
    }
    "text"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
