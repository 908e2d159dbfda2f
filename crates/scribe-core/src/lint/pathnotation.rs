use super::{inline_spans, rewrite_lines, FenceTracker, LineChange, LineKind, SpanKind};
use regex::Regex;
use std::sync::OnceLock;

static PATH_RE: OnceLock<Regex> = OnceLock::new();
static DRIVE_RE: OnceLock<Regex> = OnceLock::new();

fn path_re() -> &'static Regex {
    PATH_RE.get_or_init(|| {
        Regex::new(r"^\.{0,2}[/\\]?[\w.@~-]+(?:[/\\][\w.@~-]+)+[/\\]?$").unwrap()
    })
}

fn drive_re() -> &'static Regex {
    DRIVE_RE.get_or_init(|| Regex::new(r"^[A-Za-z]:[/\\]").unwrap())
}

/// Normalize path notation inside inline code spans: backslashes become
/// forward slashes, a leading `./` is dropped, duplicate slashes collapse.
/// Prose, fenced blocks, URLs, and Windows drive paths are untouched.
pub fn apply(body: &str) -> (String, Vec<LineChange>) {
    let mut tracker = FenceTracker::new();
    rewrite_lines(body, |_, line| {
        if tracker.observe(line) != LineKind::Prose {
            return None;
        }
        rewrite_code_spans(line)
    })
}

fn rewrite_code_spans(line: &str) -> Option<String> {
    let spans = inline_spans(line);
    if !spans.iter().any(|s| s.kind == SpanKind::Code) {
        return None;
    }
    let mut out = String::with_capacity(line.len());
    let mut changed = false;
    for span in &spans {
        if span.kind == SpanKind::Text {
            out.push_str(&line[span.range.clone()]);
            continue;
        }
        let open = span.range.start + span.ticks;
        let close = span.range.end - span.ticks;
        match normalize_candidate(&line[open..close]) {
            Some(normalized) => {
                changed = true;
                out.push_str(&line[span.range.start..open]);
                out.push_str(&normalized);
                out.push_str(&line[close..span.range.end]);
            }
            None => out.push_str(&line[span.range.clone()]),
        }
    }
    changed.then_some(out)
}

fn normalize_candidate(content: &str) -> Option<String> {
    if content.contains("://") || drive_re().is_match(content) || !path_re().is_match(content) {
        return None;
    }
    let mut path = content.replace('\\', "/");
    while path.contains("//") {
        path = path.replace("//", "/");
    }
    if let Some(stripped) = path.strip_prefix("./") {
        path = stripped.to_string();
    }
    (path != content).then_some(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
