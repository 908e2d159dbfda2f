use super::{inline_spans, rewrite_lines, FenceTracker, LineChange, LineKind, SpanKind};
use crate::config::Config;
use crate::error::{Result, ScribeError};
use regex::{Captures, Regex};

/// Built-in canonical terms. Patterns are written so the canonical form
/// itself never matches, which keeps the pass idempotent.
const DEFAULT_RULES: &[(&str, &str)] = &[
    (r"front[ -]matter", "frontmatter"),
    (r"web[ -]site", "website"),
    (r"wild[ -]card", "wildcard"),
    (r"e-mail", "email"),
    (r"live-?reload", "live reload"),
];

fn wrap_pattern(pattern: &str) -> String {
    format!(r"(?i)\b(?:{pattern})\b")
}

/// Compile a user-supplied terminology pattern with the same wrapping the
/// built-in rules get. Shared with config validation.
pub fn compile_override(pattern: &str) -> Result<Regex> {
    Regex::new(&wrap_pattern(pattern)).map_err(|e| ScribeError::InvalidTermPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

pub struct TermRules {
    rules: Vec<(Regex, String)>,
}

impl TermRules {
    /// Built-in rules first, then the project's `terminology` overrides in
    /// map order.
    pub fn build(config: &Config) -> Result<Self> {
        let mut rules = Vec::with_capacity(DEFAULT_RULES.len() + config.terminology.len());
        for (pattern, term) in DEFAULT_RULES {
            rules.push((compile_override(pattern)?, term.to_string()));
        }
        for (pattern, term) in &config.terminology {
            rules.push((compile_override(pattern)?, term.clone()));
        }
        Ok(Self { rules })
    }

    fn rewrite(&self, text: &str) -> String {
        let mut current = text.to_string();
        for (re, term) in &self.rules {
            if !re.is_match(&current) {
                continue;
            }
            current = re
                .replace_all(&current, |caps: &Captures| match_case(&caps[0], term))
                .into_owned();
        }
        current
    }
}

/// Carry the case of the matched text's first letter onto the replacement.
fn match_case(matched: &str, term: &str) -> String {
    let starts_upper = matched
        .chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false);
    if !starts_upper {
        return term.to_string();
    }
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Rewrite non-canonical terms in prose. Inline code spans and fenced
/// blocks are never rewritten.
pub fn apply(body: &str, rules: &TermRules) -> (String, Vec<LineChange>) {
    let mut tracker = FenceTracker::new();
    rewrite_lines(body, |_, line| {
        if tracker.observe(line) != LineKind::Prose {
            return None;
        }
        rewrite_prose(line, rules)
    })
}

fn rewrite_prose(line: &str, rules: &TermRules) -> Option<String> {
    let spans = inline_spans(line);
    let mut out = String::with_capacity(line.len());
    let mut changed = false;
    for span in &spans {
        let text = &line[span.range.clone()];
        if span.kind == SpanKind::Text {
            let new = rules.rewrite(text);
            if new != text {
                changed = true;
            }
            out.push_str(&new);
        } else {
            out.push_str(text);
        }
    }
    changed.then_some(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
