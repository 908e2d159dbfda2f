use super::{rewrite_lines, FenceTracker, LineChange, LineKind};
use regex::Regex;
use std::sync::OnceLock;

const INDICATORS: &[(&str, &str)] = &[
    ("Good", "✅"),
    ("Bad", "❌"),
    ("Warning", "⚠️"),
    ("Note", "ℹ️"),
    ("Tip", "💡"),
];

static LABEL_RE: OnceLock<Regex> = OnceLock::new();

// Optional list/quote markers, then the bold label right away. A line that
// already carries an indicator has the emoji before `**` and won't match.
fn label_re() -> &'static Regex {
    LABEL_RE.get_or_init(|| {
        Regex::new(r"^(\s*(?:[-*>]\s+)*)\*\*(Good|Bad|Warning|Note|Tip):\*\*").unwrap()
    })
}

fn emoji_for(label: &str) -> Option<&'static str> {
    INDICATORS
        .iter()
        .find(|(word, _)| *word == label)
        .map(|(_, emoji)| *emoji)
}

/// Prefix `**Good:**`-style labels with their visual indicator. Fenced
/// blocks are skipped; running twice is a no-op.
pub fn apply(body: &str) -> (String, Vec<LineChange>) {
    let mut tracker = FenceTracker::new();
    rewrite_lines(body, |_, line| {
        if tracker.observe(line) != LineKind::Prose {
            return None;
        }
        let caps = label_re().captures(line)?;
        let whole = caps.get(0)?;
        let label = &caps[2];
        let emoji = emoji_for(label)?;
        Some(format!(
            "{}{} **{}:**{}",
            &caps[1],
            emoji,
            label,
            &line[whole.end()..]
        ))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
