pub mod codeblocks;
pub mod indicators;
pub mod pathnotation;
pub mod terminology;

use crate::config::Config;
use crate::docs::{self, Document};
use crate::error::{Result, ScribeError};
use crate::io;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Pass
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    Codeblocks,
    Paths,
    Terminology,
    Indicators,
}

impl Pass {
    /// All passes in execution order.
    pub fn all() -> &'static [Pass] {
        &[
            Pass::Codeblocks,
            Pass::Paths,
            Pass::Terminology,
            Pass::Indicators,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Pass::Codeblocks => "codeblocks",
            Pass::Paths => "paths",
            Pass::Terminology => "terminology",
            Pass::Indicators => "indicators",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pass {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "codeblocks" => Ok(Pass::Codeblocks),
            "paths" => Ok(Pass::Paths),
            "terminology" => Ok(Pass::Terminology),
            "indicators" => Ok(Pass::Indicators),
            other => Err(ScribeError::InvalidPass(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// One rewritten line. `line` is 1-based within the document body.
#[derive(Debug, Clone)]
pub struct LineChange {
    pub line: usize,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Change {
    pub pass: Pass,
    pub line: usize,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub skipped: bool,
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LintReport {
    pub scanned: usize,
    pub changed: usize,
    pub skipped: usize,
    pub unchanged: usize,
    pub pass_counts: BTreeMap<String, usize>,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Clone)]
pub struct LintOptions {
    pub passes: Vec<Pass>,
    pub dry_run: bool,
    pub force: bool,
    pub no_backup: bool,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            passes: Pass::all().to_vec(),
            dry_run: false,
            force: false,
            no_backup: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Run the selected passes over every markdown file in the docs tree.
///
/// Files that already have a `.bak` snapshot are skipped (with a warning)
/// unless `force` overwrites the snapshot or `no_backup` sidesteps it.
/// `dry_run` collects the full report without touching any file.
pub fn run(root: &Path, config: &Config, options: &LintOptions) -> Result<LintReport> {
    let term_rules = terminology::TermRules::build(config)?;
    let files = docs::list_docs(root, config)?;
    let mut report = LintReport::default();

    for path in files {
        report.scanned += 1;
        let mut doc = match Document::load(&path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                report.skipped += 1;
                continue;
            }
        };

        let mut body = doc.body().to_string();
        let mut changes = Vec::new();
        for pass in &options.passes {
            let (next, line_changes) = match pass {
                Pass::Codeblocks => codeblocks::apply(&body),
                Pass::Paths => pathnotation::apply(&body),
                Pass::Terminology => terminology::apply(&body, &term_rules),
                Pass::Indicators if config.authoring.indicators => indicators::apply(&body),
                Pass::Indicators => (body.clone(), Vec::new()),
            };
            changes.extend(line_changes.into_iter().map(|c| Change {
                pass: *pass,
                line: c.line,
                before: c.before,
                after: c.after,
            }));
            body = next;
        }

        if changes.is_empty() {
            report.unchanged += 1;
            continue;
        }
        for change in &changes {
            *report
                .pass_counts
                .entry(change.pass.as_str().to_string())
                .or_insert(0) += 1;
        }

        let display = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .to_string();

        if !options.dry_run {
            if !options.no_backup && !io::create_backup(&path, options.force)? {
                tracing::warn!(
                    path = %path.display(),
                    "backup already exists, skipping (re-run with --force)"
                );
                report.skipped += 1;
                report.files.push(FileReport {
                    path: display,
                    skipped: true,
                    changes,
                });
                continue;
            }
            doc.set_body(body);
            doc.save()?;
        }

        report.changed += 1;
        report.files.push(FileReport {
            path: display,
            skipped: false,
            changes,
        });
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Markdown scanning shared by the passes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    Prose,
    FenceOpen,
    FenceClose,
    Code,
}

/// Tracks fenced code blocks line by line. Fences open with three or more
/// backticks or tildes (up to 3 spaces of indent) and close on a line of
/// at least as many of the same character and nothing else.
pub(crate) struct FenceTracker {
    fence: Option<(char, usize)>,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self { fence: None }
    }

    pub fn in_fence(&self) -> bool {
        self.fence.is_some()
    }

    pub fn observe(&mut self, line: &str) -> LineKind {
        let trimmed = line.trim_start_matches(' ');
        let indent = line.len() - trimmed.len();
        if let Some((ch, len)) = self.fence {
            let t = trimmed.trim_end();
            if indent <= 3 && !t.is_empty() && t.chars().all(|c| c == ch) && t.chars().count() >= len
            {
                self.fence = None;
                return LineKind::FenceClose;
            }
            return LineKind::Code;
        }
        if indent <= 3 && (trimmed.starts_with("```") || trimmed.starts_with("~~~")) {
            let ch = if trimmed.starts_with('`') { '`' } else { '~' };
            let len = trimmed.chars().take_while(|c| *c == ch).count();
            self.fence = Some((ch, len));
            return LineKind::FenceOpen;
        }
        LineKind::Prose
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpanKind {
    Text,
    Code,
}

#[derive(Debug, Clone)]
pub(crate) struct Span {
    pub kind: SpanKind,
    /// Byte range over the whole line, backticks included for code spans.
    pub range: Range<usize>,
    /// Backtick run length delimiting a code span; 0 for text.
    pub ticks: usize,
}

/// Split a prose line into text and inline-code spans. A code span opens
/// with a backtick run and closes at the next run of the same length;
/// an unclosed run stays literal text.
pub(crate) fn inline_spans(line: &str) -> Vec<Span> {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut text_start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        let run_len = i - run_start;
        let mut j = i;
        let mut close_end = None;
        while j < bytes.len() {
            if bytes[j] != b'`' {
                j += 1;
                continue;
            }
            let s = j;
            while j < bytes.len() && bytes[j] == b'`' {
                j += 1;
            }
            if j - s == run_len {
                close_end = Some(j);
                break;
            }
        }
        if let Some(end) = close_end {
            if text_start < run_start {
                spans.push(Span {
                    kind: SpanKind::Text,
                    range: text_start..run_start,
                    ticks: 0,
                });
            }
            spans.push(Span {
                kind: SpanKind::Code,
                range: run_start..end,
                ticks: run_len,
            });
            text_start = end;
            i = end;
        }
    }
    if text_start < bytes.len() {
        spans.push(Span {
            kind: SpanKind::Text,
            range: text_start..bytes.len(),
            ticks: 0,
        });
    }
    spans
}

/// Rewrite each line of `body` through `edit`, which receives the 0-based
/// line index and the line without its terminator. Returns the new body and
/// the 1-based changes.
pub(crate) fn rewrite_lines<F>(body: &str, mut edit: F) -> (String, Vec<LineChange>)
where
    F: FnMut(usize, &str) -> Option<String>,
{
    let mut changes = Vec::new();
    let mut out = String::with_capacity(body.len());
    let mut idx = 0usize;
    for piece in body.split_inclusive('\n') {
        let (line, terminator) = match piece.strip_suffix("\r\n") {
            Some(l) => (l, "\r\n"),
            None => match piece.strip_suffix('\n') {
                Some(l) => (l, "\n"),
                None => (piece, ""),
            },
        };
        match edit(idx, line) {
            Some(new) if new != line => {
                changes.push(LineChange {
                    line: idx + 1,
                    before: line.to_string(),
                    after: new.clone(),
                });
                out.push_str(&new);
            }
            _ => out.push_str(line),
        }
        out.push_str(terminator);
        idx += 1;
    }
    (out, changes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fence_tracker_backticks() {
        let mut t = FenceTracker::new();
        assert_eq!(t.observe("prose"), LineKind::Prose);
        assert_eq!(t.observe("```rust"), LineKind::FenceOpen);
        assert_eq!(t.observe("let x = 1;"), LineKind::Code);
        assert_eq!(t.observe("```"), LineKind::FenceClose);
        assert_eq!(t.observe("after"), LineKind::Prose);
    }

    #[test]
    fn fence_tracker_tildes_and_longer_close() {
        let mut t = FenceTracker::new();
        assert_eq!(t.observe("~~~"), LineKind::FenceOpen);
        assert_eq!(t.observe("```"), LineKind::Code);
        assert_eq!(t.observe("~~"), LineKind::Code);
        assert_eq!(t.observe("~~~~"), LineKind::FenceClose);
    }

    #[test]
    fn fence_inside_fence_needs_longer_run() {
        let mut t = FenceTracker::new();
        assert_eq!(t.observe("````markdown"), LineKind::FenceOpen);
        assert_eq!(t.observe("```"), LineKind::Code);
        assert_eq!(t.observe("````"), LineKind::FenceClose);
    }

    #[test]
    fn deeply_indented_fence_is_prose() {
        let mut t = FenceTracker::new();
        assert_eq!(t.observe("        ```"), LineKind::Prose);
    }

    #[test]
    fn inline_spans_split() {
        let spans = inline_spans("use `cat file` to read");
        let kinds: Vec<_> = spans.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SpanKind::Text, SpanKind::Code, SpanKind::Text]);
        assert_eq!(&"use `cat file` to read"[spans[1].range.clone()], "`cat file`");
    }

    #[test]
    fn inline_spans_unclosed_backtick_is_text() {
        let spans = inline_spans("a ` b");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Text);
    }

    #[test]
    fn inline_spans_double_backtick() {
        let line = "see ``a ` b`` here";
        let spans = inline_spans(line);
        assert_eq!(spans[1].kind, SpanKind::Code);
        assert_eq!(spans[1].ticks, 2);
        assert_eq!(&line[spans[1].range.clone()], "``a ` b``");
    }

    #[test]
    fn rewrite_lines_preserves_terminators() {
        let body = "one\r\ntwo\nthree";
        let (out, changes) = rewrite_lines(body, |_, line| {
            (line == "two").then(|| "TWO".to_string())
        });
        assert_eq!(out, "one\r\nTWO\nthree");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].line, 2);
        assert_eq!(changes[0].before, "two");
    }

    #[test]
    fn pass_roundtrip() {
        for pass in Pass::all() {
            let parsed: Pass = pass.as_str().parse().unwrap();
            assert_eq!(parsed, *pass);
        }
        assert!("spelling".parse::<Pass>().is_err());
    }

    // -- engine -------------------------------------------------------------

    fn project(content: &str) -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/guide.md"), content).unwrap();
        (dir, Config::new("proj"))
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let content = "See the web-site for details.\n";
        let (dir, config) = project(content);
        let options = LintOptions {
            dry_run: true,
            ..LintOptions::default()
        };
        let report = run(dir.path(), &config, &options).unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.changed, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("docs/guide.md")).unwrap(),
            content
        );
        assert!(!dir.path().join("docs/guide.md.bak").exists());
    }

    #[test]
    fn write_creates_backup() {
        let content = "See the web-site for details.\n";
        let (dir, config) = project(content);
        let report = run(dir.path(), &config, &LintOptions::default()).unwrap();
        assert_eq!(report.changed, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("docs/guide.md")).unwrap(),
            "See the website for details.\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("docs/guide.md.bak")).unwrap(),
            content
        );
    }

    #[test]
    fn existing_backup_skips_file_without_force() {
        let (dir, config) = project("See the web-site for details.\n");
        std::fs::write(dir.path().join("docs/guide.md.bak"), "earlier snapshot").unwrap();
        let report = run(dir.path(), &config, &LintOptions::default()).unwrap();
        assert_eq!(report.changed, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("docs/guide.md")).unwrap(),
            "See the web-site for details.\n"
        );
        // force rewrites both the backup and the file
        let options = LintOptions {
            force: true,
            ..LintOptions::default()
        };
        let report = run(dir.path(), &config, &options).unwrap();
        assert_eq!(report.changed, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("docs/guide.md.bak")).unwrap(),
            "See the web-site for details.\n"
        );
    }

    #[test]
    fn no_backup_writes_without_snapshot() {
        let (dir, config) = project("See the web-site for details.\n");
        let options = LintOptions {
            no_backup: true,
            ..LintOptions::default()
        };
        let report = run(dir.path(), &config, &options).unwrap();
        assert_eq!(report.changed, 1);
        assert!(!dir.path().join("docs/guide.md.bak").exists());
    }

    #[test]
    fn clean_file_counts_unchanged() {
        let (dir, config) = project("Nothing to fix here.\n");
        let report = run(dir.path(), &config, &LintOptions::default()).unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.unchanged, 1);
        assert!(report.files.is_empty());
    }

    #[test]
    fn indicators_pass_respects_config_toggle() {
        let (dir, mut config) = project("**Note:** remember this.\n");
        config.authoring.indicators = false;
        let report = run(dir.path(), &config, &LintOptions::default()).unwrap();
        assert_eq!(report.changed, 0);
        config.authoring.indicators = true;
        let report = run(dir.path(), &config, &LintOptions::default()).unwrap();
        assert_eq!(report.changed, 1);
    }

    #[test]
    fn pass_subset_only_runs_selected() {
        let (dir, config) = project("The web-site uses `docs\\api` paths.\n");
        let options = LintOptions {
            passes: vec![Pass::Paths],
            ..LintOptions::default()
        };
        let report = run(dir.path(), &config, &options).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("docs/guide.md")).unwrap(),
            "The web-site uses `docs/api` paths.\n"
        );
        assert_eq!(report.pass_counts.get("paths"), Some(&1));
        assert!(report.pass_counts.get("terminology").is_none());
    }
}
