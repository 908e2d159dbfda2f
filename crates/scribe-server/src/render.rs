use scribe_core::config::{MarkdownFlavor, MAX_DEBOUNCE_MS, MIN_DEBOUNCE_MS};
use scribe_core::skills::SkillMatch;
use scribe_core::wizard::{FieldError, GenerateReport, WizardState, WizardStep, CONTENT_TYPES};

// ---------------------------------------------------------------------------
// Page shell
// ---------------------------------------------------------------------------

const HTMX_CDN: &str = "https://unpkg.com/htmx.org@2.0.4";

/// Full wizard page. Everything after the first paint happens through HTMX
/// fragment swaps against `#wizard-step`.
pub fn page(state: &WizardState) -> String {
    let step = step_fragment(state, &[]);
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>scribe setup</title>
<link rel="stylesheet" href="/assets/css/app.css">
<script src="{HTMX_CDN}" defer></script>
<script src="/assets/js/wizard.js" defer></script>
<script src="/assets/js/livereload.js" defer></script>
</head>
<body>
<main class="wizard">
<header class="wizard-header"><h1>scribe setup</h1></header>
{step}
</main>
</body>
</html>
"#
    )
}

// ---------------------------------------------------------------------------
// Step fragments
// ---------------------------------------------------------------------------

/// Render the fragment for the session's current step, with inline errors
/// from a rejected submit.
pub fn step_fragment(state: &WizardState, errors: &[FieldError]) -> String {
    let step = state.step;
    let body = match step {
        WizardStep::Project => project_form(state, errors),
        WizardStep::Content => content_form(state, errors),
        WizardStep::Authoring => authoring_form(state, errors),
        WizardStep::Integrations => integrations_form(state, errors),
        WizardStep::Review => review_form(state, errors),
    };
    format!(
        r#"<div id="wizard-step" data-step="{slug}">
{progress}
<h2>{title}</h2>
{body}
</div>"#,
        slug = step.as_str(),
        progress = progress(step),
        title = escape(step.title()),
    )
}

fn progress(current: WizardStep) -> String {
    let items: String = WizardStep::all()
        .iter()
        .map(|s| {
            let class = if *s == current {
                "current"
            } else if s.index() < current.index() {
                "done"
            } else {
                ""
            };
            format!(
                r#"<li class="{class}"><span>{n}</span> {title}</li>"#,
                n = s.index() + 1,
                title = escape(s.title()),
            )
        })
        .collect();
    format!(r#"<ol class="steps">{items}</ol>"#)
}

fn project_form(state: &WizardState, errors: &[FieldError]) -> String {
    let name = text_field(
        "project_name",
        "Project name",
        state.field("project_name").unwrap_or(""),
        "my-site",
        "Lowercase letters, digits, and hyphens. Used as the config slug.",
        errors,
    );
    let title = text_field(
        "project_title",
        "Title",
        state.field("project_title").unwrap_or(""),
        "My Site",
        "Shown in generated pages and reports.",
        errors,
    );
    let description = format!(
        r#"<div class="field">
<label for="project_description">Description <em>optional</em></label>
<textarea id="project_description" name="project_description" rows="3">{}</textarea>
</div>"#,
        escape(state.field("project_description").unwrap_or(""))
    );
    form(
        WizardStep::Project,
        &format!("{name}{title}{description}"),
        "Continue",
    )
}

fn content_form(state: &WizardState, errors: &[FieldError]) -> String {
    let docs_dir = text_field(
        "docs_dir",
        "Docs directory",
        state.docs_dir(),
        "docs",
        "Relative path where Markdown documents live.",
        errors,
    );
    let selected = state.content_types();
    let selected: Vec<&str> = if selected.is_empty() {
        vec!["page", "post"]
    } else {
        selected.iter().map(String::as_str).collect()
    };
    let boxes: String = CONTENT_TYPES
        .iter()
        .map(|t| {
            let checked = if selected.contains(t) { " checked" } else { "" };
            format!(
                r#"<label class="check"><input type="checkbox" data-content-type value="{t}"{checked}> {t}</label>"#
            )
        })
        .collect();
    let types = format!(
        r#"<div class="field">
<label>Content types</label>
<div class="checks">{boxes}</div>
<input type="hidden" id="content_types" name="content_types" value="{value}">
{error}
</div>"#,
        value = escape(&selected.join(",")),
        error = field_error(errors, "content_types"),
    );
    form(
        WizardStep::Content,
        &format!("{docs_dir}{types}"),
        "Continue",
    )
}

fn authoring_form(state: &WizardState, errors: &[FieldError]) -> String {
    let options: String = MarkdownFlavor::all()
        .iter()
        .map(|f| {
            let selected = if *f == state.markdown_flavor() {
                " selected"
            } else {
                ""
            };
            format!(r#"<option value="{v}"{selected}>{v}</option>"#, v = f.as_str())
        })
        .collect();
    let flavor = format!(
        r#"<div class="field">
<label for="markdown_flavor">Markdown flavor</label>
<select id="markdown_flavor" name="markdown_flavor">{options}</select>
{error}
</div>"#,
        error = field_error(errors, "markdown_flavor"),
    );
    let indicators = toggle_field(
        "indicators",
        "Insert visual indicators (✅ ❌ ⚠️) on labelled callouts",
        state.indicators(),
        errors,
    );
    let suggest = r##"<div class="field">
<label for="skill-q">Which helper skills would activate?</label>
<input id="skill-q" name="q" type="search" placeholder="e.g. clean up frontmatter across my posts"
 hx-get="/wizard/skills/suggest" hx-trigger="input changed delay:300ms" hx-target="#skill-suggest">
<div id="skill-suggest"></div>
</div>"##;
    form(
        WizardStep::Authoring,
        &format!("{flavor}{indicators}{suggest}"),
        "Continue",
    )
}

fn integrations_form(state: &WizardState, errors: &[FieldError]) -> String {
    let live = toggle_field(
        "live_reload",
        "Reload the browser when docs or assets change",
        state.live_reload(),
        errors,
    );
    let debounce = format!(
        r#"<div class="field">
<label for="reload_debounce_ms">Reload debounce (ms)</label>
<input id="reload_debounce_ms" name="reload_debounce_ms" type="number"
 min="{MIN_DEBOUNCE_MS}" max="{MAX_DEBOUNCE_MS}" value="{value}">
{error}
</div>"#,
        value = state.reload_debounce_ms(),
        error = field_error(errors, "reload_debounce_ms"),
    );
    form(
        WizardStep::Integrations,
        &format!("{live}{debounce}"),
        "Continue",
    )
}

fn review_form(state: &WizardState, errors: &[FieldError]) -> String {
    let banner = if errors.is_empty() {
        String::new()
    } else {
        let items: String = errors
            .iter()
            .map(|e| format!("<li><code>{}</code> {}</li>", escape(&e.field), escape(&e.message)))
            .collect();
        format!(r#"<ul class="errors">{items}</ul>"#)
    };
    let rows = [
        ("Project", state.field("project_name").unwrap_or("").to_string()),
        ("Title", state.field("project_title").unwrap_or("").to_string()),
        ("Docs directory", state.docs_dir().to_string()),
        ("Content types", state.content_types().join(", ")),
        ("Markdown flavor", state.markdown_flavor().as_str().to_string()),
        ("Indicators", state.indicators().to_string()),
        ("Live reload", state.live_reload().to_string()),
        ("Debounce", format!("{} ms", state.reload_debounce_ms())),
    ];
    let dl: String = rows
        .iter()
        .map(|(k, v)| format!("<dt>{k}</dt><dd>{}</dd>", escape(v)))
        .collect();
    format!(
        r##"{banner}
<dl class="summary">{dl}</dl>
<form hx-post="/wizard/generate" hx-target="#wizard-step" hx-swap="outerHTML">
<label class="check"><input type="checkbox" name="force" value="true"> Overwrite existing files</label>
<div class="actions">{back}<button type="submit" class="primary">Generate project</button></div>
</form>"##,
        back = back_button(WizardStep::Review),
    )
}

fn form(step: WizardStep, fields: &str, submit: &str) -> String {
    format!(
        r##"<form hx-post="/wizard/step/{slug}" hx-target="#wizard-step" hx-swap="outerHTML">
{fields}
<div class="actions">{back}<button type="submit" class="primary">{submit}</button></div>
</form>"##,
        slug = step.as_str(),
        back = back_button(step),
    )
}

fn back_button(step: WizardStep) -> String {
    match step.prev() {
        Some(prev) => format!(
            r##"<button type="button" hx-get="/wizard/step/{slug}" hx-target="#wizard-step" hx-swap="outerHTML">Back</button>"##,
            slug = prev.as_str(),
        ),
        None => String::new(),
    }
}

fn text_field(
    name: &str,
    label: &str,
    value: &str,
    placeholder: &str,
    hint: &str,
    errors: &[FieldError],
) -> String {
    format!(
        r#"<div class="field">
<label for="{name}">{label}</label>
<input id="{name}" name="{name}" type="text" value="{value}" placeholder="{placeholder}">
<p class="hint">{hint}</p>
{error}
</div>"#,
        value = escape(value),
        placeholder = escape(placeholder),
        hint = escape(hint),
        error = field_error(errors, name),
    )
}

/// Checkbox that always submits a value: the hidden input carries `false`
/// and the checkbox, listed after it, overrides with `true` when checked.
fn toggle_field(name: &str, label: &str, on: bool, errors: &[FieldError]) -> String {
    let checked = if on { " checked" } else { "" };
    format!(
        r#"<div class="field">
<input type="hidden" name="{name}" value="false">
<label class="check"><input type="checkbox" name="{name}" value="true"{checked}> {label}</label>
{error}
</div>"#,
        label = escape(label),
        error = field_error(errors, name),
    )
}

fn field_error(errors: &[FieldError], name: &str) -> String {
    let messages: Vec<&str> = errors
        .iter()
        .filter(|e| e.field == name)
        .map(|e| e.message.as_str())
        .collect();
    if messages.is_empty() {
        return String::new();
    }
    format!(r#"<p class="field-error">{}</p>"#, escape(&messages.join("; ")))
}

// ---------------------------------------------------------------------------
// Generation summary
// ---------------------------------------------------------------------------

pub fn summary_fragment(report: &GenerateReport) -> String {
    let written = if report.written.is_empty() {
        String::new()
    } else {
        let items: String = report
            .written
            .iter()
            .map(|f| format!("<li><code>{}</code></li>", escape(f)))
            .collect();
        format!(r#"<h3>Written</h3><ul class="report written">{items}</ul>"#)
    };
    let skipped = if report.skipped.is_empty() {
        String::new()
    } else {
        let items: String = report
            .skipped
            .iter()
            .map(|f| format!("<li><code>{}</code></li>", escape(f)))
            .collect();
        format!(
            r##"<h3>Skipped (already exist)</h3><ul class="report skipped">{items}</ul>
<form hx-post="/wizard/generate" hx-target="#wizard-step" hx-swap="outerHTML">
<input type="hidden" name="force" value="true">
<button type="submit">Overwrite skipped files</button>
</form>"##
        )
    };
    format!(
        r#"<div id="wizard-step" data-step="done">
<h2>Project generated</h2>
{written}{skipped}
<p class="hint">Next: edit your docs, then run <code>quill lint</code> to tidy them.</p>
</div>"#
    )
}

// ---------------------------------------------------------------------------
// Skill suggestions
// ---------------------------------------------------------------------------

pub fn suggest_fragment(matches: &[SkillMatch]) -> String {
    if matches.is_empty() {
        return r#"<p class="suggest-empty">No skills would activate for this prompt.</p>"#
            .to_string();
    }
    let items: String = matches
        .iter()
        .map(|m| {
            format!(
                r#"<li><strong>{name}</strong> <span class="score">score {score}</span><p>{desc}</p></li>"#,
                name = escape(&m.name),
                score = m.score,
                desc = escape(&m.description),
            )
        })
        .collect();
    format!(r#"<ul class="suggest">{items}</ul>"#)
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Minimal HTML escaping for text and attribute positions.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(fields: &[(&str, &str)]) -> WizardState {
        let mut state = WizardState::new();
        state.apply_fields(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        state
    }

    #[test]
    fn page_links_stylesheet_and_scripts() {
        let html = page(&WizardState::new());
        assert!(html.contains("/assets/css/app.css"));
        assert!(html.contains("htmx.org"));
        assert!(html.contains("/assets/js/wizard.js"));
        assert!(html.contains("/assets/js/livereload.js"));
        assert!(html.contains(r#"data-step="project""#));
    }

    #[test]
    fn project_fragment_prefills_values() {
        let state = state_with(&[("project_name", "my-site"), ("project_title", "My Site")]);
        let html = step_fragment(&state, &[]);
        assert!(html.contains(r#"value="my-site""#));
        assert!(html.contains(r#"value="My Site""#));
        assert!(html.contains(r#"hx-post="/wizard/step/project""#));
    }

    #[test]
    fn fragment_renders_inline_errors() {
        let state = WizardState::new();
        let errors = state.validate_step(WizardStep::Project);
        let html = step_fragment(&state, &errors);
        assert!(html.contains("field-error"));
        assert!(html.contains("project name is required"));
    }

    #[test]
    fn content_fragment_checks_selected_types() {
        let mut state = state_with(&[("content_types", "doc,changelog")]);
        state.set_step(WizardStep::Content);
        let html = step_fragment(&state, &[]);
        assert!(html.contains(r#"value="doc" checked"#));
        assert!(html.contains(r#"value="changelog" checked"#));
        assert!(!html.contains(r#"value="post" checked"#));
        assert!(html.contains(r#"name="content_types" value="doc,changelog""#));
    }

    #[test]
    fn content_fragment_defaults_to_page_and_post() {
        let mut state = WizardState::new();
        state.set_step(WizardStep::Content);
        let html = step_fragment(&state, &[]);
        assert!(html.contains(r#"value="page" checked"#));
        assert!(html.contains(r#"value="post" checked"#));
    }

    #[test]
    fn first_step_has_no_back_button() {
        let html = step_fragment(&WizardState::new(), &[]);
        assert!(!html.contains(">Back<"));
    }

    #[test]
    fn later_steps_link_back_to_previous() {
        let mut state = WizardState::new();
        state.set_step(WizardStep::Authoring);
        let html = step_fragment(&state, &[]);
        assert!(html.contains(r#"hx-get="/wizard/step/content""#));
    }

    #[test]
    fn review_fragment_summarizes_effective_values() {
        let mut state = state_with(&[
            ("project_name", "my-site"),
            ("project_title", "My Site"),
            ("live_reload", "false"),
        ]);
        state.set_step(WizardStep::Review);
        let html = step_fragment(&state, &[]);
        assert!(html.contains("my-site"));
        assert!(html.contains("<dd>docs</dd>"));
        assert!(html.contains("<dd>false</dd>"));
        assert!(html.contains(r#"hx-post="/wizard/generate""#));
        assert!(html.contains(r#"name="force""#));
    }

    #[test]
    fn summary_fragment_lists_written_and_skipped() {
        let report = GenerateReport {
            written: vec![".scribe/config.yaml".to_string()],
            skipped: vec!["docs/page/index.md".to_string()],
        };
        let html = summary_fragment(&report);
        assert!(html.contains(".scribe/config.yaml"));
        assert!(html.contains("docs/page/index.md"));
        assert!(html.contains("Overwrite skipped files"));
    }

    #[test]
    fn summary_fragment_without_skips_has_no_force_form() {
        let report = GenerateReport {
            written: vec![".scribe/config.yaml".to_string()],
            skipped: vec![],
        };
        let html = summary_fragment(&report);
        assert!(!html.contains("Overwrite skipped files"));
    }

    #[test]
    fn suggest_fragment_renders_matches() {
        let set = scribe_core::skills::default_set();
        let matcher = set.matcher().unwrap();
        let matches = matcher.match_prompt("fix the markdown headings in my docs");
        assert!(!matches.is_empty());
        let html = suggest_fragment(&matches);
        assert!(html.contains("markdown-style"));
        assert!(html.contains("score"));
    }

    #[test]
    fn suggest_fragment_handles_no_matches() {
        let html = suggest_fragment(&[]);
        assert!(html.contains("No skills would activate"));
    }

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x")</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("a & b"), "a &amp; b");
    }

    #[test]
    fn field_values_are_escaped_in_fragments() {
        let state = state_with(&[("project_title", r#""><script>"#)]);
        let html = step_fragment(&state, &[]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
    }
}
