use anyhow::Context;
use scribe_core::bundle::BundleManifest;
use scribe_core::config::Config;
use scribe_core::{io, paths, skills};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = slug_from_dir(root);

    println!("Initializing scribe in: {}", root.display());

    // 1. Create the directory skeleton
    for dir in [
        paths::scribe_dir(root),
        root.join(paths::DEFAULT_DOCS_DIR),
        root.join(paths::ASSETS_DIR).join("js"),
        root.join(paths::ASSETS_DIR).join("css"),
    ] {
        io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    // 2. Project config
    if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        Config::new(&project_name)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    // 3. Starter skill rules
    if paths::skills_path(root).exists() {
        println!("  exists:  {}", paths::SKILLS_FILE);
    } else {
        skills::default_set()
            .save(root)
            .context("failed to write skills.json")?;
        println!("  created: {}", paths::SKILLS_FILE);
    }

    // 4. Bundle manifest and the assets it points at
    if paths::bundle_file(root).exists() {
        println!("  exists:  {}", paths::BUNDLE_FILE);
    } else {
        BundleManifest::default_manifest()
            .save(root)
            .context("failed to write bundle.yaml")?;
        println!("  created: {}", paths::BUNDLE_FILE);
    }
    for (rel, content) in [
        ("assets/js/site.js", STARTER_JS),
        ("assets/css/site.css", STARTER_CSS),
        ("docs/index.md", STARTER_DOC),
    ] {
        let path = root.join(rel);
        if io::write_if_missing(&path, content.as_bytes())
            .with_context(|| format!("failed to write {rel}"))?
        {
            println!("  created: {rel}");
        } else {
            println!("  exists:  {rel}");
        }
    }

    // 5. Keep generated output and lint snapshots out of version control
    io::ensure_gitignore_entry(root, ".scribe/dist/").context("failed to update .gitignore")?;
    io::ensure_gitignore_entry(root, "*.bak").context("failed to update .gitignore")?;

    println!("\nScribe initialized successfully.");
    println!("Next: quill wizard  (or edit {} directly)", paths::CONFIG_FILE);

    Ok(())
}

/// Derive a slug-valid project name from the root directory name.
fn slug_from_dir(root: &Path) -> String {
    let raw = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut slug = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if paths::validate_slug(&slug).is_ok() {
        slug
    } else {
        "my-site".to_string()
    }
}

// ---------------------------------------------------------------------------
// Starter content
// ---------------------------------------------------------------------------

const STARTER_DOC: &str = r#"---
title: Welcome
type: page
draft: true
---

# Welcome

This page was created by `quill init`. Add markdown files under the docs
directory and run `quill lint` to keep them tidy.
"#;

const STARTER_JS: &str = r#"// Site scripts. Listed in .scribe/bundle.yaml and built by `quill bundle`.
document.addEventListener('DOMContentLoaded', function () {
  document.documentElement.dataset.scribe = 'ready';
});
"#;

const STARTER_CSS: &str = r#"/* Site styles. Listed in .scribe/bundle.yaml and built by `quill bundle`. */
:root {
  --content-width: 44rem;
}

main {
  max-width: var(--content-width);
  margin: 0 auto;
}
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
