use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use scribe_core::skills::SkillSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum SkillsSubcommand {
    /// List the configured skill rules
    List,

    /// Check rule names, keywords, and patterns
    Validate,

    /// Score the rules against a prompt
    Match {
        /// Prompt text to score, e.g. "help me lint my markdown"
        prompt: String,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: SkillsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SkillsSubcommand::List => list(root, json),
        SkillsSubcommand::Validate => validate(root, json),
        SkillsSubcommand::Match { prompt } => match_prompt(root, &prompt, json),
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let set = SkillSet::load(root).context("failed to load skill rules")?;

    if json {
        return print_json(&set);
    }

    let rows: Vec<Vec<String>> = set
        .skills
        .iter()
        .map(|rule| {
            vec![
                rule.name.clone(),
                rule.priority.to_string(),
                rule.keywords.len().to_string(),
                rule.patterns.len().to_string(),
                rule.description.clone(),
            ]
        })
        .collect();
    print_table(
        &["NAME", "PRIORITY", "KEYWORDS", "PATTERNS", "DESCRIPTION"],
        rows,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let set = SkillSet::load(root).context("failed to load skill rules")?;
    set.validate()?;

    if json {
        print_json(&serde_json::json!({
            "valid": true,
            "skills": set.skills.len(),
        }))?;
    } else {
        println!("{} skill rule(s) valid.", set.skills.len());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// match
// ---------------------------------------------------------------------------

fn match_prompt(root: &Path, prompt: &str, json: bool) -> anyhow::Result<()> {
    let set = SkillSet::load(root).context("failed to load skill rules")?;
    let matcher = set.matcher()?;
    let matches = matcher.match_prompt(prompt);

    if json {
        return print_json(&matches);
    }

    if matches.is_empty() {
        println!("No skills match.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = matches
        .iter()
        .map(|m| {
            let mut hits = m.matched_keywords.clone();
            hits.extend(m.matched_patterns.iter().map(|p| format!("/{p}/")));
            vec![m.name.clone(), m.score.to_string(), hits.join(", ")]
        })
        .collect();
    print_table(&["SKILL", "SCORE", "MATCHED"], rows);

    match matcher.best(prompt) {
        Some(best) => println!("\nWould activate: {}", best.name),
        None => println!("\nNo rule clears the activation threshold."),
    }
    Ok(())
}
