use crate::output::{print_json, print_table};
use anyhow::Context;
use scribe_core::config::Config;
use scribe_core::lint::{self, LintOptions, Pass};
use std::path::Path;

pub fn run(
    root: &Path,
    passes: &[String],
    dry_run: bool,
    force: bool,
    no_backup: bool,
    path: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    if let Some(dir) = path {
        config.docs.dir = dir.to_string();
    }

    let passes = if passes.is_empty() {
        Pass::all().to_vec()
    } else {
        passes
            .iter()
            .map(|p| p.parse::<Pass>())
            .collect::<Result<Vec<_>, _>>()?
    };

    let options = LintOptions {
        passes,
        dry_run,
        force,
        no_backup,
    };
    let report = lint::run(root, &config, &options).context("lint run failed")?;

    if json {
        return print_json(&report);
    }

    if dry_run {
        println!("Dry run — no files written.");
    }
    println!(
        "Scanned {} file(s): {} changed, {} unchanged, {} skipped",
        report.scanned, report.changed, report.unchanged, report.skipped
    );

    if !report.pass_counts.is_empty() {
        println!();
        let rows: Vec<Vec<String>> = report
            .pass_counts
            .iter()
            .map(|(pass, count)| vec![pass.clone(), count.to_string()])
            .collect();
        print_table(&["PASS", "CHANGES"], rows);
    }

    for file in &report.files {
        let marker = if file.skipped {
            "skipped, backup exists"
        } else {
            "changed"
        };
        println!("\n{} ({marker})", file.path);
        for change in &file.changes {
            println!("  line {} [{}]", change.line, change.pass);
            println!("    - {}", change.before);
            println!("    + {}", change.after);
        }
    }

    Ok(())
}
