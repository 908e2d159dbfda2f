use crate::output::{print_json, print_table};
use anyhow::Context;
use scribe_core::bundle::{self, BundleManifest};
use std::path::Path;

pub fn run(root: &Path, manifest_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let manifest: BundleManifest = match manifest_path {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_yaml::from_str(&data)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => BundleManifest::load(root).context("failed to load bundle manifest")?,
    };

    let report = bundle::bundle(root, &manifest).context("bundling failed")?;

    if json {
        return print_json(&report);
    }

    println!(
        "Bundled {} output(s) into {}",
        report.outputs.len(),
        report.out_dir
    );
    let rows: Vec<Vec<String>> = report
        .outputs
        .iter()
        .map(|o| vec![o.name.clone(), o.file.clone(), format!("{} B", o.bytes)])
        .collect();
    print_table(&["BUNDLE", "FILE", "SIZE"], rows);
    Ok(())
}
