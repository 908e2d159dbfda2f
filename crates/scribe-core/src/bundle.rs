use crate::error::{Result, ScribeError};
use crate::io;
use crate::paths;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Manifest model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleKind {
    Script,
    Style,
}

impl BundleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleKind::Script => "script",
            BundleKind::Style => "style",
        }
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleSpec {
    /// Logical output name, e.g. `app.js`. The written file carries a
    /// content hash between stem and extension.
    pub name: String,
    pub kind: BundleKind,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
    pub bundles: Vec<BundleSpec>,
}

fn default_version() -> u32 {
    1
}

fn default_out_dir() -> String {
    paths::DIST_DIR.to_string()
}

impl BundleManifest {
    /// Load `.scribe/bundle.yaml`, falling back to the default layout when
    /// the project has none.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::bundle_file(root);
        if !path.exists() {
            return Ok(Self::default_manifest());
        }
        let data = std::fs::read_to_string(&path)?;
        let manifest: BundleManifest = serde_yaml::from_str(&data)?;
        Ok(manifest)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::bundle_file(root);
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&path, data.as_bytes())
    }

    pub fn default_manifest() -> Self {
        Self {
            version: 1,
            out_dir: default_out_dir(),
            bundles: vec![
                BundleSpec {
                    name: "app.js".to_string(),
                    kind: BundleKind::Script,
                    sources: vec!["assets/js/site.js".to_string()],
                },
                BundleSpec {
                    name: "app.css".to_string(),
                    kind: BundleKind::Style,
                    sources: vec!["assets/css/site.css".to_string()],
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Bundling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BundleOutput {
    pub name: String,
    pub file: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleReport {
    pub out_dir: String,
    pub outputs: Vec<BundleOutput>,
}

/// Concatenate each bundle's sources into a hash-named output file and
/// write the logical-to-hashed name map alongside.
///
/// Stale outputs from earlier runs of the same bundle are removed, so the
/// out dir only ever holds one generation per logical name.
pub fn bundle(root: &Path, manifest: &BundleManifest) -> Result<BundleReport> {
    let out_dir = root.join(&manifest.out_dir);
    io::ensure_dir(&out_dir)?;

    let mut map: BTreeMap<String, String> = BTreeMap::new();
    let mut outputs = Vec::with_capacity(manifest.bundles.len());

    for spec in &manifest.bundles {
        if spec.sources.is_empty() {
            return Err(ScribeError::EmptyBundle(spec.name.clone()));
        }
        let mut content = String::new();
        for source in &spec.sources {
            let path = root.join(source);
            if !path.is_file() {
                return Err(ScribeError::MissingBundleSource(source.clone()));
            }
            let chunk = std::fs::read_to_string(&path)?;
            content.push_str(&format!("/* source: {source} */\n"));
            content.push_str(&chunk);
            if !chunk.ends_with('\n') {
                content.push('\n');
            }
        }

        let hashed = hashed_name(&spec.name, content.as_bytes());
        remove_stale_outputs(&out_dir, &spec.name, &hashed)?;
        io::atomic_write(&out_dir.join(&hashed), content.as_bytes())?;
        tracing::debug!(bundle = %spec.name, file = %hashed, "wrote bundle");

        map.insert(spec.name.clone(), hashed.clone());
        outputs.push(BundleOutput {
            name: spec.name.clone(),
            file: hashed,
            bytes: content.len(),
        });
    }

    let mut map_json = serde_json::to_string_pretty(&map)?;
    map_json.push('\n');
    io::atomic_write(&out_dir.join(paths::BUNDLE_MAP), map_json.as_bytes())?;

    Ok(BundleReport {
        out_dir: manifest.out_dir.clone(),
        outputs,
    })
}

/// Resolve a logical bundle name to its current hashed file, if built.
/// Honors the out dir of the project's manifest, so a custom `out_dir`
/// resolves the same way it was written.
pub fn lookup(root: &Path, logical: &str) -> Result<Option<PathBuf>> {
    let manifest = BundleManifest::load(root)?;
    let out_dir = root.join(&manifest.out_dir);
    let map_path = out_dir.join(paths::BUNDLE_MAP);
    if !map_path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(&map_path)?;
    let map: BTreeMap<String, String> = serde_json::from_str(&data)?;
    let Some(hashed) = map.get(logical) else {
        return Ok(None);
    };
    let path = out_dir.join(hashed);
    Ok(path.is_file().then_some(path))
}

fn hashed_name(logical: &str, content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let hash: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    match logical.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}.{hash}.{ext}"),
        None => format!("{logical}.{hash}"),
    }
}

fn remove_stale_outputs(out_dir: &Path, logical: &str, keep: &str) -> Result<()> {
    let pattern = match logical.rsplit_once('.') {
        Some((stem, ext)) => format!(
            "^{}\\.[0-9a-f]{{8}}\\.{}$",
            regex::escape(stem),
            regex::escape(ext)
        ),
        None => format!("^{}\\.[0-9a-f]{{8}}$", regex::escape(logical)),
    };
    let re = Regex::new(&pattern).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    for entry in std::fs::read_dir(out_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name != keep && re.is_match(name) {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_sources(root: &Path) {
        std::fs::create_dir_all(root.join("assets/js")).unwrap();
        std::fs::create_dir_all(root.join("assets/css")).unwrap();
        std::fs::write(root.join("assets/js/site.js"), "console.log('hi');\n").unwrap();
        std::fs::write(root.join("assets/css/site.css"), "body { margin: 0 }\n").unwrap();
    }

    #[test]
    fn bundles_write_hashed_outputs_and_map() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        let manifest = BundleManifest::default_manifest();
        let report = bundle(dir.path(), &manifest).unwrap();

        assert_eq!(report.outputs.len(), 2);
        let js = &report.outputs[0];
        assert_eq!(js.name, "app.js");
        assert!(js.file.starts_with("app."));
        assert!(js.file.ends_with(".js"));
        assert_eq!(js.file.len(), "app.".len() + 8 + ".js".len());
        assert!(dir.path().join(".scribe/dist").join(&js.file).is_file());

        let map: BTreeMap<String, String> = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(".scribe/dist/manifest.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(map["app.js"], js.file);
        assert!(map.contains_key("app.css"));
    }

    #[test]
    fn output_keeps_source_banner() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        let manifest = BundleManifest::default_manifest();
        let report = bundle(dir.path(), &manifest).unwrap();
        let out = std::fs::read_to_string(
            dir.path().join(".scribe/dist").join(&report.outputs[0].file),
        )
        .unwrap();
        assert!(out.contains("/* source: assets/js/site.js */"));
        assert!(out.contains("console.log"));
    }

    #[test]
    fn same_content_same_name() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        let manifest = BundleManifest::default_manifest();
        let first = bundle(dir.path(), &manifest).unwrap();
        let second = bundle(dir.path(), &manifest).unwrap();
        assert_eq!(first.outputs[0].file, second.outputs[0].file);
    }

    #[test]
    fn changed_content_replaces_stale_output() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        let manifest = BundleManifest::default_manifest();
        let first = bundle(dir.path(), &manifest).unwrap();

        std::fs::write(dir.path().join("assets/js/site.js"), "console.log('v2');\n").unwrap();
        let second = bundle(dir.path(), &manifest).unwrap();

        assert_ne!(first.outputs[0].file, second.outputs[0].file);
        let dist = dir.path().join(".scribe/dist");
        assert!(!dist.join(&first.outputs[0].file).exists());
        assert!(dist.join(&second.outputs[0].file).exists());
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let manifest = BundleManifest::default_manifest();
        assert!(matches!(
            bundle(dir.path(), &manifest),
            Err(ScribeError::MissingBundleSource(_))
        ));
    }

    #[test]
    fn empty_bundle_is_an_error() {
        let dir = TempDir::new().unwrap();
        let manifest = BundleManifest {
            version: 1,
            out_dir: default_out_dir(),
            bundles: vec![BundleSpec {
                name: "app.js".to_string(),
                kind: BundleKind::Script,
                sources: vec![],
            }],
        };
        assert!(matches!(
            bundle(dir.path(), &manifest),
            Err(ScribeError::EmptyBundle(_))
        ));
    }

    #[test]
    fn lookup_resolves_logical_name() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        let manifest = BundleManifest::default_manifest();
        let report = bundle(dir.path(), &manifest).unwrap();
        let resolved = lookup(dir.path(), "app.css").unwrap().unwrap();
        assert!(resolved.ends_with(&report.outputs[1].file));
        assert!(lookup(dir.path(), "vendor.js").unwrap().is_none());
    }

    #[test]
    fn lookup_without_build_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(lookup(dir.path(), "app.js").unwrap().is_none());
    }

    #[test]
    fn manifest_loads_default_when_missing() {
        let dir = TempDir::new().unwrap();
        let manifest = BundleManifest::load(dir.path()).unwrap();
        assert_eq!(manifest.bundles.len(), 2);
        assert_eq!(manifest.out_dir, ".scribe/dist");
    }

    #[test]
    fn manifest_roundtrip() {
        let dir = TempDir::new().unwrap();
        let manifest = BundleManifest::default_manifest();
        manifest.save(dir.path()).unwrap();
        let loaded = BundleManifest::load(dir.path()).unwrap();
        assert_eq!(loaded.bundles[0].name, "app.js");
        assert_eq!(loaded.bundles[0].kind, BundleKind::Script);
    }
}
