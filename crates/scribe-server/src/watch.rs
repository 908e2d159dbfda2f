use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecursiveMode, Watcher};
use scribe_core::config::Config;
use scribe_core::error::ScribeError;
use scribe_core::paths;
use scribe_core::reload::{self, ChangeKind, ReloadMessage};
use tokio::sync::broadcast;

/// Spawn the project file watcher. Quietly does nothing when live reload is
/// disabled in config; watcher errors stop the task but not the server.
pub fn spawn(root: PathBuf, tx: broadcast::Sender<ReloadMessage>) {
    tokio::spawn(async move {
        if let Err(e) = run(root, tx).await {
            tracing::warn!("file watcher stopped: {e:#}");
        }
    });
}

async fn run(root: PathBuf, tx: broadcast::Sender<ReloadMessage>) -> anyhow::Result<()> {
    // Pre-init projects get the defaults so the wizard dev loop still reloads.
    let config = match Config::load(&root) {
        Ok(c) => c,
        Err(ScribeError::NotInitialized) => Config::new("scribe"),
        Err(e) => return Err(e.into()),
    };
    if !config.reload.enabled {
        tracing::debug!("live reload disabled in config");
        return Ok(());
    }
    let debounce = Duration::from_millis(config.debounce_ms());

    let (fs_tx, mut fs_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut watcher =
        notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    let _ = fs_tx.send(event);
                }
            }
            Err(e) => tracing::debug!("watch error: {e}"),
        })?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    tracing::debug!(root = %root.display(), "watching project tree");

    // Trailing-edge debounce: flush once the tree has been quiet for the
    // configured window, coalescing everything seen in between.
    let mut pending: Vec<ChangeKind> = Vec::new();
    loop {
        tokio::select! {
            maybe = fs_rx.recv() => {
                let Some(event) = maybe else { break };
                for path in &event.paths {
                    let Ok(rel) = path.strip_prefix(&root) else { continue };
                    if is_relevant(rel, &config) {
                        pending.push(reload::classify_path(rel));
                    }
                }
            }
            _ = tokio::time::sleep(debounce), if !pending.is_empty() => {
                if let Some(kind) = reload::coalesce(&pending) {
                    tracing::debug!(change = kind.as_str(), "broadcasting reload");
                    let _ = tx.send(ReloadMessage::reload(kind));
                }
                pending.clear();
            }
        }
    }
    Ok(())
}

/// Decide whether a change under the project root should trigger a reload.
/// Backup files, bundler output, hidden entries, and build trees are noise.
fn is_relevant(rel: &Path, config: &Config) -> bool {
    let parts: Vec<&str> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    let Some(file_name) = parts.last() else {
        return false;
    };
    if file_name.ends_with(paths::BACKUP_SUFFIX) {
        return false;
    }
    if parts[0] == paths::SCRIBE_DIR {
        // Config files re-trigger; dist output would feed back the bundler.
        return parts.len() == 2
            && matches!(parts[1], "config.yaml" | "skills.json" | "bundle.yaml");
    }
    if parts.iter().any(|p| p.starts_with('.')) {
        return false;
    }
    if parts[0] == "target" {
        return false;
    }
    rel.starts_with(&config.docs.dir) || rel.starts_with(paths::ASSETS_DIR)
}
