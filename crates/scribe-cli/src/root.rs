use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `SCRIBE_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from the working directory looking for `.scribe/`
/// 3. Walk upward looking for `.git/`
/// 4. Fall back to the working directory
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_up(&cwd, ".scribe")
        .or_else(|| find_up(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_up(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join(marker).is_dir() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}
