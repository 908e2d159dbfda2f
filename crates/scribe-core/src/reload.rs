use crate::error::{Result, ScribeError};
use crate::paths;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ChangeKind
// ---------------------------------------------------------------------------

/// What kind of file changed, as seen by the reload client. Drives whether
/// the browser does a full reload or a stylesheet hot-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Markdown,
    Style,
    Script,
    Config,
    Asset,
}

impl ChangeKind {
    pub fn all() -> &'static [ChangeKind] {
        &[
            ChangeKind::Markdown,
            ChangeKind::Style,
            ChangeKind::Script,
            ChangeKind::Config,
            ChangeKind::Asset,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Markdown => "markdown",
            ChangeKind::Style => "style",
            ChangeKind::Script => "script",
            ChangeKind::Config => "config",
            ChangeKind::Asset => "asset",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "markdown" => Ok(ChangeKind::Markdown),
            "style" => Ok(ChangeKind::Style),
            "script" => Ok(ChangeKind::Script),
            "config" => Ok(ChangeKind::Config),
            "asset" => Ok(ChangeKind::Asset),
            other => Err(ScribeError::InvalidChangeKind(other.to_string())),
        }
    }
}

/// Classify a changed path by extension. Project metadata under `.scribe/`
/// is `Config`; the same extensions elsewhere are plain assets.
pub fn classify_path(path: &Path) -> ChangeKind {
    let under_scribe = path
        .components()
        .any(|c| c.as_os_str() == paths::SCRIBE_DIR);
    match path.extension().and_then(|e| e.to_str()) {
        Some("md") | Some("markdown") => ChangeKind::Markdown,
        Some("css") => ChangeKind::Style,
        Some("js") | Some("mjs") => ChangeKind::Script,
        Some("yaml") | Some("yml") | Some("json") if under_scribe => ChangeKind::Config,
        _ => ChangeKind::Asset,
    }
}

/// Collapse a burst of changes into the single kind the client acts on.
///
/// A burst that is purely stylesheets stays `Style` so the client can
/// hot-swap without losing page state. Any mixed burst falls back to the
/// most disruptive kind present.
pub fn coalesce(kinds: &[ChangeKind]) -> Option<ChangeKind> {
    if kinds.is_empty() {
        return None;
    }
    if kinds.iter().all(|k| *k == ChangeKind::Style) {
        return Some(ChangeKind::Style);
    }
    for kind in [
        ChangeKind::Config,
        ChangeKind::Markdown,
        ChangeKind::Script,
        ChangeKind::Asset,
    ] {
        if kinds.contains(&kind) {
            return Some(kind);
        }
    }
    Some(ChangeKind::Style)
}

// ---------------------------------------------------------------------------
// Wire message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Reload,
    Ping,
    Pong,
}

/// JSON frame exchanged over the reload socket. Clients send `ping` as a
/// keepalive and get `pong` back; the server pushes `reload` frames with
/// the coalesced change kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReloadMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(
        rename = "changeType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub change_type: Option<ChangeKind>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: i64,
}

impl ReloadMessage {
    pub fn reload(change: ChangeKind) -> Self {
        Self {
            message_type: MessageType::Reload,
            change_type: Some(change),
            timestamp: now_ms(),
        }
    }

    pub fn pong() -> Self {
        Self {
            message_type: MessageType::Pong,
            change_type: None,
            timestamp: now_ms(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
