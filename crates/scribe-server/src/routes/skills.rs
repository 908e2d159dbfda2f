use std::path::Path;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use scribe_core::error::ScribeError;
use scribe_core::skills::{self, SkillSet};

use crate::error::AppError;
use crate::render;
use crate::state::AppState;

/// Project rule file when present, built-in defaults otherwise. The wizard
/// runs before `.scribe/` exists, so suggestions must work pre-init.
fn load_or_default(root: &Path) -> scribe_core::Result<SkillSet> {
    match SkillSet::load(root) {
        Ok(set) => Ok(set),
        Err(ScribeError::NotInitialized) => Ok(skills::default_set()),
        Err(e) => Err(e),
    }
}

/// GET /api/skills — the active skill rule file as JSON.
pub async fn get_rules(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let set = load_or_default(&root)?;
        let json = serde_json::to_value(&set)?;
        Ok::<_, ScribeError>(json)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct MatchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/skills/match?q= — ranked activation matches as JSON.
pub async fn match_prompt(
    State(app): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let set = load_or_default(&root)?;
        let matcher = set.matcher()?;
        let matches = matcher.match_prompt(&query.q);
        let json = serde_json::to_value(&matches)?;
        Ok::<_, ScribeError>(json)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /wizard/skills/suggest?q= — the same ranking as an HTML fragment for
/// the wizard's live suggestion box.
pub async fn suggest(
    State(app): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Result<Html<String>, AppError> {
    let root = app.root.clone();
    let matches = tokio::task::spawn_blocking(move || {
        let set = load_or_default(&root)?;
        let matcher = set.matcher()?;
        Ok::<_, ScribeError>(matcher.match_prompt(&query.q))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Html(render::suggest_fragment(&matches)))
}
