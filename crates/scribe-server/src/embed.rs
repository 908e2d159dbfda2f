use std::path::{Component, Path};

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;
use scribe_core::bundle;

use crate::state::AppState;

#[derive(Embed)]
#[folder = "assets/"]
struct StaticAssets;

/// Serve `/assets/{*path}`. Bundled outputs under `.scribe/dist` win over the
/// embedded copies so a project sees its own hashed bundles once `quill
/// bundle` has run; logical names (`app.js`) resolve through the bundle map.
pub async fn asset_handler(
    State(app): State<AppState>,
    axum::extract::Path(path): axum::extract::Path<String>,
) -> Response {
    let path = path.trim_start_matches('/').to_string();
    if !is_safe(&path) {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }

    // Exact file in the dist directory (hashed bundle outputs, manifest.json).
    let dist_file = app.root.join(scribe_core::paths::DIST_DIR).join(&path);
    if let Ok(data) = tokio::fs::read(&dist_file).await {
        return ok_with_mime(&path, data);
    }

    // Logical bundle name resolved through the bundle map.
    let root = app.root.clone();
    let logical = path.clone();
    let resolved = tokio::task::spawn_blocking(move || bundle::lookup(&root, &logical))
        .await
        .ok()
        .and_then(|r| r.ok())
        .flatten();
    if let Some(file) = resolved {
        if let Ok(data) = tokio::fs::read(&file).await {
            return ok_with_mime(&path, data);
        }
    }

    // Embedded fallback: the stock wizard/livereload assets.
    match <StaticAssets as Embed>::get(&path) {
        Some(content) => ok_with_mime(&path, content.data.to_vec()),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

fn ok_with_mime(path: &str, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime.as_ref())],
        data,
    )
        .into_response()
}

/// Reject traversal segments before joining onto the project root.
fn is_safe(path: &str) -> bool {
    let p = Path::new(path);
    !p.is_absolute()
        && p.components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
