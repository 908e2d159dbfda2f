use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use scribe_core::wizard::{WizardState, WizardStep};
use uuid::Uuid;

use crate::error::AppError;
use crate::render;
use crate::session::{ensure_session, set_cookie_value};
use crate::state::AppState;

/// GET / — straight to the wizard.
pub async fn root_redirect() -> Redirect {
    Redirect::to("/wizard")
}

/// GET /wizard — full page at the session's current step.
pub async fn wizard_page(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let (id, state, created) = ensure_session(&app.sessions, &headers).await;
    let resp = Html(render::page(&state)).into_response();
    with_cookie(resp, id, created)
}

/// GET /wizard/step/{step} — step fragment; records the step on the session
/// so a later full-page load resumes where the user left off.
pub async fn step_fragment(
    State(app): State<AppState>,
    headers: HeaderMap,
    axum::extract::Path(step): axum::extract::Path<String>,
) -> Result<Response, AppError> {
    let step: WizardStep = step.parse()?;
    let (id, _, created) = ensure_session(&app.sessions, &headers).await;
    let (state, _) = app
        .sessions
        .with_state(id, |s| s.set_step(step))
        .await
        .ok_or_else(|| AppError::bad_request("session expired"))?;
    let resp = Html(render::step_fragment(&state, &[])).into_response();
    Ok(with_cookie(resp, id, created))
}

/// POST /wizard/step/{step} — merge the submitted fields and validate. A
/// clean submit advances to the next step; a rejected one re-renders the
/// same step as a 422 with inline errors.
pub async fn submit_step(
    State(app): State<AppState>,
    headers: HeaderMap,
    axum::extract::Path(step): axum::extract::Path<String>,
    Form(fields): Form<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    let step: WizardStep = step.parse()?;
    let (id, _, created) = ensure_session(&app.sessions, &headers).await;
    let (state, errors) = app
        .sessions
        .with_state(id, |s| {
            s.set_step(step);
            s.apply_fields(fields);
            let errors = s.validate_step(step);
            if errors.is_empty() {
                if let Some(next) = step.next() {
                    s.set_step(next);
                }
            }
            errors
        })
        .await
        .ok_or_else(|| AppError::bad_request("session expired"))?;

    let resp = if errors.is_empty() {
        Html(render::step_fragment(&state, &[])).into_response()
    } else {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(render::step_fragment(&state, &errors)),
        )
            .into_response()
    };
    Ok(with_cookie(resp, id, created))
}

#[derive(serde::Deserialize)]
pub struct FieldsBody {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// POST /wizard/fields — debounced background sync from the browser.
pub async fn sync_fields(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<FieldsBody>,
) -> Result<Response, AppError> {
    let (id, _, created) = ensure_session(&app.sessions, &headers).await;
    app.sessions
        .with_state(id, |s| s.apply_fields(body.fields))
        .await
        .ok_or_else(|| AppError::bad_request("session expired"))?;
    Ok(with_cookie(StatusCode::NO_CONTENT.into_response(), id, created))
}

/// GET /wizard/state — session state JSON, mirrored into sessionStorage by
/// the browser.
pub async fn session_state(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let (id, state, created) = ensure_session(&app.sessions, &headers).await;
    with_cookie(Json(state).into_response(), id, created)
}

/// POST /wizard/restore — adopt a state blob the browser held onto across a
/// server restart. Older versions are migrated; newer ones are rejected.
pub async fn restore_state(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(incoming): Json<WizardState>,
) -> Result<Response, AppError> {
    let migrated = incoming.migrate()?;
    let (id, _, created) = ensure_session(&app.sessions, &headers).await;
    app.sessions.put(id, migrated.clone()).await;
    Ok(with_cookie(Json(migrated).into_response(), id, created))
}

/// POST /wizard/generate — materialize the project. Incomplete answers get
/// a 422 review fragment; success gets the summary fragment.
pub async fn generate(
    State(app): State<AppState>,
    headers: HeaderMap,
    Form(fields): Form<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    let force = fields.get("force").map(|v| v == "true").unwrap_or(false);
    let (id, state, created) = ensure_session(&app.sessions, &headers).await;

    let errors = state.validate_all();
    if !errors.is_empty() {
        let (review, _) = app
            .sessions
            .with_state(id, |s| s.set_step(WizardStep::Review))
            .await
            .ok_or_else(|| AppError::bad_request("session expired"))?;
        let resp = (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(render::step_fragment(&review, &errors)),
        )
            .into_response();
        return Ok(with_cookie(resp, id, created));
    }

    let root = app.root.clone();
    let snapshot = state.clone();
    let report = tokio::task::spawn_blocking(move || snapshot.generate(&root, force))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    tracing::info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        "wizard generated project files"
    );
    let resp = Html(render::summary_fragment(&report)).into_response();
    Ok(with_cookie(resp, id, created))
}

/// Attach the session cookie to responses that created a session.
fn with_cookie(mut resp: Response, id: Uuid, created: bool) -> Response {
    if created {
        if let Ok(value) = header::HeaderValue::from_str(&set_cookie_value(id)) {
            resp.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn app() -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let app = AppState::new(dir.path().to_path_buf());
        (dir, app)
    }

    #[tokio::test]
    async fn wizard_page_sets_session_cookie() {
        let (_dir, app) = app();
        let resp = wizard_page(State(app), HeaderMap::new()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .expect("new session sets a cookie");
        assert!(cookie.to_str().unwrap().starts_with("scribe_wizard="));
    }

    #[tokio::test]
    async fn unknown_step_is_rejected() {
        let (_dir, app) = app();
        let result = step_fragment(
            State(app),
            HeaderMap::new(),
            axum::extract::Path("setup".to_string()),
        )
        .await;
        let resp = result.err().expect("invalid step should error").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_submit_returns_422() {
        let (_dir, app) = app();
        let mut fields = BTreeMap::new();
        fields.insert("project_name".to_string(), "Bad Name!".to_string());
        let resp = submit_step(
            State(app),
            HeaderMap::new(),
            axum::extract::Path("project".to_string()),
            Form(fields),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn valid_submit_advances_to_next_step() {
        let (_dir, app) = app();
        let mut fields = BTreeMap::new();
        fields.insert("project_name".to_string(), "my-site".to_string());
        fields.insert("project_title".to_string(), "My Site".to_string());
        let resp = submit_step(
            State(app),
            HeaderMap::new(),
            axum::extract::Path("project".to_string()),
            Form(fields),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(r#"data-step="content""#));
    }

    #[tokio::test]
    async fn restore_rejects_newer_state_versions() {
        let (_dir, app) = app();
        let mut incoming = WizardState::new();
        incoming.version = 99;
        let result = restore_state(State(app), HeaderMap::new(), Json(incoming)).await;
        let resp = result.err().expect("newer version should error").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_with_empty_state_returns_422_review() {
        let (_dir, app) = app();
        let resp = generate(State(app), HeaderMap::new(), Form(BTreeMap::new()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(r#"data-step="review""#));
        assert!(html.contains("project name is required"));
    }

    #[tokio::test]
    async fn generate_writes_project_files() {
        let (dir, app) = app();
        let sessions = app.sessions.clone();
        let (id, _) = sessions.create().await;
        sessions
            .with_state(id, |s| {
                s.apply_fields([
                    ("project_name".to_string(), "my-site".to_string()),
                    ("project_title".to_string(), "My Site".to_string()),
                    ("docs_dir".to_string(), "docs".to_string()),
                    ("content_types".to_string(), "page".to_string()),
                ]);
            })
            .await
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            header::HeaderValue::from_str(&format!("scribe_wizard={id}")).unwrap(),
        );

        let resp = generate(State(app), headers, Form(BTreeMap::new())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(dir.path().join(".scribe/config.yaml").exists());
        assert!(dir.path().join("docs/page/index.md").exists());
    }
}
