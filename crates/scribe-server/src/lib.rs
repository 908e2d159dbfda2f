pub mod embed;
pub mod error;
pub mod render;
pub mod routes;
pub mod session;
pub mod state;
pub mod watch;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};

/// Build the axum Router with all wizard, skill, and reload routes.
/// Used by `serve()` and available for integration testing.
pub fn build_router(root: PathBuf) -> Router {
    let app_state = state::AppState::new(root);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Wizard pages and fragments
        .route("/", get(routes::wizard::root_redirect))
        .route("/wizard", get(routes::wizard::wizard_page))
        .route("/wizard/step/{step}", get(routes::wizard::step_fragment))
        .route("/wizard/step/{step}", post(routes::wizard::submit_step))
        .route("/wizard/fields", post(routes::wizard::sync_fields))
        .route("/wizard/state", get(routes::wizard::session_state))
        .route("/wizard/restore", post(routes::wizard::restore_state))
        .route("/wizard/generate", post(routes::wizard::generate))
        .route("/wizard/skills/suggest", get(routes::skills::suggest))
        // Skill rules API
        .route("/api/skills", get(routes::skills::get_rules))
        .route("/api/skills/match", get(routes::skills::match_prompt))
        // Live reload
        .route("/ws/reload", get(routes::reload::ws_reload))
        // Static assets (bundled output first, embedded fallback)
        .route("/assets/{*path}", get(embed::asset_handler))
        .layer(cors)
        .with_state(app_state)
}

/// Start the setup wizard server.
pub async fn serve(root: PathBuf, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let app = build_router(root);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("scribe wizard listening on http://localhost:{port}");

    if open_browser {
        let url = format!("http://localhost:{port}/wizard");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}

/// Start the setup wizard server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(root);

    tracing::info!("scribe wizard listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/wizard");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
