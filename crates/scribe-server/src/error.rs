use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scribe_core::error::ScribeError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 404 Not Found errors
// ---------------------------------------------------------------------------

/// Private sentinel error type used to carry an explicit HTTP 404 through
/// the `anyhow::Error` chain without touching the `ScribeError` enum.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct NotFoundError(String);

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for JSON HTTP responses. Form submits render their
/// validation failures as HTML fragments in the handlers instead; this type
/// covers everything else.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(ScribeError::InvalidStep(msg.into()).into())
    }

    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(n) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<ScribeError>() {
            match e {
                ScribeError::NotInitialized => StatusCode::BAD_REQUEST,
                ScribeError::InvalidSlug(_)
                | ScribeError::InvalidPass(_)
                | ScribeError::InvalidFlavor(_)
                | ScribeError::InvalidStep(_)
                | ScribeError::InvalidChangeKind(_)
                | ScribeError::UnsupportedStateVersion(_) => StatusCode::BAD_REQUEST,
                ScribeError::DuplicateSkill(_) => StatusCode::CONFLICT,
                ScribeError::InvalidSkillRule { .. }
                | ScribeError::InvalidSkillPattern { .. }
                | ScribeError::InvalidTermPattern { .. }
                | ScribeError::IncompleteWizard(_)
                | ScribeError::MissingBundleSource(_)
                | ScribeError::EmptyBundle(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ScribeError::Io(_) | ScribeError::Yaml(_) | ScribeError::Json(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use scribe_core::error::ScribeError;

    #[test]
    fn not_initialized_maps_to_400() {
        let err = AppError(ScribeError::NotInitialized.into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_slug_maps_to_400() {
        let err = AppError(ScribeError::InvalidSlug("BAD SLUG".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_step_maps_to_400() {
        let err = AppError(ScribeError::InvalidStep("nope".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unsupported_state_version_maps_to_400() {
        let err = AppError(ScribeError::UnsupportedStateVersion(9).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn duplicate_skill_maps_to_409() {
        let err = AppError(ScribeError::DuplicateSkill("markdown-style".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn incomplete_wizard_maps_to_422() {
        let err = AppError(ScribeError::IncompleteWizard("name: required".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn invalid_skill_pattern_maps_to_422() {
        let err = AppError(
            ScribeError::InvalidSkillPattern {
                skill: "markdown-style".into(),
                pattern: "(unclosed".into(),
                reason: "missing )".into(),
            }
            .into(),
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn missing_bundle_source_maps_to_422() {
        let err = AppError(ScribeError::MissingBundleSource("assets/js/site.js".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn io_error_maps_to_500() {
        let io_err = std::io::Error::other("disk full");
        let err = AppError(ScribeError::Io(io_err).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_scribe_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_constructor_maps_to_404() {
        let err = AppError::not_found("no such asset");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_request_constructor_maps_to_400() {
        let err = AppError::bad_request("unknown wizard step 'setup'");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn response_body_contains_error_field() {
        let err = AppError(ScribeError::NotInitialized.into());
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(
            ct.to_str().unwrap().contains("application/json"),
            "expected JSON content type, got {:?}",
            ct
        );
    }
}
