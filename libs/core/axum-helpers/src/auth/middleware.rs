use super::{AuthError, TokenValidator};
use crate::errors::ErrorResponse;
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Extract the bearer credential from the Authorization header.
fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(|s| s.to_string()))
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Unauthorized", message)),
    )
        .into_response()
}

/// Bearer-token authentication middleware.
///
/// Validates the credential through the configured [`TokenValidator`] and
/// inserts the resulting [`super::Principal`] into request extensions on
/// success.
///
/// # Example
///
/// ```ignore
/// use axum::Router;
/// use axum::routing::get;
/// use axum_helpers::{TokenValidator, bearer_auth_middleware};
/// use std::sync::Arc;
///
/// let validator: Arc<dyn TokenValidator> = my_validator();
///
/// let protected_routes = Router::new()
///     .route("/users", get(list_users))
///     .layer(axum::middleware::from_fn_with_state(
///         validator.clone(),
///         bearer_auth_middleware,
///     ));
/// ```
pub async fn bearer_auth_middleware(
    State(validator): State<Arc<dyn TokenValidator>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = match extract_bearer(&headers) {
        Some(t) => t,
        None => {
            tracing::debug!("No bearer credential in Authorization header");
            return Err(unauthorized("No token provided"));
        }
    };

    match validator.validate(&token).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(AuthError::InvalidToken) => {
            tracing::debug!("Credential validation failed");
            Err(unauthorized("Invalid token"))
        }
        Err(AuthError::Unavailable(reason)) => {
            tracing::error!(%reason, "Auth backend unavailable");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Unavailable",
                    "Service temporarily unavailable",
                )),
            )
                .into_response())
        }
    }
}
