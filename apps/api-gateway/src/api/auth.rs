use crate::collaborators::{Credentials, Session};
use crate::state::AppState;
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::{AuthError, ErrorResponse, Principal};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct PrincipalResponse {
    pub subject: String,
    pub valid: bool,
}

fn auth_error_response(err: AuthError) -> Response {
    match err {
        AuthError::InvalidToken => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Unauthorized", "Invalid credentials")),
        )
            .into_response(),
        AuthError::Unavailable(reason) => {
            tracing::error!(%reason, "Auth collaborator unavailable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Unavailable",
                    "Service temporarily unavailable",
                )),
            )
                .into_response()
        }
    }
}

/// `POST /api/v1/auth` — log in, returns a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Session>, Response> {
    state
        .auth
        .login(credentials)
        .await
        .map(Json)
        .map_err(auth_error_response)
}

/// `POST /api/v1/auth/logout` — revoke the caller's sessions.
pub async fn logout(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<SuccessResponse>, Response> {
    state
        .auth
        .logout(&principal)
        .await
        .map(|_| {
            Json(SuccessResponse {
                message: "Logged out".to_string(),
            })
        })
        .map_err(auth_error_response)
}

/// `POST /api/v1/auth/token` — report the validated principal.
///
/// The bearer middleware has already validated the credential by the
/// time this handler runs.
pub async fn validate_token(Extension(principal): Extension<Principal>) -> Json<PrincipalResponse> {
    Json(PrincipalResponse {
        subject: principal.subject,
        valid: true,
    })
}
