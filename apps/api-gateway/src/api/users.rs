use crate::collaborators::{NewUser, User};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};

/// `POST /api/v1/users` — register a user (public).
pub async fn create_user(
    State(state): State<AppState>,
    Json(user): Json<NewUser>,
) -> (StatusCode, Json<User>) {
    let created = state.users.create(user).await;
    (StatusCode::CREATED, Json(created))
}

/// `GET /api/v1/users` — list users (requires a bearer credential).
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.users.list().await)
}
