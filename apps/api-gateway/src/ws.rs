use crate::state::AppState;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};

/// `GET /ws` — upgrade to a bidirectional connection.
///
/// The session protocol is delegated entirely to the configured
/// [`crate::collaborators::WsSessionHandler`].
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let handler = state.ws.clone();
    ws.on_upgrade(move |socket| async move { handler.handle(socket).await })
}
