use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use axum_helpers::{
    bearer_auth_middleware, create_cors_layer, create_permissive_cors_layer,
    errors::handlers::{method_not_allowed, not_found},
    health_router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod auth;
pub mod users;

/// Creates the API routes without the `/api/v1` prefix.
///
/// Public routes bypass authentication; the rest carry the bearer
/// middleware per route, so `/users` can stay public for POST and
/// authenticated for GET.
pub fn routes(state: AppState) -> Router {
    let auth_layer =
        middleware::from_fn_with_state(state.validator.clone(), bearer_auth_middleware);

    Router::new()
        // Public
        .route("/auth", post(auth::login))
        .route(
            "/users",
            post(users::create_user)
                .merge(get(users::list_users).route_layer(auth_layer.clone())),
        )
        // Authenticated
        .route(
            "/auth/logout",
            post(auth::logout).route_layer(auth_layer.clone()),
        )
        .route(
            "/auth/token",
            post(auth::validate_token).route_layer(auth_layer),
        )
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
}

/// Assembles the full gateway router: health, WebSocket upgrade, API
/// routes, cross-cutting middleware, and the 404/405 fallbacks.
///
/// With `CORS_ALLOWED_ORIGIN` set the CORS layer is locked to that
/// origin; otherwise the permissive development layer applies.
pub fn app(state: AppState) -> Router {
    let cors = match state.config.cors_origin.clone() {
        Some(origin) => create_cors_layer(origin),
        None => create_permissive_cors_layer(),
    };

    Router::new()
        .merge(health_router(state.config.app))
        .route("/ws", get(crate::ws::ws_handler).with_state(state.clone()))
        .nest("/api/v1", routes(state))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{EchoSession, StubAuthService, StubUserService};
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        state_with_cors(None)
    }

    fn state_with_cors(cors_origin: Option<axum::http::HeaderValue>) -> AppState {
        let auth = Arc::new(StubAuthService::new());
        AppState {
            config: Arc::new(Config {
                app: core_config::app_info!(),
                server: core_config::server::ServerConfig::default(),
                environment: core_config::Environment::Development,
                shutdown_policy: core_lifecycle::ShutdownPolicy::BestEffort,
                cors_origin,
            }),
            auth: auth.clone(),
            validator: auth,
            users: Arc::new(StubUserService::new()),
            ws: Arc::new(EchoSession),
        }
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let router = app(test_state());
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let router = app(test_state());
        let response = router
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_405_with_error_body() {
        let router = app(test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/auth")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let json = body_json(response).await;
        assert_eq!(json["error"], "MethodNotAllowed");
    }

    #[tokio::test]
    async fn test_configured_cors_origin_is_applied() {
        let origin = axum::http::HeaderValue::from_static("https://app.example.com");
        let router = app(state_with_cors(Some(origin.clone())));

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "https://app.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin"),
            Some(&origin)
        );
    }

    #[tokio::test]
    async fn test_create_user_is_public() {
        let router = app(test_state());
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/users",
                r#"{"username":"bob","email":"bob@example.com"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        assert_eq!(json["username"], "bob");
    }

    #[tokio::test]
    async fn test_list_users_requires_bearer() {
        let router = app(test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_then_authenticated_access() {
        let router = app(test_state());

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth",
                r#"{"username":"alice","password":"pw"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["token"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/users")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/token")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["subject"], "alice");
        assert_eq!(json["valid"], true);
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let router = app(test_state());

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth",
                r#"{"username":"carol","password":"pw"}"#,
            ))
            .await
            .unwrap();
        let token = body_json(response).await["token"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/logout")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // The token no longer works.
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/users")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
