// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    handler::{
        admin::admin_handler,
        campaigns::campaign_handler,
        deliverables::{content_handler, deliverable_handler},
        feedback::feedback_handler,
        subscriptions::subscription_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check(Extension(app_state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running",
        "cache": app_state.db_client.cache_status()
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/content", content_handler().layer(middleware::from_fn(auth)))
        .nest("/deliverables", deliverable_handler().layer(middleware::from_fn(auth)))
        .nest("/campaigns", campaign_handler().layer(middleware::from_fn(auth)))
        .nest("/subscriptions", subscription_handler().layer(middleware::from_fn(auth)))
        .nest("/feedback", feedback_handler().layer(middleware::from_fn(auth)))
        .nest("/admin", admin_handler().layer(middleware::from_fn(auth)))
        .layer(TraceLayer::new_for_http());

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route);

    // Locally stored media is served by this process when its public URL is a path.
    if app_state.env.public_media_url.starts_with('/') {
        router = router.nest_service(
            &app_state.env.public_media_url,
            ServeDir::new(&app_state.env.upload_dir),
        );
    }

    router.layer(Extension(app_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::{
        config::Config, db::db::DBClient, service::media_store::LocalMediaStore,
        utils::token::create_token,
    };

    fn test_state() -> Arc<AppState> {
        let env = Config {
            database_url: "postgres://localhost/collabsync".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_maxage: 60,
            port: 8000,
            redis_url: None,
            upload_dir: "uploads".to_string(),
            public_media_url: "/media".to_string(),
            app_env: "test".to_string(),
            log_dir: "logs".to_string(),
            allowed_origins: vec![],
        };
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy(&env.database_url)
            .unwrap();

        Arc::new(AppState {
            media_store: Arc::new(LocalMediaStore::new(&env.upload_dir, &env.public_media_url)),
            db_client: Arc::new(DBClient::new(pool)),
            env,
        })
    }

    #[tokio::test]
    async fn health_check_reports_cache_status() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["cache"], "disabled");
    }

    #[tokio::test]
    async fn api_requires_a_token() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/deliverables/mine")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/deliverables/review")
                    .header("Authorization", "Bearer not-a-jwt")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn tokens_for_unknown_users_are_rejected() {
        let state = test_state();
        let token = create_token(
            &uuid::Uuid::new_v4().to_string(),
            state.env.jwt_secret.as_bytes(),
            state.env.jwt_maxage,
        )
        .unwrap();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/subscriptions/status")
                    .header("Cookie", format!("token={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
