use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use http::HeaderValue;
use tower_http::cors::CorsLayer;

use crate::{request_tracing, ServerState};

use super::{categorize, completion, feedback, ingest, session, suggestions};

#[cfg(debug_assertions)]
mod dev {
    use axum::{extract::Query, http::StatusCode, response::IntoResponse, Json};
    use serde::{Deserialize, Serialize};

    use crate::auth::jwt::generate_dev_token;

    #[derive(Deserialize)]
    pub struct DevTokenParams {
        #[serde(default = "default_email")]
        pub email: String,
        #[serde(default = "default_name")]
        pub name: String,
    }

    fn default_email() -> String {
        "agent@example.com".to_string()
    }

    fn default_name() -> String {
        "Dev Agent".to_string()
    }

    #[derive(Serialize)]
    struct DevTokenResponse {
        token: String,
    }

    pub async fn dev_token(Query(params): Query<DevTokenParams>) -> impl IntoResponse {
        match generate_dev_token(&params.email, &params.name) {
            Ok(token) => (StatusCode::OK, Json(DevTokenResponse { token })).into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create token").into_response(),
        }
    }
}

pub struct AppRouter;

impl AppRouter {
    pub fn create(state: ServerState) -> Router {
        let origins = [
            "https://autocrm.io",
            "https://localhost:3000",
            "http://localhost:3000",
        ]
        .into_iter()
        .map(|origin| origin.parse::<HeaderValue>().unwrap())
        .collect::<Vec<_>>();

        let cors_layer = CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true);

        let api_routes = Router::new()
            .route("/email", post(ingest::handler_ingest_email))
            .route("/email-categorize", post(categorize::handler_categorize_email))
            .route("/email-feedback", post(feedback::handler_record_feedback))
            .route("/email-suggestions", get(suggestions::handler_list_suggestions))
            .route("/langchain", post(completion::handler_raw_prompt));

        let router = Router::new()
            .route("/", get(|| async { "AutoCRM server" }))
            .route("/auth/login", post(session::handler_login))
            .nest("/api", api_routes)
            .layer(cors_layer)
            .with_state(state.clone())
            .fallback(handler_404);

        #[cfg(debug_assertions)]
        let router = router.route("/dev/token", get(dev::dev_token));

        request_tracing::with_request_tracing(router)
    }
}

pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Route does not exist")
}
