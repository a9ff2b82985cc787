//! Router assembly: HTTP endpoints under `/api`, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - taxonomy browse and question read endpoints under `/api/...`
/// - `POST /api/generate-question`
/// - CORS (configured origins, any method/headers; empty list means any origin)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api", get(http::http_root))
        .route("/api/", get(http::http_root))
        .route("/api/health", get(http::http_health))
        .route("/api/exams", get(http::http_get_exams))
        .route("/api/courses/:exam_id", get(http::http_get_courses))
        .route("/api/subjects/:course_id", get(http::http_get_subjects))
        .route("/api/units/:subject_id", get(http::http_get_units))
        .route("/api/chapters/:unit_id", get(http::http_get_chapters))
        .route("/api/topics/:chapter_id", get(http::http_get_topics))
        .route("/api/parts/:course_id", get(http::http_get_parts))
        .route("/api/slots/:course_id", get(http::http_get_slots))
        .route("/api/existing-questions/:topic_id", get(http::http_get_existing_questions))
        .route("/api/generated-questions/:topic_id", get(http::http_get_generated_questions))
        .route("/api/generate-question", post(http::http_post_generate_question))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(target: "question_maker", origin = %o, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
