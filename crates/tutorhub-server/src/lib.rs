#![forbid(unsafe_code)]

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use tutorhub_store::Store;

mod auth;
mod config;
mod genai;
mod http;
mod policy;
mod telemetry;

pub use config::{ApiConfig, RateLimitConfig, CONFIG_SCHEMA_VERSION};

use telemetry::{RateLimiter, RequestMetrics};

pub const CRATE_NAME: &str = "tutorhub-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub api: Arc<ApiConfig>,
    pub ready: Arc<AtomicBool>,
    pub accepting_requests: Arc<AtomicBool>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
    pub(crate) ip_limiter: Arc<RateLimiter>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self::with_config(store, ApiConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Store, api: ApiConfig) -> Self {
        Self {
            store,
            api: Arc::new(api),
            ready: Arc::new(AtomicBool::new(true)),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            ip_limiter: Arc::new(RateLimiter::default()),
        }
    }
}

/// Ingress gate for the /v1 API: refuses new work while the server drains
/// on shutdown, then applies the per-IP token bucket keyed by
/// `x-forwarded-for` when present. The bucket is disabled by default; the
/// ops endpoints are registered outside this layer and stay exempt.
pub(crate) async fn ingress_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state
        .accepting_requests
        .load(std::sync::atomic::Ordering::Relaxed)
    {
        return http::support::api_error_response(&tutorhub_api::ApiError::not_ready());
    }
    if state.api.rate_limit_enabled {
        let key = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("local")
            .to_string();
        if !state
            .ip_limiter
            .allow(&key, &state.api.rate_limit_per_ip)
            .await
        {
            return http::support::api_error_response(&tutorhub_api::ApiError::rate_limited());
        }
    }
    next.run(request).await
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/v1/sessions",
            get(http::sessions::list_sessions_handler).post(http::sessions::create_session_handler),
        )
        .route(
            "/v1/sessions/:id",
            get(http::sessions::get_session_handler)
                .patch(http::sessions::update_session_handler)
                .delete(http::sessions::delete_session_handler),
        )
        .route("/v1/tutors", get(http::tutors::list_tutors_handler))
        .route(
            "/v1/tutors/availability",
            get(http::tutors::availability_handler).post(http::tutors::create_availability_handler),
        )
        .route(
            "/v1/tutors/availability/exceptions",
            post(http::tutors::create_exception_handler),
        )
        .route(
            "/v1/tutors/availability/:id",
            delete(http::tutors::delete_availability_handler),
        )
        .route(
            "/v1/tutors/:id",
            get(http::tutors::get_tutor_handler).patch(http::tutors::update_tutor_handler),
        )
        .route("/v1/tutors/:id/slots", get(http::tutors::slots_handler))
        .route("/v1/students", get(http::students::list_students_handler))
        .route(
            "/v1/children",
            get(http::students::list_children_handler)
                .post(http::students::create_child_link_handler),
        )
        .route(
            "/v1/subjects",
            get(http::subjects::list_subjects_handler).post(http::subjects::create_subject_handler),
        )
        .route(
            "/v1/subjects/:id",
            get(http::subjects::get_subject_handler)
                .patch(http::subjects::update_subject_handler)
                .delete(http::subjects::delete_subject_handler),
        )
        .route(
            "/v1/progress",
            get(http::progress::get_progress_handler).post(http::progress::create_progress_handler),
        )
        .route("/v1/ai/quiz", post(http::ai::generate_quiz_handler))
        .route(
            "/v1/ai/teaching-plan",
            post(http::ai::generate_teaching_plan_handler),
        )
        .route(
            "/v1/ai/recommendations",
            post(http::ai::generate_recommendations_handler),
        )
        .route("/v1/quizzes/:id/attempts", post(http::ai::quiz_attempt_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            ingress_middleware,
        ));

    Router::new()
        .route("/healthz", get(http::ops::healthz_handler))
        .route("/readyz", get(http::ops::readyz_handler))
        .route("/metrics", get(http::ops::metrics_handler))
        .route("/v1/version", get(http::ops::version_handler))
        .route("/v1/openapi.json", get(http::ops::openapi_handler))
        .merge(api)
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
