mod astrocartography;
mod readings;

use std::time::Duration;

use astromap_matcher::PowerSpotMatcher;
use astromap_store::ResultStore;
use astromap_tz::TimeNormalizer;
use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Debug, Clone)]
pub struct AppState {
    pub matcher: PowerSpotMatcher,
    pub normalizer: TimeNormalizer,
    pub store: ResultStore,
    /// Upper bound on one matching pass.
    pub request_timeout: Duration,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    cities: usize,
    catalog_source: &'static str,
}

#[derive(Debug, Serialize)]
struct Welcome {
    message: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub(super) fn validation(request_id: &str, message: impl Into<String>) -> Self {
        Self::new(request_id, "validation_error", message)
    }

    pub(super) fn internal(request_id: &str, message: impl Into<String>) -> Self {
        Self::new(request_id, "internal_error", message)
    }

    fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" | "timezone_unresolved" | "invalid_local_time" => {
                StatusCode::BAD_REQUEST
            }
            "timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/v1/health", get(health))
        .route(
            "/astrocartography",
            get(astrocartography::astrocartography_get)
                .post(astrocartography::astrocartography_post),
        )
        .route("/api/v1/readings", post(readings::create_reading))
        .route("/api/v1/readings/{id}", get(readings::get_reading))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn root() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to the Astrocartography API. POST birth data to /astrocartography.",
    })
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let catalog = state.matcher.catalog();
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            cities: catalog.len(),
            catalog_source: catalog.source().label(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
