use astromap_core::ResultSet;
use astromap_store::{NewReading, StoreError, StoredReading};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::RequestId;

use super::astrocartography::{compute, AstroRequest};
use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct CreatedReading {
    pub id: String,
    pub results: ResultSet,
}

/// POST /api/v1/readings: compute and persist.
pub(super) async fn create_reading(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AstroRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedReading>>), ApiError> {
    let rid = &req_id.0;
    let computation = compute(&state, rid, body).await?;

    let stored = state
        .store
        .save(NewReading {
            birth_date: computation.birth_date,
            time: computation.time,
            orb_tolerance: computation.tolerance,
            results: computation.report.results,
        })
        .await
        .map_err(|e| map_store_error(rid, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CreatedReading {
                id: stored.id,
                results: stored.results,
            },
            meta: ResponseMeta::new(req_id.0.clone()),
        }),
    ))
}

/// GET /api/v1/readings/{id}
pub(super) async fn get_reading(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoredReading>>, ApiError> {
    let reading = state
        .store
        .load(&id)
        .await
        .map_err(|e| map_store_error(&req_id.0, &e))?;

    Ok(Json(ApiResponse {
        data: reading,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_store_error(rid: &str, error: &StoreError) -> ApiError {
    match error {
        StoreError::InvalidId(_) => ApiError::new(rid, "bad_request", error.to_string()),
        StoreError::NotFound(_) => ApiError::new(rid, "not_found", error.to_string()),
        StoreError::Io { .. } | StoreError::Serialize(_) => {
            tracing::error!(error = %error, "result store failed");
            ApiError::internal(rid, "result store unavailable")
        }
    }
}
