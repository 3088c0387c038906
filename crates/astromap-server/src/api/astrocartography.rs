//! `/astrocartography`: birth data in, ranked power spots out.
//!
//! Shared by the readings endpoints, which run the same computation and
//! persist the outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use astromap_core::{
    parse_birth_date, BirthMoment, CelestialBody, OrbTolerance, ResultSet, UtTimeReference,
};
use astromap_ephem::check_epoch;
use astromap_matcher::{MatchError, MatchReport, SkippedBody};
use astromap_tz::{TimeError, TimeNormalizer};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, AppState};

const DEFAULT_GET_BIRTH_DATE: &str = "1990-01-01T12:00:00";

fn default_planets() -> Vec<String> {
    CelestialBody::DEFAULT_REQUEST
        .iter()
        .map(|b| b.name().to_owned())
        .collect()
}

fn default_orb_tolerance() -> f64 {
    OrbTolerance::DEFAULT_DEGREES
}

/// JSON body for `POST /astrocartography` and `POST /api/v1/readings`.
#[derive(Debug, Deserialize)]
pub(super) struct AstroRequest {
    pub birth_date: String,
    #[serde(default = "default_planets")]
    pub planets: Vec<String>,
    #[serde(default = "default_orb_tolerance")]
    pub orb_tolerance: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AstroQuery {
    pub birth_date: Option<String>,
    /// Comma-separated body names.
    pub planets: Option<String>,
    pub orb_tolerance: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<AstroQuery> for AstroRequest {
    fn from(q: AstroQuery) -> Self {
        Self {
            birth_date: q
                .birth_date
                .unwrap_or_else(|| DEFAULT_GET_BIRTH_DATE.to_owned()),
            planets: q.planets.map_or_else(default_planets, |p| split_planets(&p)),
            orb_tolerance: q.orb_tolerance.unwrap_or_else(default_orb_tolerance),
            latitude: q.latitude,
            longitude: q.longitude,
        }
    }
}

fn split_planets(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug, Serialize)]
pub(super) struct AstroResponse {
    pub results: ResultSet,
    pub skipped: Vec<SkippedBody>,
    pub julian_day_ut: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Everything a handler needs after a successful pass.
pub(super) struct Computation {
    pub birth_date: NaiveDateTime,
    pub time: UtTimeReference,
    pub tolerance: OrbTolerance,
    pub timezone: Option<String>,
    pub report: MatchReport,
}

impl Computation {
    pub(super) fn into_body(self) -> AstroResponse {
        AstroResponse {
            results: self.report.results,
            skipped: self.report.skipped,
            julian_day_ut: self.time.julian_day(),
            timezone: self.timezone,
        }
    }
}

/// POST /astrocartography
pub(super) async fn astrocartography_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AstroRequest>,
) -> Result<Json<AstroResponse>, ApiError> {
    let computation = compute(&state, &req_id.0, body).await?;
    Ok(Json(computation.into_body()))
}

/// GET /astrocartography
pub(super) async fn astrocartography_get(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AstroQuery>,
) -> Result<Json<AstroResponse>, ApiError> {
    let computation = compute(&state, &req_id.0, query.into()).await?;
    Ok(Json(computation.into_body()))
}

/// Validate input, derive the UT time reference, and run the matcher on the
/// blocking pool under the configured timeout.
pub(super) async fn compute(
    state: &AppState,
    rid: &str,
    request: AstroRequest,
) -> Result<Computation, ApiError> {
    let birth_date = parse_birth_date(&request.birth_date)
        .map_err(|e| ApiError::validation(rid, e.to_string()))?;
    let tolerance = OrbTolerance::new(request.orb_tolerance)
        .map_err(|e| ApiError::validation(rid, e.to_string()))?;

    let (time, timezone) = match (request.latitude, request.longitude) {
        (None, None) => (TimeNormalizer::from_ut(birth_date), None),
        (Some(latitude), Some(longitude)) => {
            let moment = BirthMoment::new(birth_date, latitude, longitude)
                .map_err(|e| ApiError::validation(rid, e.to_string()))?;
            let normalized = state
                .normalizer
                .normalize(&moment)
                .await
                .map_err(|e| map_time_error(rid, &e))?;
            (normalized.time, Some(normalized.timezone.name().to_owned()))
        }
        _ => {
            return Err(ApiError::validation(
                rid,
                "latitude and longitude must be provided together",
            ));
        }
    };
    check_epoch(time).map_err(|e| ApiError::validation(rid, e.to_string()))?;

    let matcher = state.matcher.clone();
    let planets = request.planets;
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);
    let task = tokio::task::spawn_blocking(move || {
        matcher.run_cancellable(time, &planets, tolerance, &worker_cancel)
    });

    let report = match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(Ok(report))) => report,
        Ok(Ok(Err(e))) => return Err(map_match_error(rid, &e)),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "matching task failed");
            return Err(ApiError::internal(rid, "internal server error"));
        }
        Err(_) => {
            // The blocking task cannot be aborted; the flag makes it stop at
            // the next city.
            cancel.store(true, Ordering::Relaxed);
            tracing::warn!(
                timeout_secs = state.request_timeout.as_secs_f64(),
                "matching pass timed out"
            );
            return Err(ApiError::new(rid, "timeout", "computation timed out"));
        }
    };

    for skipped in &report.skipped {
        tracing::debug!(planet = %skipped.name, reason = %skipped.reason, "planet skipped");
    }

    Ok(Computation {
        birth_date,
        time,
        tolerance,
        timezone,
        report,
    })
}

fn map_time_error(rid: &str, error: &TimeError) -> ApiError {
    match error {
        TimeError::TimezoneResolution { .. } | TimeError::InvalidTimezone(_) => {
            ApiError::new(rid, "timezone_unresolved", error.to_string())
        }
        TimeError::NonexistentLocalTime { .. } => {
            ApiError::new(rid, "invalid_local_time", error.to_string())
        }
        TimeError::Lookup(e) => {
            tracing::error!(error = %e, "timezone lookup failed");
            ApiError::internal(rid, "timezone lookup failed")
        }
    }
}

fn map_match_error(rid: &str, error: &MatchError) -> ApiError {
    match error {
        MatchError::Cancelled => ApiError::new(rid, "timeout", "computation timed out"),
        MatchError::Ephemeris { .. } => {
            tracing::error!(error = %error, "astronomical calculation failed");
            ApiError::new(rid, "ephemeris_error", "astronomical calculation failed")
        }
    }
}
