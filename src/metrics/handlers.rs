use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    auth::extractors::{AdminOnly, AnyRole, Authorized},
    error::AppError,
    extract::{ApiJson, ApiPath},
    metrics::{
        dto::{Ack, MetricSubmission},
        repo_types::{Facility, MetricKey},
    },
    state::AppState,
};

const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/data/facilities", get(list_facilities))
        .route("/data/:facility_id/:year", get(get_record))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/data", post(upsert_record))
}

#[instrument(skip(state, _auth))]
pub async fn list_facilities(
    State(state): State<AppState>,
    _auth: Authorized<AnyRole>,
) -> Result<Json<Vec<Facility>>, AppError> {
    Ok(Json(state.metrics.list_facilities().await?))
}

/// Returns the record, or `{}` when nothing has been recorded for the pair yet.
#[instrument(skip(state, _auth))]
pub async fn get_record(
    State(state): State<AppState>,
    _auth: Authorized<AnyRole>,
    ApiPath((facility_id, year)): ApiPath<(i64, i32)>,
) -> Result<Response, AppError> {
    let key = MetricKey { facility_id, year };
    Ok(match state.metrics.get(key).await? {
        Some(record) => Json(record).into_response(),
        None => Json(json!({})).into_response(),
    })
}

#[instrument(skip(state, payload), fields(user_id = %principal.user_id))]
pub async fn upsert_record(
    State(state): State<AppState>,
    Authorized(principal, _): Authorized<AdminOnly>,
    ApiJson(payload): ApiJson<MetricSubmission>,
) -> Result<(StatusCode, Json<Ack>), AppError> {
    let (key, values) = payload.into_parts();
    if !YEARS.contains(&key.year) {
        return Err(AppError::InvalidInput(format!("year {} out of range", key.year)));
    }
    if !values.is_finite() {
        return Err(AppError::InvalidInput("metric values must be finite".into()));
    }

    state.metrics.upsert(key, values).await?;
    info!(facility_id = key.facility_id, year = key.year, "metrics saved");
    Ok((
        StatusCode::CREATED,
        Json(Ack {
            message: "Data saved successfully",
        }),
    ))
}
