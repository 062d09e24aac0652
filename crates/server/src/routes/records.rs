//! `/api/records`

use crate::error::{ApiError, ApiResult, Surface};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use healthtrack_core::{RawRecord, Record, RecordPatch, RecordWithOwner};
use serde_json::{json, Value};

type Body = Result<Json<Value>, JsonRejection>;

/// Record routes, relative to the mount point
///
/// `/:id` is a patient id for GET and a record id for PUT.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/sync", post(sync))
        .route("/:id", get(for_patient).put(update))
}

async fn create(State(state): State<AppState>, body: Body) -> ApiResult<Response> {
    let Json(value) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let raw = RawRecord::from_json(&value);
    let record = state
        .run(Surface::Records, move |db| db.records().create_record(raw))
        .await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<RecordWithOwner>>> {
    let records = state
        .run(Surface::Records, |db| db.records().list_records())
        .await?;
    Ok(Json(records))
}

async fn for_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> ApiResult<Response> {
    let records = state
        .run(Surface::Records, move |db| {
            db.records().records_for_patient(&patient_id)
        })
        .await?;
    if records.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No records found for this patient." })),
        )
            .into_response());
    }
    Ok(Json(records).into_response())
}

async fn sync(State(state): State<AppState>, body: Body) -> ApiResult<Json<Value>> {
    let Json(value) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let candidates: Vec<RawRecord> = match value.get("records") {
        Some(Value::Array(items)) => items.iter().map(RawRecord::from_json).collect(),
        _ => Vec::new(),
    };
    let report = state
        .run(Surface::Records, move |db| db.sync().sync_records(candidates))
        .await?;
    Ok(Json(json!({
        "message": format!("{} records synced successfully.", report.accepted_count),
        "data": report.accepted_records,
        "rejected": report.rejected,
    })))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body,
) -> ApiResult<Json<Record>> {
    let Json(value) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let patch = RecordPatch::from_json(&value);
    let record = state
        .run(Surface::Records, move |db| db.records().update_record(&id, patch))
        .await?;
    Ok(Json(record))
}
