//! `/api/patients`

use crate::error::{parse_body, ApiResult, Surface};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use healthtrack_core::{Credentials, Patient, PatientFields, PatientRegistration};
use serde_json::{json, Value};

type Body = Result<Json<Value>, JsonRejection>;

/// Patient routes, relative to the mount point
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/:id", get(fetch).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Patient>>> {
    let patients = state.run(Surface::Patients, |db| db.patients().list()).await?;
    Ok(Json(patients))
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Patient>> {
    let patient = state
        .run(Surface::Patients, move |db| db.patients().get(&id))
        .await?;
    Ok(Json(patient))
}

async fn create(State(state): State<AppState>, body: Body) -> ApiResult<Response> {
    let fields: PatientFields = parse_body(body)?;
    let patient = state
        .run(Surface::Patients, move |db| db.patients().create(fields))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Patient added successfully", "patient": patient })),
    )
        .into_response())
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body,
) -> ApiResult<Json<Value>> {
    let fields: PatientFields = parse_body(body)?;
    let patient = state
        .run(Surface::Patients, move |db| db.patients().update(&id, fields))
        .await?;
    Ok(Json(json!({ "message": "Patient updated", "patient": patient })))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    state
        .run(Surface::Patients, move |db| db.patients().delete(&id))
        .await?;
    Ok(Json(json!({ "message": "Patient deleted" })))
}

async fn register(State(state): State<AppState>, body: Body) -> ApiResult<Response> {
    let registration: PatientRegistration = parse_body(body)?;
    let patient = state
        .run(Surface::Patients, move |db| {
            db.patients().register_with_credential(registration)
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Registration successful", "patient": patient })),
    )
        .into_response())
}

async fn login(State(state): State<AppState>, body: Body) -> ApiResult<Json<Value>> {
    let credentials: Credentials = parse_body(body)?;
    let patient = state
        .run(Surface::Patients, move |db| db.patients().login(&credentials))
        .await?;
    Ok(Json(json!({ "message": "Login successful", "patient": patient })))
}

async fn forgot_password(State(state): State<AppState>, body: Body) -> ApiResult<Json<Value>> {
    let credentials: Credentials = parse_body(body)?;
    let message = state
        .run(Surface::Patients, move |db| {
            db.patients().forgot_password(credentials.email.as_deref())
        })
        .await?;
    Ok(Json(json!({ "message": message })))
}
