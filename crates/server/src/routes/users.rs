//! `/api/users`

use crate::error::{parse_body, ApiError, ApiResult, Surface};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use healthtrack_core::Credentials;
use serde_json::{json, Value};

type Body = Result<Json<Value>, JsonRejection>;

/// User routes, relative to the mount point
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
}

fn credentials(body: Body) -> Result<Credentials, ApiError> {
    parse_body(body)
}

async fn register(State(state): State<AppState>, body: Body) -> ApiResult<Response> {
    let credentials = credentials(body)?;
    let user = state
        .run(Surface::Users, move |db| db.users().register(&credentials))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully", "user": user })),
    )
        .into_response())
}

async fn login(State(state): State<AppState>, body: Body) -> ApiResult<Json<Value>> {
    let credentials = credentials(body)?;
    let user = state
        .run(Surface::Users, move |db| db.users().login(&credentials))
        .await?;
    Ok(Json(json!({ "message": "Login successful", "user": user })))
}

async fn forgot_password(State(state): State<AppState>, body: Body) -> ApiResult<Json<Value>> {
    let credentials = credentials(body)?;
    let message = state
        .run(Surface::Users, move |db| {
            db.users().forgot_password(credentials.email.as_deref())
        })
        .await?;
    Ok(Json(json!({ "message": message })))
}
