//! Registration and login endpoints.
//!
//! Routine request/response glue in front of the user directory and token
//! issuer. Argon2 verification is deliberately slow, so both handlers hop to
//! the blocking pool rather than stall the async executor.
//!
//! Response bodies are the exact shapes chat clients already expect:
//! `{"message": ...}` on errors, `{"token", "username"}` on login.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use parley_auth::AuthError;

use crate::server::AppState;

/// Request body for `/register` and `/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    /// Desired or claimed username.
    pub username: String,
    /// Plaintext password; hashed or verified, never stored.
    pub password: String,
}

/// POST /register
pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Response {
    let directory = state.directory.clone();
    let outcome =
        tokio::task::spawn_blocking(move || directory.register(&req.username, &req.password)).await;

    match outcome {
        Ok(Ok(_)) => (StatusCode::OK, Json(json!({"message": "User registered"}))).into_response(),
        Ok(Err(AuthError::UsernameTaken)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Username already exists"})),
        )
            .into_response(),
        Ok(Err(AuthError::InvalidUsername(error))) => {
            warn!(%error, "registration with invalid username");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "Invalid username"})),
            )
                .into_response()
        }
        Ok(Err(error)) => {
            error!(%error, "registration failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response()
        }
        Err(error) => {
            error!(%error, "registration task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response()
        }
    }
}

/// POST /login
pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Response {
    let directory = state.directory.clone();
    let outcome =
        tokio::task::spawn_blocking(move || directory.verify(&req.username, &req.password)).await;

    match outcome {
        Ok(Ok(username)) => match state.issuer.issue(&username) {
            Ok(token) => (
                StatusCode::OK,
                Json(json!({"token": token, "username": username})),
            )
                .into_response(),
            Err(error) => {
                error!(%error, "token issuance failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response()
            }
        },
        Ok(Err(AuthError::InvalidCredentials)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Invalid credentials"})),
        )
            .into_response(),
        Ok(Err(error)) => {
            error!(%error, "login failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response()
        }
        Err(error) => {
            error!(%error, "login task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response()
        }
    }
}
