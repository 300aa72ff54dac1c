use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;

use crate::ServiceState;

#[derive(Serialize)]
pub struct IdentityResponse {
    /// SHA-256 of the DER-encoded public key, hex
    pub fingerprint: String,
    pub key_bits: usize,
}

#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    let response = IdentityResponse {
        fingerprint: state.fingerprint().to_string(),
        key_bits: state.secret().public().bits(),
    };
    (StatusCode::OK, Json(response)).into_response()
}
