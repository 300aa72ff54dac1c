use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use http::StatusCode;

use common::keystore::PUBLIC_KEY_FILE_NAME;

use crate::ServiceState;

pub const PEM_CONTENT_TYPE: &str = "application/x-pem-file";

/// Serve this node's public key as a PEM attachment
#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, PEM_CONTENT_TYPE.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", PUBLIC_KEY_FILE_NAME),
            ),
        ],
        state.public_pem().to_string(),
    )
        .into_response()
}
