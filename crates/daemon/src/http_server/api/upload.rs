use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

use common::transfer::{receive, RawBundle, TransferMode, TransferResponse, FILENAME_FIELD};

use super::HandlerError;
use crate::ServiceState;

/// `POST /upload`: receive, unwrap and decrypt an encrypted bundle
pub async fn encrypted_handler(
    State(state): State<ServiceState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let raw = read_bundle(TransferMode::Encrypted, multipart).await?;
    accept(state, raw).await
}

/// `POST /upload-plain`: store a file sent without encryption
pub async fn plain_handler(
    State(state): State<ServiceState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let raw = read_bundle(TransferMode::Plain, multipart).await?;
    accept(state, raw).await
}

/// Collect the multipart fields of one bundle without judging them
///
/// Validation is left to [`receive`], which rejects an incomplete bundle as a
/// whole. The name comes only from the `filename` field, never from a part's
/// own file name.
async fn read_bundle(mode: TransferMode, mut multipart: Multipart) -> Result<RawBundle, HandlerError> {
    let mut raw = RawBundle::new(mode);

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Multipart parsing error: {}", e);
        HandlerError::Multipart(e.to_string())
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == FILENAME_FIELD {
            let filename = field
                .text()
                .await
                .map_err(|e| HandlerError::Multipart(e.to_string()))?;
            raw.set_filename(filename);
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| {
                tracing::error!("Error reading field {}: {}", field_name, e);
                HandlerError::Multipart(e.to_string())
            })?
            .to_vec();

        tracing::debug!(field = %field_name, bytes = data.len(), "read bundle field");
        if !raw.set_bytes(&field_name, data) {
            tracing::warn!("Ignoring unknown field: {}", field_name);
        }
    }

    Ok(raw)
}

async fn accept(state: ServiceState, raw: RawBundle) -> Result<Response, HandlerError> {
    let secret = state.secret();
    let storage = state.receive_dir().clone();

    let report = tokio::task::spawn_blocking(move || receive(raw, &secret, &storage))
        .await
        .map_err(|e| HandlerError::Internal(e.to_string()))??;

    let message = match report.mode {
        TransferMode::Encrypted => "File received and decrypted successfully.",
        TransferMode::Plain => "File received successfully.",
    };

    Ok((StatusCode::OK, Json(TransferResponse::ok(message))).into_response())
}
