use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

use common::crypto::CipherError;
use common::transfer::{StorageError, TransferError, TransferResponse};

/// Anything a transfer handler can fail with
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Multipart error: {0}")]
    Multipart(String),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::InvalidRequest(_) | HandlerError::Multipart(_) => StatusCode::BAD_REQUEST,
            HandlerError::Transfer(e) => transfer_status(e),
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn transfer_status(err: &TransferError) -> StatusCode {
    match err {
        TransferError::MalformedBundle(_)
        | TransferError::ModeMismatch(_)
        | TransferError::InvalidAddress(_)
        | TransferError::Storage(StorageError::InvalidFilename(_))
        | TransferError::Cipher(CipherError::IvLength(_)) => StatusCode::BAD_REQUEST,
        TransferError::Unwrap(_)
        | TransferError::Cipher(CipherError::Padding)
        | TransferError::Cipher(CipherError::KeyLength(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        TransferError::Peer(_) | TransferError::Rejected { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request rejected");
        }
        (status, Json(TransferResponse::failed(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod test {
    use common::crypto::UnwrapError;
    use common::transfer::{PeerAddress, PeerError};

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                HandlerError::from(TransferError::MalformedBundle(vec!["iv"])),
                StatusCode::BAD_REQUEST,
            ),
            (
                HandlerError::from(TransferError::Storage(StorageError::InvalidFilename(
                    "..".into(),
                ))),
                StatusCode::BAD_REQUEST,
            ),
            (
                HandlerError::from(TransferError::from(
                    PeerAddress::parse("ftp://x").unwrap_err(),
                )),
                StatusCode::BAD_REQUEST,
            ),
            (
                HandlerError::from(TransferError::from(UnwrapError)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                HandlerError::from(TransferError::from(CipherError::Padding)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                HandlerError::from(TransferError::from(PeerError::Unreachable {
                    peer: "10.0.0.1:5000".into(),
                    reason: "refused".into(),
                })),
                StatusCode::BAD_GATEWAY,
            ),
            (
                HandlerError::from(TransferError::Rejected {
                    status: 500,
                    message: "boom".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                HandlerError::from(TransferError::Encoding("bad mime".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                HandlerError::InvalidRequest("ip is required".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{}", err);
        }
    }

    #[test]
    fn test_response_body_shape() {
        let response = HandlerError::InvalidRequest("ip is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
    }
}
