use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::time::timeout;

use super::data_source::*;

const READINESS_TIMEOUT: Duration = Duration::from_secs(10);

/// `/readyz`: 200 while this node can still receive, 503 naming the failed check otherwise
#[tracing::instrument]
pub async fn handler(data_src: StateDataSource) -> Response {
    let outcome = match timeout(READINESS_TIMEOUT, data_src.is_ready()).await {
        Ok(outcome) => outcome,
        Err(_) => return not_ready("timeout", "readiness check timed out".to_string()),
    };

    match outcome {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response(),
        Err(err) => {
            tracing::warn!(check = err.check(), "node not ready: {}", err);
            not_ready(err.check(), err.to_string())
        }
    }
}

fn not_ready(check: &str, message: String) -> Response {
    let body = serde_json::json!({
        "status": "failure",
        "check": check,
        "message": message,
    });
    (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    use crate::http_server::health::data_source::tests::*;

    #[tokio::test]
    async fn test_ready_node() {
        let response = handler(StateDataSource::new(Arc::new(MockReadiness::Ready))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_key_names_check() {
        let response = handler(StateDataSource::new(Arc::new(MockReadiness::KeyMissing))).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["check"], "private_key");
    }
}
