use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};

use common::transfer::{PeerAddress, TransferError, TransferMode, TransferResponse};

use super::client::ApiRequest;
use super::{HandlerError, SEND_TO_PEER_PATH};
use crate::ServiceState;

/// Multipart field naming the peer
pub const IP_FIELD: &str = "ip";
/// Multipart field carrying the file to send
pub const FILE_FIELD: &str = "file";
/// Optional multipart field selecting `encrypted` or `plain`
pub const MODE_FIELD: &str = "mode";

/// Ask the local node to send a file to a peer
#[derive(Debug, Clone)]
pub struct SendToPeerRequest {
    /// Peer address as `host`, `host:port` or `http://host:port`
    pub peer: String,
    pub filename: String,
    pub file: Vec<u8>,
    pub mode: TransferMode,
}

impl ApiRequest for SendToPeerRequest {
    type Response = TransferResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let mut url = base_url.clone();
        url.set_path(SEND_TO_PEER_PATH);

        let form = Form::new()
            .text(IP_FIELD, self.peer)
            .text(MODE_FIELD, self.mode.to_string())
            .part(FILE_FIELD, Part::bytes(self.file).file_name(self.filename));

        client.post(url).multipart(form)
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let mut ip: Option<String> = None;
    let mut mode = TransferMode::default();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Multipart parsing error: {}", e);
        HandlerError::Multipart(e.to_string())
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            IP_FIELD => {
                ip = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| HandlerError::Multipart(e.to_string()))?,
                );
            }
            MODE_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| HandlerError::Multipart(e.to_string()))?;
                mode = text.parse().map_err(HandlerError::InvalidRequest)?;
            }
            FILE_FIELD => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        tracing::error!("Error reading file data for {}: {}", filename, e);
                        HandlerError::Multipart(e.to_string())
                    })?
                    .to_vec();
                file = Some((filename, data));
            }
            _ => {
                tracing::warn!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let ip = ip
        .filter(|ip| !ip.trim().is_empty())
        .ok_or_else(|| HandlerError::InvalidRequest("ip is required".into()))?;
    let (filename, data) =
        file.ok_or_else(|| HandlerError::InvalidRequest("file is required".into()))?;

    let peer = PeerAddress::parse_with_default_port(&ip, state.peer_port())
        .map_err(TransferError::from)?;

    tracing::info!(%peer, %filename, %mode, bytes = data.len(), "sending file to peer");
    state.transfer().send(&peer, &data, &filename, mode).await?;

    Ok((
        StatusCode::OK,
        Json(TransferResponse::ok(format!("Successfully sent to {}", ip))),
    ))
}
