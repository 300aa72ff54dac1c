use std::time::Duration;

use reqwest::Client;
use url::Url;

use common::transfer::TransferResponse;

use super::error::ApiError;
use super::ApiRequest;

/// Talks to a running node on behalf of the CLI
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client);
        let response = request_builder.send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T::Response>().await?)
        } else {
            let body = response.text().await?;
            // nodes answer failures with a TransferResponse; surface its message
            let message = serde_json::from_str::<TransferResponse>(&body)
                .map(|r| r.message)
                .unwrap_or(body);
            Err(ApiError::HttpStatus(status, message))
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
