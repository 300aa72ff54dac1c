use std::time::Duration;

use reqwest::Client;

use super::PeerAddress;
use crate::crypto::PublicKey;

/// Path of the key-retrieval endpoint every node serves
pub const PUBLIC_KEY_PATH: &str = "/public-key";
/// Default bound on a public key fetch
pub const DEFAULT_KEY_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Connection refused, timed out, or the peer has no key endpoint
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },
    /// The peer answered, but not with a usable public key
    #[error("peer {peer} returned an invalid public key: {reason}")]
    KeyFormat { peer: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(String),
}

impl PeerError {
    pub(crate) fn unreachable(peer: &PeerAddress, reason: impl ToString) -> Self {
        PeerError::Unreachable {
            peer: peer.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Fetches a peer's current public key over HTTP
///
/// No caching: every call goes to the network, so a peer that regenerated its
/// key is picked up on the next transfer.
#[derive(Debug, Clone)]
pub struct PeerKeyExchange {
    client: Client,
    timeout: Duration,
}

impl PeerKeyExchange {
    pub fn new(timeout: Duration) -> Result<Self, PeerError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| PeerError::Client(e.to_string()))?;
        Ok(Self::with_client(client, timeout))
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// `GET {peer}/public-key` and parse the PEM body
    ///
    /// The timeout covers connecting, the response and reading the body.
    pub async fn fetch_public_key(&self, peer: &PeerAddress) -> Result<PublicKey, PeerError> {
        let url = peer.endpoint(PUBLIC_KEY_PATH);
        tracing::debug!(%url, timeout_ms = self.timeout.as_millis() as u64, "fetching peer public key");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PeerError::unreachable(peer, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PeerError::unreachable(
                peer,
                format!("key endpoint answered HTTP {}", status),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PeerError::unreachable(peer, e))?;

        let key = PublicKey::from_pem(&body).map_err(|e| PeerError::KeyFormat {
            peer: peer.to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(%peer, bits = key.bits(), "fetched peer public key");
        Ok(key)
    }
}
