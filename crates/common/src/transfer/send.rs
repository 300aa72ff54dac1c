use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::Client;

use super::bundle::{EncryptedBundle, PlainBundle, TransferResponse};
use super::peer::{PeerError, PeerKeyExchange, DEFAULT_KEY_FETCH_TIMEOUT};
use super::{PeerAddress, SendState, TransferError, TransferMode};
use crate::crypto::{self, PublicKey};

/// Receive endpoint for encrypted bundles
pub const UPLOAD_PATH: &str = "/upload";
/// Receive endpoint for plain bundles
pub const UPLOAD_PLAIN_PATH: &str = "/upload-plain";
/// Default bound on posting a bundle and awaiting the acknowledgment
pub const DEFAULT_TRANSMIT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub key_fetch_timeout: Duration,
    pub transmit_timeout: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            key_fetch_timeout: DEFAULT_KEY_FETCH_TIMEOUT,
            transmit_timeout: DEFAULT_TRANSMIT_TIMEOUT,
        }
    }
}

/// What a completed send did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub mode: TransferMode,
    pub peer: String,
    pub filename: String,
    /// Size of the payload on the wire (ciphertext or raw file)
    pub bytes_sent: usize,
    pub message: String,
}

/// Sending side of the transfer protocol
///
/// Cheap to clone; holds no per-transfer state. Concurrent sends share only
/// the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct Transfer {
    client: Client,
    keys: PeerKeyExchange,
    transmit_timeout: Duration,
}

impl Transfer {
    pub fn new(config: &TransferConfig) -> Result<Self, TransferError> {
        let client = Client::builder()
            .connect_timeout(config.key_fetch_timeout)
            .build()
            .map_err(|e| PeerError::Client(e.to_string()))?;
        let keys = PeerKeyExchange::with_client(client.clone(), config.key_fetch_timeout);
        Ok(Self {
            client,
            keys,
            transmit_timeout: config.transmit_timeout,
        })
    }

    pub fn key_exchange(&self) -> &PeerKeyExchange {
        &self.keys
    }

    /// Send `file` to `peer`
    ///
    /// Encrypted: `Idle -> FetchingPeerKey -> Encrypting -> Transmitting -> Done`.
    /// Plain: `Idle -> Transmitting -> Done`. Any failure ends the transfer;
    /// nothing is retried and no bundle is sent unless every earlier step
    /// succeeded.
    #[tracing::instrument(skip(self, file), fields(bytes = file.len()))]
    pub async fn send(
        &self,
        peer: &PeerAddress,
        file: &[u8],
        filename: &str,
        mode: TransferMode,
    ) -> Result<SendReport, TransferError> {
        let mut state = SendState::Idle;
        let result = self.run_send(peer, file, filename, mode, &mut state).await;

        match &result {
            Ok(report) => {
                tracing::info!(%peer, filename, %mode, bytes = report.bytes_sent, "transfer sent");
            }
            Err(e) => {
                let failed_in = state.fail();
                tracing::warn!(%peer, filename, %mode, %failed_in, error = %e, "transfer failed");
            }
        }
        result
    }

    async fn run_send(
        &self,
        peer: &PeerAddress,
        file: &[u8],
        filename: &str,
        mode: TransferMode,
        state: &mut SendState,
    ) -> Result<SendReport, TransferError> {
        let (form, bytes_sent, path) = match mode {
            TransferMode::Encrypted => {
                state.advance(SendState::FetchingPeerKey);
                let recipient = self.keys.fetch_public_key(peer).await?;

                state.advance(SendState::Encrypting);
                let (sealed, wrapped) = seal_for(recipient, file.to_vec()).await?;
                let bytes_sent = sealed.ciphertext.len();

                let bundle = EncryptedBundle {
                    session_key: wrapped,
                    iv: sealed.iv.bytes().to_vec(),
                    ciphertext: sealed.ciphertext,
                    filename: filename.to_string(),
                };
                (bundle.into_form()?, bytes_sent, UPLOAD_PATH)
            }
            TransferMode::Plain => {
                let bundle = PlainBundle {
                    file: file.to_vec(),
                    filename: filename.to_string(),
                };
                (bundle.into_form()?, file.len(), UPLOAD_PLAIN_PATH)
            }
        };

        state.advance(SendState::Transmitting);
        let ack = self.transmit(peer, path, form).await?;

        state.advance(SendState::Done);
        Ok(SendReport {
            mode,
            peer: peer.to_string(),
            filename: filename.to_string(),
            bytes_sent,
            message: ack.message,
        })
    }

    async fn transmit(
        &self,
        peer: &PeerAddress,
        path: &str,
        form: Form,
    ) -> Result<TransferResponse, TransferError> {
        let url = peer.endpoint(path);
        tracing::debug!(%url, "posting bundle");

        let response = self
            .client
            .post(url)
            .timeout(self.transmit_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PeerError::unreachable(peer, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PeerError::unreachable(peer, e))?;
        let ack = serde_json::from_str::<TransferResponse>(&body).ok();

        match ack {
            Some(ack) if status.is_success() && ack.success => Ok(ack),
            Some(ack) => Err(TransferError::Rejected {
                status: status.as_u16(),
                message: ack.message,
            }),
            None if status.is_success() => Ok(TransferResponse::ok(body)),
            None => Err(TransferError::Rejected {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

/// Encrypt `plaintext` and wrap its session key for `recipient`
///
/// Runs on the blocking pool; both steps are CPU bound and scale with the file.
async fn seal_for(
    recipient: PublicKey,
    plaintext: Vec<u8>,
) -> Result<(crypto::Sealed, Vec<u8>), TransferError> {
    tokio::task::spawn_blocking(move || {
        let sealed = crypto::encrypt(&plaintext)?;
        let wrapped = recipient.wrap(sealed.session_key.bytes())?;
        Ok((sealed, wrapped))
    })
    .await
    .map_err(|e| TransferError::Task(e.to_string()))?
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    use super::*;
    use crate::crypto::test_bob;
    use crate::transfer::PUBLIC_KEY_PATH;

    async fn serve(router: Router) -> PeerAddress {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        PeerAddress::parse(&addr.to_string()).unwrap()
    }

    fn key_route(router: Router) -> Router {
        let pem = test_bob().public().to_pem().unwrap();
        router.route(PUBLIC_KEY_PATH, get(move || async move { pem }))
    }

    fn transfer() -> Transfer {
        Transfer::new(&TransferConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_seal_for_recipient() {
        let bob = test_bob();
        let (sealed, wrapped) = seal_for(bob.public(), b"sealed off the reactor".to_vec())
            .await
            .unwrap();

        let key = crypto::SessionKey::from_slice(&bob.unwrap(&wrapped).unwrap()).unwrap();
        let plaintext = crypto::decrypt(&key, &sealed.iv, &sealed.ciphertext).unwrap();
        assert_eq!(plaintext, b"sealed off the reactor".to_vec());
    }

    #[tokio::test]
    async fn test_rejection_carries_peer_message() {
        let peer = serve(key_route(Router::new()).route(
            UPLOAD_PATH,
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(TransferResponse::failed("unable to unwrap session key")),
                )
            }),
        ))
        .await;

        match transfer()
            .send(&peer, b"data", "a.txt", TransferMode::Encrypted)
            .await
        {
            Err(TransferError::Rejected { status, message }) => {
                assert_eq!(status, 422);
                assert_eq!(message, "unable to unwrap session key");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_acknowledgment_accepted() {
        let peer = serve(Router::new().route(UPLOAD_PLAIN_PATH, post(|| async { "thanks" }))).await;

        let report = transfer()
            .send(&peer, b"data", "a.txt", TransferMode::Plain)
            .await
            .unwrap();
        assert_eq!(report.message, "thanks");
        assert_eq!(report.bytes_sent, 4);
    }

    #[tokio::test]
    async fn test_plain_send_skips_key_exchange() {
        let key_fetches = Arc::new(AtomicUsize::new(0));
        let counter = key_fetches.clone();
        let peer = serve(
            Router::new()
                .route(
                    PUBLIC_KEY_PATH,
                    get(move || {
                        let counter = counter.clone();
                        async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            "unused"
                        }
                    }),
                )
                .route(
                    UPLOAD_PLAIN_PATH,
                    post(|| async { Json(TransferResponse::ok("stored")) }),
                ),
        )
        .await;

        let report = transfer()
            .send(&peer, b"data", "a.txt", TransferMode::Plain)
            .await
            .unwrap();
        assert_eq!(report.message, "stored");
        assert_eq!(key_fetches.load(Ordering::SeqCst), 0);
    }
}
