//! Peer-to-peer file transfer
//!
//! A transfer moves one file from a sender to a receiving node over HTTP.
//!
//! # Encrypted transfers
//!
//! 1. The sender fetches the receiver's public key from `GET /public-key`
//! 2. The file is sealed under a fresh AES-256 session key and IV
//! 3. The session key is wrapped with the receiver's public key
//! 4. `session_key`, `iv`, `ciphertext` and `filename` go to `POST /upload`
//!    as a multipart form
//! 5. The receiver unwraps, decrypts and stores `DECRYPTED_<filename>`
//!
//! # Plain transfers
//!
//! `file` and `filename` go straight to `POST /upload-plain` and the receiver
//! stores `RECEIVED_<filename>`. No key exchange happens.
//!
//! Every node answers with a JSON [`TransferResponse`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod address;
mod bundle;
mod peer;
mod receive;
mod send;
mod storage;

pub use address::{AddressError, PeerAddress, DEFAULT_PEER_PORT};
pub use bundle::{
    EncryptedBundle, PlainBundle, RawBundle, TransferResponse, CIPHERTEXT_FIELD, FILENAME_FIELD,
    FILE_FIELD, IV_FIELD, SESSION_KEY_FIELD,
};
pub use peer::{PeerError, PeerKeyExchange, DEFAULT_KEY_FETCH_TIMEOUT, PUBLIC_KEY_PATH};
pub use receive::{receive, ReceiveReport};
pub use send::{
    SendReport, Transfer, TransferConfig, DEFAULT_TRANSMIT_TIMEOUT, UPLOAD_PATH, UPLOAD_PLAIN_PATH,
};
pub use storage::{sanitize_filename, ReceiveDir, StorageError, DECRYPTED_PREFIX, RECEIVED_PREFIX};

use crate::crypto::{CipherError, UnwrapError, WrapError};
use crate::keystore::KeyStoreError;

/// Whether a transfer's content is encrypted on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Encrypted,
    Plain,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferMode::Encrypted => write!(f, "encrypted"),
            TransferMode::Plain => write!(f, "plain"),
        }
    }
}

impl FromStr for TransferMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "encrypted" => Ok(TransferMode::Encrypted),
            "plain" => Ok(TransferMode::Plain),
            other => Err(format!("unknown transfer mode '{}'", other)),
        }
    }
}

/// Progress of an outgoing transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    FetchingPeerKey,
    Encrypting,
    Transmitting,
    Done,
    /// Terminal; entered from whichever state hit an error
    Failed,
}

impl SendState {
    /// Move to `Failed`, returning the state the failure happened in
    pub(crate) fn fail(&mut self) -> SendState {
        let failed_in = *self;
        self.advance(SendState::Failed);
        failed_in
    }

    pub(crate) fn advance(&mut self, next: SendState) {
        tracing::debug!(from = %self, to = %next, "send state");
        *self = next;
    }
}

impl fmt::Display for SendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SendState::Idle => "idle",
            SendState::FetchingPeerKey => "fetching_peer_key",
            SendState::Encrypting => "encrypting",
            SendState::Transmitting => "transmitting",
            SendState::Done => "done",
            SendState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Progress of an incoming transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveState {
    Idle,
    Parsing,
    UnwrappingKey,
    Decrypting,
    Persisting,
    Done,
    /// Terminal; entered from whichever state hit an error
    Failed,
}

impl ReceiveState {
    /// Move to `Failed`, returning the state the failure happened in
    pub(crate) fn fail(&mut self) -> ReceiveState {
        let failed_in = *self;
        self.advance(ReceiveState::Failed);
        failed_in
    }

    pub(crate) fn advance(&mut self, next: ReceiveState) {
        tracing::debug!(from = %self, to = %next, "receive state");
        *self = next;
    }
}

impl fmt::Display for ReceiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReceiveState::Idle => "idle",
            ReceiveState::Parsing => "parsing",
            ReceiveState::UnwrappingKey => "unwrapping_key",
            ReceiveState::Decrypting => "decrypting",
            ReceiveState::Persisting => "persisting",
            ReceiveState::Done => "done",
            ReceiveState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    #[error(transparent)]
    Peer(#[from] PeerError),
    #[error("failed to wrap session key: {0}")]
    Wrap(#[from] WrapError),
    #[error(transparent)]
    Unwrap(#[from] UnwrapError),
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error("malformed bundle, missing: {}", .0.join(", "))]
    MalformedBundle(Vec<&'static str>),
    #[error("bundle is not a {0} transfer")]
    ModeMismatch(TransferMode),
    #[error("failed to encode bundle: {0}")]
    Encoding(String),
    #[error("peer rejected transfer (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),
    #[error("transfer task failed: {0}")]
    Task(String),
}
