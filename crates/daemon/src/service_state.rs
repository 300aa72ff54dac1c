use std::sync::Arc;

use common::crypto::{KeyError, SecretKey};
use common::keystore::{KeyStore, KeyStoreConfig, KeyStoreError};
use common::transfer::{ReceiveDir, Transfer, TransferError};

use crate::service_config::Config;

/// Everything a request handler needs, shared across tasks
///
/// The private key is loaded once at startup and only ever read afterwards.
#[derive(Clone)]
pub struct State {
    key_store: KeyStore,
    secret: Arc<SecretKey>,
    public_pem: Arc<String>,
    fingerprint: Arc<String>,
    transfer: Transfer,
    receive_dir: ReceiveDir,
    peer_port: u16,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let key_store = KeyStore::new(
            KeyStoreConfig::new(&config.node_dir).with_key_bits(config.key_bits),
        );

        // key generation and parsing are CPU bound
        let blocking_store = key_store.clone();
        let (secret, public_pem) = tokio::task::spawn_blocking(move || {
            let generated = blocking_store.ensure_keys_exist()?;
            if generated {
                tracing::info!("generated a new key pair for this node");
            }
            let secret = blocking_store.load_private_key()?;
            let public_pem = blocking_store.export_public_key()?;
            Ok::<_, KeyStoreError>((secret, public_pem))
        })
        .await
        .map_err(|e| StateSetupError::Join(e.to_string()))??;

        let fingerprint = secret.public().fingerprint()?;
        tracing::info!(%fingerprint, "node identity loaded");

        let transfer = Transfer::new(&config.transfer_config())?;
        let receive_dir = ReceiveDir::new(config.receive_dir.clone());
        tracing::info!(receive_dir = %receive_dir.root().display(), "received files will be stored here");

        Ok(Self {
            key_store,
            secret: Arc::new(secret),
            public_pem: Arc::new(public_pem),
            fingerprint: Arc::new(fingerprint),
            transfer,
            receive_dir,
            peer_port: config.peer_port,
        })
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.key_store
    }

    pub fn secret(&self) -> Arc<SecretKey> {
        self.secret.clone()
    }

    /// PEM of this node's public key, as served to peers
    pub fn public_pem(&self) -> &str {
        &self.public_pem
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn transfer(&self) -> &Transfer {
        &self.transfer
    }

    pub fn receive_dir(&self) -> &ReceiveDir {
        &self.receive_dir
    }

    pub fn peer_port(&self) -> u16 {
        self.peer_port
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("transfer setup error: {0}")]
    Transfer(#[from] TransferError),
    #[error("setup task failed: {0}")]
    Join(String),
}
