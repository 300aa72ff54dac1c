use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use common::crypto::DEFAULT_KEY_BITS;
use common::keystore::{KeyStore, KeyStoreConfig, KeyStoreError};
use common::transfer::DEFAULT_PEER_PORT;

pub const APP_NAME: &str = "sealpost";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port the node's HTTP server listens on
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Port assumed for peers given as a bare host
    #[serde(default = "default_peer_port")]
    pub peer_port: u16,
    /// Bound on fetching a peer's public key
    #[serde(default = "default_key_fetch_timeout_secs")]
    pub key_fetch_timeout_secs: u64,
    /// Bound on posting a bundle and awaiting the acknowledgment
    #[serde(default = "default_transmit_timeout_secs")]
    pub transmit_timeout_secs: u64,
    /// Where received files are written (defaults to the working directory)
    #[serde(default)]
    pub receive_dir: Option<PathBuf>,
    /// Modulus size for a freshly generated key pair
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,
}

fn default_listen_port() -> u16 {
    DEFAULT_PEER_PORT
}

fn default_peer_port() -> u16 {
    DEFAULT_PEER_PORT
}

fn default_key_fetch_timeout_secs() -> u64 {
    5
}

fn default_transmit_timeout_secs() -> u64 {
    60
}

fn default_key_bits() -> usize {
    DEFAULT_KEY_BITS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            peer_port: default_peer_port(),
            key_fetch_timeout_secs: default_key_fetch_timeout_secs(),
            transmit_timeout_secs: default_transmit_timeout_secs(),
            receive_dir: None,
            key_bits: default_key_bits(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the node directory (~/.sealpost)
    pub node_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the node directory path (custom or default ~/.sealpost)
    pub fn node_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new node directory and generate its key pair
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let node_dir = Self::node_dir(custom_path)?;
        let config_path = node_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&node_dir)?;

        let config = config.unwrap_or_default();
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        let state = Self {
            node_dir,
            config_path,
            config,
        };
        state.key_store().ensure_keys_exist()?;

        Ok(state)
    }

    /// Load existing state from the node directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let node_dir = Self::node_dir(custom_path)?;

        if !node_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = node_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            node_dir,
            config_path,
            config,
        })
    }

    /// Key store rooted at the node directory
    pub fn key_store(&self) -> KeyStore {
        KeyStore::new(KeyStoreConfig::new(&self.node_dir).with_key_bits(self.config.key_bits))
    }

    /// Configured receive directory, or the working directory
    pub fn receive_dir(&self) -> Result<PathBuf, StateError> {
        match &self.config.receive_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("sealpost directory not initialized. Run 'sealpost init' first")]
    NotInitialized,

    #[error("sealpost directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
