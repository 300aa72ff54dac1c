use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use common::transfer::TransferConfig;

use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct Config {
    // node configuration
    /// Directory holding the key pair
    pub node_dir: PathBuf,
    /// Modulus size used if the key pair has to be generated at startup
    pub key_bits: usize,
    /// Directory received files are written into
    pub receive_dir: PathBuf,

    // peer configuration
    /// Port assumed for peers given as a bare host
    pub peer_port: u16,
    pub key_fetch_timeout: Duration,
    pub transmit_timeout: Duration,

    // http server configuration
    pub listen_addr: SocketAddr,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Resolve the runtime configuration from a loaded node directory
    pub fn from_app_state(state: &AppState) -> Result<Self, crate::state::StateError> {
        let config = &state.config;
        Ok(Self {
            node_dir: state.node_dir.clone(),
            key_bits: config.key_bits,
            receive_dir: state.receive_dir()?,
            peer_port: config.peer_port,
            key_fetch_timeout: Duration::from_secs(config.key_fetch_timeout_secs),
            transmit_timeout: Duration::from_secs(config.transmit_timeout_secs),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], config.listen_port)),
            log_level: tracing::Level::INFO,
            log_dir: None,
        })
    }

    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            key_fetch_timeout: self.key_fetch_timeout,
            transmit_timeout: self.transmit_timeout,
        }
    }
}
