use std::path::PathBuf;

use clap::Args;

use sealpost_daemon::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Port the node listens on
    #[arg(long, default_value_t = 5000)]
    pub listen_port: u16,

    /// Port assumed for peers given without one
    #[arg(long, default_value_t = 5000)]
    pub peer_port: u16,

    /// RSA modulus size for the node's key pair
    #[arg(long, default_value_t = common::crypto::DEFAULT_KEY_BITS)]
    pub key_bits: usize,

    /// Where received files are stored (defaults to the daemon's working directory)
    #[arg(long)]
    pub receive_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] sealpost_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            listen_port: self.listen_port,
            peer_port: self.peer_port,
            key_bits: self.key_bits,
            receive_dir: self.receive_dir.clone(),
            ..Default::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let keys = state.key_store();

        let receive_dir = match &state.config.receive_dir {
            Some(dir) => dir.display().to_string(),
            None => "daemon working directory".to_string(),
        };

        let output = format!(
            "Initialized sealpost directory at: {}\n\
             - Private key: {}\n\
             - Public key: {}\n\
             - Config: {}\n\
             - Listen port: {}\n\
             - Receive directory: {}",
            state.node_dir.display(),
            keys.private_key_path().display(),
            keys.public_key_path().display(),
            state.config_path.display(),
            state.config.listen_port,
            receive_dir
        );

        Ok(output)
    }
}
