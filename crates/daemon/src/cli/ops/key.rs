use clap::Args;

use sealpost_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Key {
    /// Print the SHA-256 fingerprint instead of the PEM
    #[arg(long)]
    pub fingerprint: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("state error: {0}")]
    State(#[from] sealpost_daemon::state::StateError),
    #[error("key store error: {0}")]
    KeyStore(#[from] common::keystore::KeyStoreError),
    #[error("key error: {0}")]
    Key(#[from] common::crypto::KeyError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Key {
    type Error = KeyError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let keys = state.key_store();

        if self.fingerprint {
            Ok(keys.public_key()?.fingerprint()?)
        } else {
            Ok(keys.export_public_key()?.trim_end().to_string())
        }
    }
}
