use std::path::PathBuf;

use clap::Args;

use common::transfer::TransferMode;
use sealpost_daemon::http_server::api::client::ApiError;
use sealpost_daemon::http_server::api::send_to_peer::SendToPeerRequest;

#[derive(Args, Debug, Clone)]
pub struct SendFile {
    /// Peer address: host, host:port or http://host:port
    #[arg(long)]
    pub peer: String,

    /// File to send
    #[arg(long)]
    pub file: PathBuf,

    /// Send without encryption
    #[arg(long)]
    pub plain: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} has no file name")]
    NoFileName(PathBuf),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SendFile {
    type Error = SendError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let filename = self
            .file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| SendError::NoFileName(self.file.clone()))?;

        let file = tokio::fs::read(&self.file)
            .await
            .map_err(|source| SendError::Read {
                path: self.file.clone(),
                source,
            })?;

        let mode = if self.plain {
            TransferMode::Plain
        } else {
            TransferMode::Encrypted
        };

        let request = SendToPeerRequest {
            peer: self.peer.clone(),
            filename,
            file,
            mode,
        };

        let response = ctx.client.call(request).await?;
        Ok(response.message)
    }
}
