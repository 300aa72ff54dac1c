use std::fmt::Debug;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;

use crate::ServiceState;

#[async_trait]
pub trait DataSource {
    /// Perform various checks on the system to ensure its healthy and ready to accept requests.
    async fn is_ready(&self) -> Result<(), DataSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("private key missing at {0}")]
    MissingPrivateKey(PathBuf),
    #[error("receive directory {0} is not a directory")]
    ReceiveDirUnusable(PathBuf),
}

impl DataSourceError {
    /// Short name of the failed check, reported as `check` by `/readyz`
    pub fn check(&self) -> &'static str {
        match self {
            DataSourceError::MissingPrivateKey(_) => "private_key",
            DataSourceError::ReceiveDirUnusable(_) => "receive_dir",
        }
    }
}

pub type DynDataSource = Arc<dyn DataSource + Send + Sync>;

pub struct StateDataSource(DynDataSource);

impl Debug for StateDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateDataSource").finish()
    }
}

impl StateDataSource {
    #[cfg(test)]
    pub fn new(dds: DynDataSource) -> Self {
        Self(dds)
    }
}

impl Deref for StateDataSource {
    type Target = DynDataSource;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Ready when the private key is still on disk and the receive directory is usable
struct NodeSource {
    private_key_path: PathBuf,
    receive_dir: PathBuf,
}

#[async_trait]
impl DataSource for NodeSource {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        if !tokio::fs::try_exists(&self.private_key_path)
            .await
            .unwrap_or(false)
        {
            tracing::warn!(path = %self.private_key_path.display(), "private key missing");
            return Err(DataSourceError::MissingPrivateKey(
                self.private_key_path.clone(),
            ));
        }

        // created lazily on first receive, but must not be something else
        match tokio::fs::metadata(&self.receive_dir).await {
            Ok(meta) if !meta.is_dir() => Err(DataSourceError::ReceiveDirUnusable(
                self.receive_dir.clone(),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl FromRequestParts<ServiceState> for StateDataSource {
    type Rejection = ();

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        Ok(StateDataSource(Arc::new(NodeSource {
            private_key_path: state.key_store().private_key_path(),
            receive_dir: state.receive_dir().root().to_path_buf(),
        })))
    }
}
