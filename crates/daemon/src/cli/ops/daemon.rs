use clap::Args;

use sealpost_daemon::state::AppState;
use sealpost_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override listen port (default from config)
    #[arg(long)]
    pub listen_port: Option<u16>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] sealpost_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;

        let mut config = ServiceConfig::from_app_state(&state)?;
        if let Some(port) = self.listen_port {
            config.listen_addr.set_port(port);
        }
        config.log_dir = self.log_dir.clone();

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
