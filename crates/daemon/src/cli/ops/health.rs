use clap::Args;

use sealpost_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                let keys = state.key_store();
                let mark = |ok: bool| if ok { "OK" } else { "MISSING" };
                lines.push(format!("  directory:       {}", state.node_dir.display()));
                lines.push("  config.toml:     OK".to_string());
                lines.push(format!(
                    "  private_key.pem: {}",
                    mark(keys.private_key_path().exists())
                ));
                lines.push(format!(
                    "  public_key.pem:  {}",
                    mark(keys.public_key_path().exists())
                ));
                lines.push(format!("  listen_port:     {}", state.config.listen_port));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        let base = ctx.client.base_url();
        let client = ctx.client.http_client();

        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));

        for probe in ["livez", "readyz"] {
            let url = format!("{}/_status/{}", base.as_str().trim_end_matches('/'), probe);
            let line = match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => format!("  {}: OK", probe),
                Ok(resp) => format!("  {}: UNHEALTHY ({})", probe, resp.status()),
                Err(_) => format!("  {}: NOT REACHABLE", probe),
            };
            lines.push(line);
        }

        Ok(lines.join("\n"))
    }
}
