use clap::Args;

use parley_daemon::state::AppState;

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

        // 1. Local state
        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:    {}", state.parley_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                match state.load_key() {
                    Ok(key) => lines.push(format!(
                        "  key.pem:      OK ({} bits)",
                        key.bit_length()
                    )),
                    Err(e) => lines.push(format!("  key.pem:      {}", e)),
                }
                lines.push(format!("  api_port:     {}", state.config.api_port));
                lines.push(format!("  peer_url:     {}", state.config.peer_url));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        // 2. Local daemon
        let base = ctx.client.base_url();
        let client = ctx.client.http_client();

        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));

        for probe in ["livez", "readyz"] {
            let url = format!(
                "{}/_status/{}",
                base.as_str().trim_end_matches('/'),
                probe
            );
            let line = match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let handshake = resp
                        .json::<serde_json::Value>()
                        .await
                        .ok()
                        .and_then(|body| body.get("handshake").cloned())
                        .and_then(|v| v.as_str().map(str::to_string));
                    match handshake {
                        Some(status) => format!("  {}: OK (handshake {})", probe, status),
                        None => format!("  {}: OK", probe),
                    }
                }
                Ok(resp) => format!("  {}: UNHEALTHY ({})", probe, resp.status()),
                Err(_) => format!("  {}: NOT REACHABLE", probe),
            };
            lines.push(line);
        }

        Ok(lines.join("\n"))
    }
}
