//! `sentinel health`: check that the configured backend answers.

use std::sync::Arc;

use sentinel_client::SentinelClient;
use sentinel_config::{BackendConfig, ConfigStore, FileConfigStore};
use sentinel_core::error::{ApiError, ApiResult};

use super::render::operator_message;

pub async fn run(store: FileConfigStore) -> anyhow::Result<()> {
    let result = match load_config(&store) {
        Ok(config) => {
            println!("Checking {} ...", display_url(&config.backend_url));
            SentinelClient::new(Arc::new(store))
                .health_check(&config)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            println!("  Backend reachable");
            Ok(())
        }
        Err(e) => {
            println!("  {}", operator_message(&e));
            let kind = e.kind();
            Err(anyhow::Error::new(e).context(format!("Health check failed ({kind})")))
        }
    }
}

/// Store failures surface as CONFIG, the same as on the analysis path.
fn load_config(store: &dyn ConfigStore) -> ApiResult<BackendConfig> {
    store
        .load()
        .map_err(|e| ApiError::config(format!("Unable to load backend config: {e}")))
}

fn display_url(url: &str) -> &str {
    if url.trim().is_empty() { "<no backend URL>" } else { url.trim() }
}
