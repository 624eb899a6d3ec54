//! sw_install and sw_activate tool implementations.

use std::sync::Arc;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stashd_core::{Event, EventOutcome, Fetcher};

use super::{Worker, json_output, unexpected};

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    /// Worker state after the install handler settled.
    pub state: String,
    /// Namespace that was seeded.
    pub cache_name: String,
    /// Number of precached entries.
    pub precached: usize,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    pub state: String,
    pub cache_name: String,
    /// Stale namespaces that were deleted.
    pub deleted: Vec<String>,
}

/// Implementation of the sw_install tool.
pub async fn install_impl<F: Fetcher + 'static>(worker: &Arc<Worker<F>>) -> Result<CallToolResult, McpError> {
    let precached = match worker.dispatch(Event::Install).wait().await? {
        EventOutcome::Installed { precached } => precached,
        other => return Err(unexpected("install", other)),
    };

    let output = InstallOutput {
        state: worker.state().await.to_string(),
        cache_name: worker.engine().cache_name().to_string(),
        precached,
    };
    json_output(&output)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<F: Fetcher + 'static>(worker: &Arc<Worker<F>>) -> Result<CallToolResult, McpError> {
    let deleted = match worker.dispatch(Event::Activate).wait().await? {
        EventOutcome::Activated { deleted } => deleted,
        other => return Err(unexpected("activate", other)),
    };

    let output = ActivateOutput {
        state: worker.state().await.to_string(),
        cache_name: worker.engine().cache_name().to_string(),
        deleted,
    };
    json_output(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output_json, worker};
    use stashd_core::CacheStorage;

    #[tokio::test]
    async fn test_install_then_activate() {
        let (worker, _fetcher) = worker().await;
        worker.engine().store().open("operacao-ata-v4").await.unwrap();

        let installed = output_json(&install_impl(&worker).await.unwrap());
        assert_eq!(installed["state"], "installed");
        assert_eq!(installed["cache_name"], "operacao-ata-v5");
        assert_eq!(installed["precached"], 2);

        let activated = output_json(&activate_impl(&worker).await.unwrap());
        assert_eq!(activated["state"], "activated");
        assert_eq!(activated["deleted"], serde_json::json!(["operacao-ata-v4"]));
    }

    #[tokio::test]
    async fn test_install_failure_is_error() {
        let (worker, fetcher) = worker().await;
        fetcher.drop_page("https://ata.example.org/index.html");

        let err = install_impl(&worker).await.unwrap_err();
        assert_eq!(err.code.0, -32008);
        assert_eq!(worker.state().await.to_string(), "redundant");
    }

    #[tokio::test]
    async fn test_activate_before_install_fails() {
        let (worker, _fetcher) = worker().await;
        let err = activate_impl(&worker).await.unwrap_err();
        assert_eq!(err.code.0, -32011);
    }
}
