//! sw_push, sw_sync and sw_notification_click tool implementations.

use std::sync::Arc;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stashd_core::worker::Notification;
use stashd_core::{Event, EventOutcome, Fetcher};

use super::{Worker, json_output, unexpected};
use crate::error::ToolError;

/// Input parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push message text. Omit it to show the default reminder.
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushOutput {
    /// The notification the host was asked to show.
    pub notification: Notification,
}

/// Input parameters for the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Background sync tag, e.g. "sync-study-data".
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncOutput {
    pub tag: String,
    /// False when no routine is registered for the tag.
    pub handled: bool,
}

/// Input parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Clicked action identifier. Omit it for a click on the notification body.
    #[serde(default)]
    pub action: Option<String>,

    /// Tag of the clicked notification (default: the configured tag).
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickOutput {
    /// "open_app" or "close".
    pub route: String,
}

/// Implementation of the sw_push tool.
pub async fn push_impl<F: Fetcher + 'static>(
    worker: &Arc<Worker<F>>, params: SwPushParams,
) -> Result<CallToolResult, McpError> {
    match worker.dispatch(Event::Push(params.payload)).wait().await? {
        EventOutcome::Notified(notification) => json_output(&SwPushOutput { notification }),
        other => Err(unexpected("push", other)),
    }
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl<F: Fetcher + 'static>(
    worker: &Arc<Worker<F>>, params: SwSyncParams,
) -> Result<CallToolResult, McpError> {
    let tag = params.tag.trim().to_string();
    if tag.is_empty() {
        return Err(ToolError::InvalidInput("tag cannot be empty".into()).into());
    }

    match worker.dispatch(Event::Sync(tag)).wait().await? {
        EventOutcome::Synced { tag, handled } => json_output(&SwSyncOutput { tag, handled }),
        other => Err(unexpected("sync", other)),
    }
}

/// Implementation of the sw_notification_click tool.
pub async fn notification_click_impl<F: Fetcher + 'static>(
    worker: &Arc<Worker<F>>, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let event = Event::NotificationClick { action: params.action, tag: params.tag };
    match worker.dispatch(event).wait().await? {
        EventOutcome::Clicked(route) => json_output(&SwNotificationClickOutput { route: route.as_str().to_string() }),
        other => Err(unexpected("notificationclick", other)),
    }
}
