//! The hosting runtime's client-facing surface.
//!
//! The worker never talks to pages directly; it asks a [`Host`] to take
//! control of clients, show notifications and open windows.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use super::notify::Notification;
use crate::Error;

/// Runtime collaborators the worker signals.
#[async_trait]
pub trait Host: Send + Sync {
    /// Supersede any previously active worker without waiting for its
    /// clients to close.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Take control of every open client. Returns how many were claimed.
    async fn claim_clients(&self) -> Result<usize, Error>;

    async fn show_notification(&self, notification: Notification) -> Result<(), Error>;

    /// Close displayed notifications with the given tag.
    async fn close_notification(&self, tag: &str) -> Result<(), Error>;

    /// Open the URL in a new window, or focus an existing one.
    async fn open_window(&self, url: &Url) -> Result<(), Error>;
}

/// Everything a [`LocalHost`] has been asked to do.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HostRecord {
    pub skip_waiting: bool,
    pub open_clients: usize,
    pub controlled_clients: usize,
    pub notifications: Vec<Notification>,
    pub windows: Vec<String>,
}

/// In-process host that records requests instead of driving a browser.
#[derive(Clone, Default)]
pub struct LocalHost {
    record: Arc<RwLock<HostRecord>>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open client page that a later claim will take over.
    pub async fn connect_client(&self) {
        self.record.write().await.open_clients += 1;
    }

    pub async fn snapshot(&self) -> HostRecord {
        self.record.read().await.clone()
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.record.write().await.skip_waiting = true;
        Ok(())
    }

    async fn claim_clients(&self) -> Result<usize, Error> {
        let mut record = self.record.write().await;
        record.controlled_clients = record.open_clients;
        Ok(record.controlled_clients)
    }

    async fn show_notification(&self, notification: Notification) -> Result<(), Error> {
        let mut record = self.record.write().await;
        // Same tag replaces the previous notification.
        record.notifications.retain(|n| n.tag != notification.tag);
        record.notifications.push(notification);
        Ok(())
    }

    async fn close_notification(&self, tag: &str) -> Result<(), Error> {
        self.record.write().await.notifications.retain(|n| n.tag != tag);
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), Error> {
        let mut record = self.record.write().await;
        let url = url.to_string();
        if !record.windows.contains(&url) {
            record.windows.push(url);
        }
        Ok(())
    }
}
