//! Event dispatch.
//!
//! Each incoming signal runs as its own task. The caller gets a
//! [`Completion`] that resolves once the handler has finished, which is the
//! point at which the runtime may proceed (respond, activate, drop the push).

use std::sync::Arc;

use tokio::sync::oneshot;

use super::engine::FetchOutcome;
use super::notify::{ClickRoute, Notification};
use super::{Host, ServiceWorker};
use crate::Error;
use crate::cache::CacheStorage;
use crate::http::{Fetcher, Request};

/// A signal delivered by the hosting runtime.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    /// Push message with its optional text payload.
    Push(Option<String>),
    /// Background sync with its tag.
    Sync(String),
    NotificationClick { action: Option<String>, tag: Option<String> },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Install => "install",
            Event::Activate => "activate",
            Event::Fetch(_) => "fetch",
            Event::Push(_) => "push",
            Event::Sync(_) => "sync",
            Event::NotificationClick { .. } => "notificationclick",
        }
    }
}

/// What a handler produced.
#[derive(Debug)]
pub enum EventOutcome {
    Installed { precached: usize },
    Activated { deleted: Vec<String> },
    Fetched(FetchOutcome),
    Notified(Notification),
    Synced { tag: String, handled: bool },
    Clicked(ClickRoute),
}

/// Completion token for a dispatched event.
pub struct Completion {
    rx: oneshot::Receiver<Result<EventOutcome, Error>>,
}

impl Completion {
    /// Wait for the handler to resolve or reject.
    pub async fn wait(self) -> Result<EventOutcome, Error> {
        self.rx
            .await
            .map_err(|_| Error::WorkerState("event handler dropped before completing".into()))?
    }
}

impl<S, F, H> ServiceWorker<S, F, H>
where
    S: CacheStorage + 'static,
    F: Fetcher + 'static,
    H: Host + 'static,
{
    /// Run the handler for `event` on its own task.
    pub fn dispatch(self: &Arc<Self>, event: Event) -> Completion {
        let (tx, rx) = oneshot::channel();
        let worker = Arc::clone(self);

        tokio::spawn(async move {
            let kind = event.kind();
            let result = worker.handle(event).await;
            if let Err(err) = &result {
                tracing::debug!(event = kind, error = %err, "event handler rejected");
            }
            // The receiver may be gone if the originator gave up.
            let _ = tx.send(result);
        });

        Completion { rx }
    }

    async fn handle(&self, event: Event) -> Result<EventOutcome, Error> {
        match event {
            Event::Install => Ok(EventOutcome::Installed { precached: self.install().await? }),
            Event::Activate => Ok(EventOutcome::Activated { deleted: self.activate().await? }),
            Event::Fetch(request) => Ok(EventOutcome::Fetched(self.fetch(request).await?)),
            Event::Push(payload) => Ok(EventOutcome::Notified(self.push(payload).await?)),
            Event::Sync(tag) => {
                let handled = self.sync(&tag).await?;
                Ok(EventOutcome::Synced { tag, handled })
            }
            Event::NotificationClick { action, tag } => {
                Ok(EventOutcome::Clicked(self.notification_click(action.as_deref(), tag.as_deref()).await?))
            }
        }
    }
}
