//! Test doubles for the worker: a scripted network and a store whose
//! writes fail.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::Error;
use crate::cache::{CacheDb, CacheEntry, CacheStorage};
use crate::http::{Fetcher, Request, Response, ResponseType};

#[derive(Clone)]
enum Reply {
    Respond { status: u16, kind: ResponseType, body: String },
    Offline,
    /// The fetcher refuses the request before touching the network.
    Rejected,
}

/// Fetcher answering from a per-URL script. Unscripted URLs are offline.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, kind: ResponseType, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Respond { status, kind, body: body.to_string() });
    }

    pub fn ok(&self, url: &str, body: &str) {
        self.respond(url, 200, ResponseType::Basic, body);
    }

    pub fn offline(&self, url: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Offline);
    }

    pub fn reject(&self, url: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Rejected);
    }

    /// Hold every fetch until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let reply = self.replies.lock().unwrap().get(&url).cloned();
        match reply {
            Some(Reply::Respond { status, kind, body }) => {
                Ok(Response::new(url, status, kind, body).with_header("content-type", "text/plain"))
            }
            Some(Reply::Offline) | None => Err(Error::Network(format!("offline: {url}"))),
            Some(Reply::Rejected) => Err(Error::InvalidUrl(format!("refused: {url}"))),
        }
    }
}

/// Store that reads from SQLite but refuses every write.
pub struct ReadOnlyStore {
    pub inner: CacheDb,
}

#[async_trait]
impl CacheStorage for ReadOnlyStore {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        self.inner.open_namespace(namespace).await
    }

    async fn has(&self, namespace: &str) -> Result<bool, Error> {
        self.inner.has_namespace(namespace).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.namespace_names().await
    }

    async fn delete(&self, namespace: &str) -> Result<bool, Error> {
        self.inner.delete_namespace(namespace).await
    }

    async fn match_entry(&self, namespace: &str, request_key: &str) -> Result<Option<CacheEntry>, Error> {
        self.inner.get_entry(namespace, request_key).await
    }

    async fn put(&self, _namespace: &str, _entry: &CacheEntry) -> Result<(), Error> {
        Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed))
    }

    async fn put_all(&self, _namespace: &str, _entries: &[CacheEntry]) -> Result<(), Error> {
        Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed))
    }

    async fn entry_urls(&self, namespace: &str) -> Result<Vec<String>, Error> {
        self.inner.entry_urls(namespace).await
    }
}
