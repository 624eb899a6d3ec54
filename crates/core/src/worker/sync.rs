//! Background sync dispatch.
//!
//! Maps sync tags to routines. The study-data routine has no server side
//! yet and only records that it ran.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::Error;

/// A background sync routine.
pub type SyncRoutine = Arc<dyn Fn() -> BoxFuture<'static, Result<(), Error>> + Send + Sync>;

/// Tag → routine table.
#[derive(Clone, Default)]
pub struct SyncRegistry {
    routines: HashMap<String, SyncRoutine>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry routing every given tag to the study-data routine.
    pub fn with_study_data(tags: &[String]) -> Self {
        let mut registry = Self::new();
        for tag in tags {
            registry.register(tag, Arc::new(|| sync_study_data().boxed()));
        }
        registry
    }

    pub fn register(&mut self, tag: &str, routine: SyncRoutine) {
        self.routines.insert(tag.to_string(), routine);
    }

    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.routines.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Run the routine for `tag`.
    ///
    /// Returns `Ok(false)` for unknown tags.
    pub async fn dispatch(&self, tag: &str) -> Result<bool, Error> {
        let Some(routine) = self.routines.get(tag) else {
            tracing::debug!(tag, "no sync routine registered");
            return Ok(false);
        };
        routine().await?;
        Ok(true)
    }
}

async fn sync_study_data() -> Result<(), Error> {
    tracing::info!("syncing study data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_study_data_tags() {
        let registry = SyncRegistry::with_study_data(&["sync-study-data".into(), "sync-data".into()]);

        assert!(registry.dispatch("sync-study-data").await.unwrap());
        assert!(registry.dispatch("sync-data").await.unwrap());
        assert!(!registry.dispatch("sync-photos").await.unwrap());
        assert_eq!(registry.tags(), vec!["sync-data", "sync-study-data"]);
    }

    #[tokio::test]
    async fn test_custom_routine_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut registry = SyncRegistry::new();
        registry.register(
            "sync-answers",
            Arc::new(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Error>(())
                }
                .boxed()
            }),
        );

        registry.dispatch("sync-answers").await.unwrap();
        registry.dispatch("sync-answers").await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_routine_error_propagates() {
        let mut registry = SyncRegistry::new();
        registry.register("sync-fail", Arc::new(|| async { Err::<(), _>(Error::Network("offline".into())) }.boxed()));

        assert!(matches!(registry.dispatch("sync-fail").await, Err(Error::Network(_))));
    }
}
