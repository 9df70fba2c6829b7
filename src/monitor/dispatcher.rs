//! Batch dispatch: fanning eligible links out to bounded parallel processors.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument};

use super::processor::LinkProcessor;
use crate::link::{LinkError, LinkStatus, LinkStore};

/// Errors for the manual single-link trigger.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// No link exists with the given ID.
    #[error("link not found: id {0}")]
    NotFound(i64),

    /// The link is already owned by a running processor.
    #[error("link {0} is already being processed (status {1})")]
    AlreadyInFlight(i64, LinkStatus),

    /// The link is disabled.
    #[error("link {0} is disabled")]
    Disabled(i64),

    /// The store failed while checking the link.
    #[error(transparent)]
    Store(#[from] LinkError),
}

/// Dispatches monitoring batches with a bounded concurrency fan-out.
///
/// Each batch selects all eligible links and runs one [`LinkProcessor`]
/// task per link, gated by a counting semaphore so at most
/// `max_concurrent` attempts run at once. A batch returns only after all
/// of its tasks have finished.
pub struct LinkDispatcher {
    store: LinkStore,
    processor: Arc<LinkProcessor>,
    semaphore: Arc<Semaphore>,
}

impl LinkDispatcher {
    /// Creates a dispatcher bounded to `max_concurrent` parallel attempts.
    #[must_use]
    pub fn new(store: LinkStore, processor: Arc<LinkProcessor>, max_concurrent: usize) -> Self {
        Self {
            store,
            processor,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Runs one monitoring batch over all eligible links.
    ///
    /// Processor tasks never fail; a panicking task is logged and does not
    /// abort the batch.
    ///
    /// # Returns
    ///
    /// The number of links dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] only when the eligibility query itself fails.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<usize, LinkError> {
        let links = self.store.list_eligible().await?;
        if links.is_empty() {
            debug!("no eligible links, nothing to dispatch");
            return Ok(0);
        }

        info!(count = links.len(), "dispatching monitoring batch");

        let mut handles = Vec::with_capacity(links.len());
        for link in links {
            // Owned permit moves into the task and releases when it drops
            let Ok(permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
                error!("dispatch semaphore closed unexpectedly");
                break;
            };
            let processor = Arc::clone(&self.processor);
            let link_id = link.id;
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                processor.process(link_id).await;
            }));
        }

        let dispatched = handles.len();
        for handle in handles {
            if let Err(join_error) = handle.await {
                error!(error = %join_error, "processor task panicked");
            }
        }

        info!(dispatched, "monitoring batch finished");
        Ok(dispatched)
    }

    /// Runs one processing attempt for a single link immediately.
    ///
    /// Bypasses the batch semaphore: a manual trigger is an operator
    /// action and runs even while a batch saturates the bound.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::NotFound`] for an unknown ID,
    /// [`TriggerError::AlreadyInFlight`] when a processor already owns the
    /// link, and [`TriggerError::Disabled`] for a disabled link.
    #[instrument(skip(self))]
    pub async fn trigger_link(&self, link_id: i64) -> Result<(), TriggerError> {
        let Some(link) = self.store.get(link_id).await? else {
            return Err(TriggerError::NotFound(link_id));
        };

        if link.status().is_in_flight() {
            return Err(TriggerError::AlreadyInFlight(link_id, link.status()));
        }

        if !link.is_enabled {
            return Err(TriggerError::Disabled(link_id));
        }

        info!(link_id, url = %link.url, "manual trigger accepted");
        self.processor.process(link_id).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::downloader::{Downloader, ToolOutcome};
    use crate::link::NewLink;
    use async_trait::async_trait;

    struct NoopDownloader;

    #[async_trait]
    impl Downloader for NoopDownloader {
        async fn download(&self, _link: &crate::link::Link) -> ToolOutcome {
            ToolOutcome::failed("not reached".to_string(), vec![])
        }
    }

    async fn setup() -> (LinkStore, LinkDispatcher) {
        let db = Database::new_in_memory().await.unwrap();
        let store = LinkStore::new(db);
        let processor = Arc::new(LinkProcessor::new(store.clone(), Arc::new(NoopDownloader)));
        let dispatcher = LinkDispatcher::new(store.clone(), processor, 2);
        (store, dispatcher)
    }

    #[tokio::test]
    async fn test_run_with_no_links_dispatches_zero() {
        let (_store, dispatcher) = setup().await;
        assert_eq!(dispatcher.run().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_trigger_unknown_link_is_not_found() {
        let (_store, dispatcher) = setup().await;
        let result = dispatcher.trigger_link(999).await;
        assert!(matches!(result, Err(TriggerError::NotFound(999))));
    }

    #[tokio::test]
    async fn test_trigger_disabled_link_rejected() {
        let (store, dispatcher) = setup().await;
        let id = store
            .add(&NewLink {
                url: "https://example.com/user".to_string(),
                ..NewLink::default()
            })
            .await
            .unwrap();
        store.set_enabled(id, false).await.unwrap();

        let result = dispatcher.trigger_link(id).await;
        assert!(matches!(result, Err(TriggerError::Disabled(_))));
    }

    #[tokio::test]
    async fn test_trigger_in_flight_link_rejected() {
        let (store, dispatcher) = setup().await;
        let id = store
            .add(&NewLink {
                url: "https://example.com/user".to_string(),
                ..NewLink::default()
            })
            .await
            .unwrap();
        store
            .update_status(id, LinkStatus::Downloading, None, false)
            .await
            .unwrap();

        let result = dispatcher.trigger_link(id).await;
        assert!(matches!(
            result,
            Err(TriggerError::AlreadyInFlight(_, LinkStatus::Downloading))
        ));
    }
}
