//! Per-link processing: the state machine for one monitoring attempt.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::downloader::Downloader;
use crate::link::{HistoryStatus, LinkError, LinkKind, LinkStatus, LinkStore, NewHistoryLog};

/// Runs one monitoring attempt for a single link.
///
/// Drives the status transitions (idle → downloading/recording →
/// idle/error), invokes the downloader, and records exactly one history
/// row per completed attempt. The public [`process`](Self::process) entry
/// never returns an error: failures end in error status plus a failure
/// history row, and even recording that is best-effort.
pub struct LinkProcessor {
    store: LinkStore,
    downloader: Arc<dyn Downloader>,
}

impl LinkProcessor {
    /// Creates a processor over the given store and downloader.
    #[must_use]
    pub fn new(store: LinkStore, downloader: Arc<dyn Downloader>) -> Self {
        Self { store, downloader }
    }

    /// Processes one link end to end. Fire-and-forget: never fails.
    #[instrument(skip(self))]
    pub async fn process(&self, link_id: i64) {
        if let Err(link_error) = self.process_inner(link_id).await {
            error!(link_id, error = %link_error, "link processing failed");
            self.recover(link_id, &link_error).await;
        }
    }

    async fn process_inner(&self, link_id: i64) -> Result<(), LinkError> {
        let Some(link) = self.store.get(link_id).await? else {
            debug!(link_id, "link no longer exists, skipping");
            return Ok(());
        };

        if !link.is_enabled {
            debug!(link_id, "link is disabled, skipping");
            return Ok(());
        }

        let busy_status = match link.kind() {
            LinkKind::Creator => LinkStatus::Downloading,
            LinkKind::Live => LinkStatus::Recording,
        };
        self.store
            .update_status(link_id, busy_status, None, false)
            .await?;

        let outcome = self.downloader.download(&link).await;
        let files: Vec<String> = outcome
            .files
            .iter()
            .map(|path| path.display().to_string())
            .collect();

        if outcome.success {
            self.store
                .update_status(link_id, LinkStatus::Idle, None, true)
                .await?;
            self.store
                .append_history(&NewHistoryLog {
                    link_id,
                    status: Some(HistoryStatus::Success),
                    downloaded_files: Some(&files),
                    error_message: None,
                    details: None,
                })
                .await?;
            info!(link_id, file_count = files.len(), "link processed successfully");
        } else {
            let message = outcome
                .error
                .unwrap_or_else(|| "download failed".to_string());
            self.store
                .update_status(link_id, LinkStatus::Error, Some(&message), false)
                .await?;
            // Failure rows still carry files verified before the failure
            self.store
                .append_history(&NewHistoryLog {
                    link_id,
                    status: Some(HistoryStatus::Failure),
                    downloaded_files: Some(&files),
                    error_message: Some(&message),
                    details: None,
                })
                .await?;
            warn!(link_id, error = %message, "link processing ended in error");
        }

        Ok(())
    }

    /// Best-effort recovery after an unexpected store failure mid-attempt.
    ///
    /// Forces the link into error status and appends a failure row so the
    /// attempt leaves a trace. Recovery failures are logged and swallowed;
    /// there is nothing further to do with them.
    async fn recover(&self, link_id: i64, link_error: &LinkError) {
        let message = format!("Processing exception: {link_error}");

        match self.store.get(link_id).await {
            Ok(Some(_)) => {
                if let Err(recovery_error) = self
                    .store
                    .update_status(link_id, LinkStatus::Error, Some(&message), false)
                    .await
                {
                    warn!(link_id, error = %recovery_error, "failed to record error status during recovery");
                }
                if let Err(recovery_error) = self
                    .store
                    .append_history(&NewHistoryLog {
                        link_id,
                        status: Some(HistoryStatus::Failure),
                        error_message: Some(&message),
                        ..NewHistoryLog::default()
                    })
                    .await
                {
                    warn!(link_id, error = %recovery_error, "failed to append failure history during recovery");
                }
            }
            Ok(None) => debug!(link_id, "link disappeared before recovery"),
            Err(recovery_error) => {
                warn!(link_id, error = %recovery_error, "failed to re-fetch link during recovery");
            }
        }
    }
}
