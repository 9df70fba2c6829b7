//! Link module for managing monitored links and their history.
//!
//! This module provides `SQLite`-backed persistence for monitored links
//! through their lifecycle (idle → downloading/recording → idle/error) and
//! the append-only history of processing attempts.
//!
//! # Overview
//!
//! The link system consists of:
//! - [`LinkStore`] - Main interface for link and history operations
//! - [`Link`] - A monitored URL with kind, status, and per-link settings
//! - [`LinkStatus`] / [`LinkKind`] - Lifecycle states and content kinds
//! - [`HistoryLog`] - Immutable record of one completed attempt
//! - [`LinkError`] - Operation error types
//!
//! # Example
//!
//! ```ignore
//! use media_saver_core::link::{LinkStore, LinkStatus, NewLink};
//! use media_saver_core::Database;
//! use std::path::Path;
//!
//! let db = Database::new(Path::new("media-saver.db")).await?;
//! let store = LinkStore::new(db);
//!
//! let id = store.add(&NewLink {
//!     url: "https://www.youtube.com/@creator".to_string(),
//!     ..NewLink::default()
//! }).await?;
//!
//! for link in store.list_eligible().await? {
//!     // ... process the link ...
//! }
//! ```

mod error;
mod history;
mod item;

pub use error::{LinkError, StoreDbErrorKind};
pub use history::{HistoryLog, HistoryStatus, NewHistoryLog};
pub use item::{Link, LinkKind, LinkStatus, NewLink};

use crate::db::Database;
use sqlx::Row;
use tracing::instrument;

/// Returns `Ok(())` if at least one row was affected; otherwise [`LinkError::LinkNotFound`].
fn check_affected(id: i64, rows_affected: u64) -> Result<()> {
    if rows_affected == 0 {
        Err(LinkError::LinkNotFound(id))
    } else {
        Ok(())
    }
}

/// Marker written into `error_message` when stale in-flight links are reset at startup.
pub const STARTUP_RESET_MARKER: &str = "Reset on startup";

/// Millisecond-precision "now" expression shared by timestamp columns.
const NOW_MS: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

/// Result type for link store operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Store for monitored links and their processing history.
///
/// Provides atomic operations for link status transitions and history
/// appends, backed by `SQLite` with WAL mode for concurrent access.
#[derive(Debug, Clone)]
pub struct LinkStore {
    db: Database,
}

impl LinkStore {
    /// Creates a new link store with the given database connection.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Registers a new monitored link in idle status.
    ///
    /// # Returns
    ///
    /// The ID of the newly created link.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Database`] with a constraint-violation kind when
    /// the URL is already registered, or for any other insert failure.
    #[instrument(skip(self, link), fields(url = %link.url))]
    pub async fn add(&self, link: &NewLink) -> Result<i64> {
        let settings_json = link
            .settings
            .as_ref()
            .map_or_else(|| "{}".to_string(), Link::serialize_settings);

        let result = sqlx::query(
            r"INSERT INTO links (url, link_type, site_name, name, cookies_path, settings)
              VALUES (?, ?, ?, ?, ?, ?)
              RETURNING id",
        )
        .bind(&link.url)
        .bind(link.kind.unwrap_or(LinkKind::Creator).as_str())
        .bind(link.site_name.as_deref())
        .bind(link.name.as_deref())
        .bind(link.cookies_path.as_deref())
        .bind(settings_json)
        .fetch_one(self.db.pool())
        .await?;

        Ok(result.get("id"))
    }

    /// Gets a link by ID.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(r"SELECT * FROM links WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(link)
    }

    /// Gets a link by URL.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Database`] if the query fails.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(r"SELECT * FROM links WHERE url = ?")
            .bind(url)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(link)
    }

    /// Lists all links ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Link>> {
        let links = sqlx::query_as::<_, Link>(r"SELECT * FROM links ORDER BY created_at ASC, id ASC")
            .fetch_all(self.db.pool())
            .await?;

        Ok(links)
    }

    /// Lists links eligible for a monitoring batch.
    ///
    /// Eligible means enabled and not currently owned by a running processor
    /// (status outside monitoring/downloading/recording). Idle and error
    /// links are both rest states and re-enter the next batch.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn list_eligible(&self) -> Result<Vec<Link>> {
        let links = sqlx::query_as::<_, Link>(
            r"SELECT * FROM links
              WHERE is_enabled = 1 AND status NOT IN (?, ?, ?)
              ORDER BY created_at ASC, id ASC",
        )
        .bind(LinkStatus::Monitoring.as_str())
        .bind(LinkStatus::Downloading.as_str())
        .bind(LinkStatus::Recording.as_str())
        .fetch_all(self.db.pool())
        .await?;

        Ok(links)
    }

    /// Applies a status transition to a link.
    ///
    /// Always refreshes `last_checked_at`. Sets `error_message` when the new
    /// status is [`LinkStatus::Error`] and clears it otherwise. Sets
    /// `last_success_at` only when `success` is true.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::LinkNotFound`] if no link exists with the given ID.
    /// Returns [`LinkError::Database`] if the update fails.
    #[instrument(skip(self), fields(status = %status, success))]
    pub async fn update_status(
        &self,
        id: i64,
        status: LinkStatus,
        error_message: Option<&str>,
        success: bool,
    ) -> Result<()> {
        let error_message = if status == LinkStatus::Error {
            error_message
        } else {
            None
        };

        let sql = if success {
            format!(
                r"UPDATE links
                  SET status = ?,
                      error_message = ?,
                      last_checked_at = {NOW_MS},
                      last_success_at = {NOW_MS},
                      updated_at = datetime('now')
                  WHERE id = ?"
            )
        } else {
            format!(
                r"UPDATE links
                  SET status = ?,
                      error_message = ?,
                      last_checked_at = {NOW_MS},
                      updated_at = datetime('now')
                  WHERE id = ?"
            )
        };

        let result = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(error_message)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        check_affected(id, result.rows_affected())
    }

    /// Enables or disables monitoring for a link.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::LinkNotFound`] if no link exists with the given ID.
    /// Returns [`LinkError::Database`] if the update fails.
    #[instrument(skip(self))]
    pub async fn set_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        let result =
            sqlx::query(r"UPDATE links SET is_enabled = ?, updated_at = datetime('now') WHERE id = ?")
                .bind(enabled)
                .bind(id)
                .execute(self.db.pool())
                .await?;

        check_affected(id, result.rows_affected())
    }

    /// Resets all stale in-flight links back to idle status.
    ///
    /// Called at startup for crash recovery - any links left monitoring,
    /// downloading, or recording from a previous session cannot still be
    /// owned by a processor, so each is forced to idle with the
    /// [`STARTUP_RESET_MARKER`] error message. No history rows are written
    /// and `last_checked_at` is left untouched; a reset is not a check.
    ///
    /// # Returns
    ///
    /// The number of links that were reset.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Database`] if the update fails.
    #[instrument(skip(self))]
    pub async fn reset_stale(&self) -> Result<u64> {
        let result = sqlx::query(
            r"UPDATE links
              SET status = ?, error_message = ?, updated_at = datetime('now')
              WHERE status IN (?, ?, ?)",
        )
        .bind(LinkStatus::Idle.as_str())
        .bind(STARTUP_RESET_MARKER)
        .bind(LinkStatus::Monitoring.as_str())
        .bind(LinkStatus::Downloading.as_str())
        .bind(LinkStatus::Recording.as_str())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Removes a link by ID. Its history rows cascade.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::LinkNotFound`] if no link exists with the given ID.
    /// Returns [`LinkError::Database`] if the delete fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> Result<()> {
        let result = sqlx::query(r"DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        check_affected(id, result.rows_affected())
    }

    // ==================== History ====================

    /// Appends one immutable history row for a completed attempt.
    ///
    /// # Returns
    ///
    /// The ID of the newly created history row.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Database`] if the insert fails (including a
    /// foreign-key violation for an unknown link id).
    #[instrument(skip(self, entry), fields(link_id = entry.link_id))]
    pub async fn append_history(&self, entry: &NewHistoryLog<'_>) -> Result<i64> {
        let files_json = entry.downloaded_files.and_then(HistoryLog::serialize_files);
        let details_json = entry
            .details
            .and_then(|details| serde_json::to_string(details).ok());

        let result = sqlx::query(
            r"INSERT INTO history_log (link_id, status, downloaded_files, error_message, details)
              VALUES (?, ?, ?, ?, ?)
              RETURNING id",
        )
        .bind(entry.link_id)
        .bind(entry.status.unwrap_or(HistoryStatus::Failure).as_str())
        .bind(files_json)
        .bind(entry.error_message)
        .bind(details_json)
        .fetch_one(self.db.pool())
        .await?;

        Ok(result.get("id"))
    }

    /// Reads history rows for a link, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn history_for_link(
        &self,
        link_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HistoryLog>> {
        let rows = sqlx::query_as::<_, HistoryLog>(
            r"SELECT * FROM history_log
              WHERE link_id = ?
              ORDER BY timestamp DESC, id DESC
              LIMIT ? OFFSET ?",
        )
        .bind(link_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// Counts history rows for a link.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn count_history_for_link(&self, link_id: i64) -> Result<i64> {
        let result = sqlx::query(r"SELECT COUNT(*) as count FROM history_log WHERE link_id = ?")
            .bind(link_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(result.get("count"))
    }

    /// Removes all history rows for a link.
    ///
    /// # Returns
    ///
    /// The number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Database`] if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_history_for_link(&self, link_id: i64) -> Result<u64> {
        let result = sqlx::query(r"DELETE FROM history_log WHERE link_id = ?")
            .bind(link_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    // Integration tests require actual database setup - see tests/link_store_integration.rs
    // Unit tests for LinkStore methods are minimal since they're thin wrappers around SQL

    use super::*;
    use crate::Database;

    #[test]
    fn test_link_result_type_alias() {
        let ok_result: Result<i64> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: Result<i64> = Err(LinkError::LinkNotFound(1));
        assert!(err_result.is_err());
    }

    /// update_status on a missing id must report LinkNotFound rather than
    /// silently affecting zero rows.
    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn test_update_status_returns_link_not_found_for_missing_id() {
        let db = Database::new_in_memory().await.unwrap();
        let store = LinkStore::new(db);

        let result = store
            .update_status(999, LinkStatus::Idle, None, false)
            .await;
        assert!(
            matches!(result, Err(LinkError::LinkNotFound(999))),
            "expected LinkNotFound(999), got {result:?}"
        );
    }
}
