//! History log types: the immutable audit trail of processing attempts.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Outcome recorded for one processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    /// The attempt completed and produced a usable result.
    Success,
    /// The attempt failed; `error_message` carries the reason.
    Failure,
}

impl HistoryStatus {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HistoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(format!("invalid history status: {s}")),
        }
    }
}

/// Fields for appending one history row. Borrowed to avoid copies at the call site.
#[derive(Debug, Clone, Default)]
pub struct NewHistoryLog<'a> {
    /// The link this attempt belongs to.
    pub link_id: i64,
    /// Attempt outcome.
    pub status: Option<HistoryStatus>,
    /// Produced file paths; omitted entirely when empty.
    pub downloaded_files: Option<&'a [String]>,
    /// Failure reason when the attempt failed.
    pub error_message: Option<&'a str>,
    /// Free-form extra detail (file sizes, durations, ...).
    pub details: Option<&'a serde_json::Value>,
}

/// One immutable record of a completed processing attempt.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryLog {
    /// Unique identifier.
    pub id: i64,
    /// The link this attempt belongs to.
    pub link_id: i64,
    /// When the attempt completed.
    pub timestamp: String,
    /// Attempt outcome (stored as text, parsed via `status()`).
    #[sqlx(rename = "status")]
    pub status_str: String,
    /// Produced file paths as a JSON array string, if any.
    pub downloaded_files: Option<String>,
    /// Failure reason when the attempt failed.
    pub error_message: Option<String>,
    /// Free-form extra detail as a JSON object string, if any.
    pub details: Option<String>,
}

impl HistoryLog {
    /// Returns the parsed status enum.
    ///
    /// Falls back to `Failure` if the status string is invalid.
    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        self.status_str.parse().unwrap_or(HistoryStatus::Failure)
    }

    /// Parses the produced file list from its JSON array string.
    ///
    /// Returns an empty vector if absent or invalid JSON.
    #[must_use]
    pub fn parse_downloaded_files(&self) -> Vec<String> {
        let Some(files_json) = &self.downloaded_files else {
            return Vec::new();
        };

        serde_json::from_str(files_json).unwrap_or_default()
    }

    /// Serializes a file list to a JSON array string for database storage.
    ///
    /// Returns `None` for an empty list so the column stays NULL.
    #[must_use]
    pub fn serialize_files(files: &[String]) -> Option<String> {
        if files.is_empty() {
            return None;
        }

        serde_json::to_string(files).ok()
    }

    /// Parses the details object from its JSON string.
    #[must_use]
    pub fn parse_details(&self) -> Option<serde_json::Value> {
        self.details
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
    }
}
