//! Link types and status definitions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of content a monitored link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// A creator page checked for new uploads.
    Creator,
    /// A live-stream URL recorded while broadcasting.
    Live,
}

impl LinkKind {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(Self::Creator),
            "live" => Ok(Self::Live),
            _ => Err(format!("invalid link kind: {s}")),
        }
    }
}

/// Processing status of a monitored link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// At rest, eligible for the next batch.
    Idle,
    /// Being checked for new content.
    Monitoring,
    /// A download is in flight.
    Downloading,
    /// A live recording is in flight.
    Recording,
    /// Last attempt failed; eligible for the next batch.
    Error,
}

impl LinkStatus {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Monitoring => "monitoring",
            Self::Downloading => "downloading",
            Self::Recording => "recording",
            Self::Error => "error",
        }
    }

    /// Returns true for transient statuses owned by a running processor.
    ///
    /// Links in these states are excluded from batch selection and
    /// rejected by the manual trigger.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Monitoring | Self::Downloading | Self::Recording)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "monitoring" => Ok(Self::Monitoring),
            "downloading" => Ok(Self::Downloading),
            "recording" => Ok(Self::Recording),
            "error" => Ok(Self::Error),
            _ => Err(format!("invalid link status: {s}")),
        }
    }
}

/// Fields supplied when registering a new monitored link.
#[derive(Debug, Clone, Default)]
pub struct NewLink {
    /// The URL to monitor. Must be unique.
    pub url: String,
    /// Creator page or live stream.
    pub kind: Option<LinkKind>,
    /// Site name used for downloader routing; extracted from the URL when absent.
    pub site_name: Option<String>,
    /// Operator-facing label.
    pub name: Option<String>,
    /// Path to a link-specific cookies file handed to the downloader.
    pub cookies_path: Option<String>,
    /// Link-specific settings overriding tool defaults.
    pub settings: Option<HashMap<String, serde_json::Value>>,
}

/// A single monitored link.
#[derive(Debug, Clone, FromRow)]
pub struct Link {
    /// Unique identifier.
    pub id: i64,
    /// The monitored URL.
    pub url: String,
    /// Link kind (stored as text, parsed via `kind()`).
    #[sqlx(rename = "link_type")]
    pub kind_str: String,
    /// Site name (e.g. `YouTube`, `Pixiv`) used for downloader routing.
    pub site_name: Option<String>,
    /// Operator-facing label.
    pub name: Option<String>,
    /// Current processing status (stored as text, parsed via `status()`).
    #[sqlx(rename = "status")]
    pub status_str: String,
    /// Whether this link participates in monitoring.
    pub is_enabled: bool,
    /// Path to a link-specific cookies file, if configured.
    pub cookies_path: Option<String>,
    /// Link-specific settings as a JSON object string.
    pub settings: String,
    /// Error message from the last failed attempt.
    pub error_message: Option<String>,
    /// When the link was last checked by a processor.
    pub last_checked_at: Option<String>,
    /// When the link last produced a successful attempt.
    pub last_success_at: Option<String>,
    /// When the link was created.
    pub created_at: String,
    /// When the link was last updated.
    pub updated_at: String,
}

impl Link {
    /// Returns the parsed status enum.
    ///
    /// Falls back to `Idle` if the status string is invalid.
    #[must_use]
    pub fn status(&self) -> LinkStatus {
        self.status_str.parse().unwrap_or(LinkStatus::Idle)
    }

    /// Returns the parsed link kind.
    ///
    /// Falls back to `Creator` if the kind string is invalid.
    #[must_use]
    pub fn kind(&self) -> LinkKind {
        self.kind_str.parse().unwrap_or(LinkKind::Creator)
    }

    /// Returns the site name lowercased for routing, or an empty string.
    #[must_use]
    pub fn site_key(&self) -> String {
        self.site_name
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default()
    }

    /// Parses the settings JSON object.
    ///
    /// Returns an empty map if settings are empty or invalid JSON.
    #[must_use]
    pub fn parse_settings(&self) -> HashMap<String, serde_json::Value> {
        serde_json::from_str(&self.settings).unwrap_or_default()
    }

    /// Serializes a settings map to the JSON object string stored in the database.
    #[must_use]
    pub fn serialize_settings(settings: &HashMap<String, serde_json::Value>) -> String {
        serde_json::to_string(settings).unwrap_or_else(|_| "{}".to_string())
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Link {{ id: {}, url: {}, status: {} }}",
            self.id,
            self.url,
            self.status()
        )
    }
}
