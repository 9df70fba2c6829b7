//! Media Auto Saver Core Library
//!
//! This library provides the core functionality for the media auto saver,
//! which periodically checks monitored creator and live-stream links and
//! hands each one to an appropriate external download or recording tool.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`db`] - Database connection and schema management
//! - [`link`] - Link/history data model and persistence
//! - [`downloader`] - Tool selection, invocation, and output parsing
//! - [`monitor`] - Per-link processor, batch dispatcher, and scheduler
//! - [`config`] - Explicit runtime configuration
//! - [`site`] - Site-name extraction from link URLs

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod db;
pub mod downloader;
pub mod link;
pub mod monitor;
pub mod site;

// Re-export commonly used types
pub use config::{
    ConfigError, DEFAULT_INTERVAL_MINUTES, DEFAULT_MAX_CONCURRENT_DOWNLOADS, MonitorConfig,
};
pub use db::Database;
pub use downloader::{
    DownloadError, Downloader, FileCollector, MediaBackend, ToolDownloader, ToolOutcome,
    ToolSelection, select_tool,
};
pub use link::{
    HistoryLog, HistoryStatus, Link, LinkError, LinkKind, LinkStatus, LinkStore, NewHistoryLog,
    NewLink,
};
pub use monitor::{LinkDispatcher, LinkProcessor, MonitorScheduler, TriggerError};
pub use site::extract_site_name;
