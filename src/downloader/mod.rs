//! Downloader selection and external tool invocation.
//!
//! This module turns a monitored link into verified downloaded files:
//!
//! - [`selector`] - routes a link to the batch or media tool and resolves
//!   the full invocation plan (arguments, output templates, cookies);
//! - [`tool`] - runs the selected tool behind the [`Downloader`] seam;
//! - [`output`] - extracts and verifies produced file paths from tool
//!   output;
//! - [`error`] - the tool invocation error taxonomy.
//!
//! The only public entry point used by the monitoring pipeline is
//! [`Downloader::download`], which never fails: every problem is folded
//! into the returned [`ToolOutcome`].

pub mod error;
pub mod output;
pub mod selector;
pub mod tool;

pub use error::DownloadError;
pub use output::{FileCollector, parse_process_output};
pub use selector::{
    BATCH_TOOL_SITES, BatchToolConfig, MediaToolConfig, ToolSelection, select_tool,
};
pub use tool::{Downloader, MediaBackend, ToolDownloader, ToolOutcome, YtDlpBackend};
