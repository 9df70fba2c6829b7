//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use media_saver_core::LinkKind;

/// Monitor creator and live-stream links and auto-save new media.
///
/// Periodically checks every enabled link and hands it to the right
/// external download or recording tool. Maintenance subcommands manage the
/// monitored links without starting the loop.
#[derive(Parser, Debug)]
#[command(name = "media-saver")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database file
    #[arg(long, default_value = "media-saver.db", global = true)]
    pub db: PathBuf,

    /// Override the maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Override the minutes between monitoring batches
    #[arg(short = 'i', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Override the media root directory
    #[arg(short = 'm', long)]
    pub media_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the monitoring loop (the default when no subcommand is given)
    Run,

    /// Register a new link to monitor
    Add {
        /// The URL to monitor
        url: String,

        /// Creator page or live stream
        #[arg(short = 'k', long, value_enum, default_value = "creator")]
        kind: CliLinkKind,

        /// Operator-facing label
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Path to a cookies file used for this link only
        #[arg(long)]
        cookies: Option<String>,
    },

    /// List all monitored links
    List,

    /// Run one processing attempt for a single link immediately
    Trigger {
        /// ID of the link to process
        id: i64,
    },

    /// Show the processing history for a link
    History {
        /// ID of the link
        link_id: i64,

        /// Maximum rows to show
        #[arg(short = 'l', long, default_value_t = 20)]
        limit: i64,
    },

    /// Enable or disable a link
    Enable {
        /// ID of the link
        id: i64,

        /// Disable instead of enable
        #[arg(long)]
        off: bool,
    },

    /// Remove a link and its history
    Remove {
        /// ID of the link to remove
        id: i64,
    },
}

/// Link kind as accepted on the command line.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum CliLinkKind {
    /// A creator page checked for new uploads
    Creator,
    /// A live-stream URL recorded while broadcasting
    Live,
}

impl From<CliLinkKind> for LinkKind {
    fn from(kind: CliLinkKind) -> Self {
        match kind {
            CliLinkKind::Creator => Self::Creator,
            CliLinkKind::Live => Self::Live,
        }
    }
}
