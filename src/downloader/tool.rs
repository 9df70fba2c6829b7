//! Tool invocation: running the external download tools.
//!
//! Two strategies sit behind one [`Downloader`] seam. The media tool runs
//! through a [`MediaBackend`] that reports each finished artifact as an
//! event, collected by the output parser's [`FileCollector`]. The batch
//! tool runs as a captured subprocess whose stdout is scanned for written
//! paths after it exits.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::error::DownloadError;
use super::output::{FileCollector, parse_process_output};
use super::selector::{BatchToolConfig, MediaToolConfig, ToolSelection, select_tool};
use crate::config::MonitorConfig;
use crate::link::Link;

/// Result of one tool invocation for a link.
///
/// Failures still carry any files verified before the failure, so partial
/// progress is recorded in history.
#[derive(Debug, Clone, Default)]
pub struct ToolOutcome {
    /// Whether the attempt counts as successful.
    pub success: bool,
    /// Verified downloaded files, in first-seen order.
    pub files: Vec<PathBuf>,
    /// Failure description when `success` is false.
    pub error: Option<String>,
}

impl ToolOutcome {
    /// A successful outcome with the given files.
    #[must_use]
    pub fn succeeded(files: Vec<PathBuf>) -> Self {
        Self {
            success: true,
            files,
            error: None,
        }
    }

    /// A failed outcome, preserving files collected before the failure.
    #[must_use]
    pub fn failed(error: String, files: Vec<PathBuf>) -> Self {
        Self {
            success: false,
            files,
            error: Some(error),
        }
    }
}

/// Strategy seam for performing one download attempt.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads or records content for a link, never panicking.
    async fn download(&self, link: &Link) -> ToolOutcome;
}

/// Abstraction over the media tool process.
///
/// Implementations report each finished artifact path through
/// `on_artifact` as it completes, then return the overall process result.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Runs the media tool for a URL, firing `on_artifact` per finished file.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the process cannot be spawned or
    /// exits non-zero. Artifacts reported before the error stand.
    async fn run(
        &self,
        url: &str,
        config: &MediaToolConfig,
        on_artifact: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<(), DownloadError>;
}

/// Production media backend spawning the media tool as a subprocess.
///
/// Uses the tool's print hook (`--print after_move:filepath`) so each
/// finished artifact arrives as one stdout line after post-processing and
/// renaming, which is the only point the final path is known.
#[derive(Debug, Default, Clone, Copy)]
pub struct YtDlpBackend;

#[async_trait]
impl MediaBackend for YtDlpBackend {
    async fn run(
        &self,
        url: &str,
        config: &MediaToolConfig,
        on_artifact: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<(), DownloadError> {
        let mut command = Command::new(&config.program);
        command
            .arg("--format")
            .arg(&config.format)
            .arg("--output")
            .arg(&config.output_template)
            .arg("--download-archive")
            .arg(&config.download_archive)
            .arg("--retries")
            .arg(config.retries.to_string())
            .arg("--fragment-retries")
            .arg(config.retries.to_string())
            .arg("--no-warnings")
            .arg("--ignore-errors")
            .arg("--newline")
            .arg("--print")
            .arg("after_move:filepath");

        if config.live_from_start {
            command.arg("--live-from-start");
        }
        if let Some(cookies) = &config.cookies {
            command.arg("--cookies").arg(cookies);
        }

        command
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|source| DownloadError::from_spawn(&config.program, source))?;

        let stdout = child.stdout.take().ok_or_else(|| DownloadError::Spawn {
            tool: config.program.clone(),
            source: std::io::Error::other("stdout not captured"),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| DownloadError::Spawn {
            tool: config.program.clone(),
            source: std::io::Error::other("stderr not captured"),
        })?;

        // Drain both pipes together so neither can fill up and stall the tool
        let stdout_task = async {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(line = %line, "media tool artifact line");
                on_artifact(&line);
            }
        };
        let stderr_task = async {
            let mut text = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut text).await;
            text
        };
        let ((), stderr_text) = tokio::join!(stdout_task, stderr_task);

        let status = child.wait().await.map_err(|source| DownloadError::Spawn {
            tool: config.program.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(DownloadError::ToolFailed {
                tool: config.program.clone(),
                code: status.code().unwrap_or(-1),
                stderr: stderr_text.trim().to_string(),
            })
        }
    }
}

/// Production downloader: selects the tool for a link and runs it.
pub struct ToolDownloader {
    config: Arc<MonitorConfig>,
    media_backend: Arc<dyn MediaBackend>,
}

impl ToolDownloader {
    /// Creates a downloader with the production media backend.
    #[must_use]
    pub fn new(config: Arc<MonitorConfig>) -> Self {
        Self::with_backend(config, Arc::new(YtDlpBackend))
    }

    /// Creates a downloader with a custom media backend.
    #[must_use]
    pub fn with_backend(config: Arc<MonitorConfig>, media_backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            config,
            media_backend,
        }
    }

    async fn run_media(&self, link: &Link, media: &MediaToolConfig) -> ToolOutcome {
        info!(link_id = link.id, url = %link.url, tool = %media.program, "starting media download");

        let mut collector = FileCollector::new();
        let mut on_artifact = |line: &str| {
            collector.offer(line);
        };
        let result = self
            .media_backend
            .run(&link.url, media, &mut on_artifact)
            .await;

        let files = collector.into_files();
        match result {
            Ok(()) => {
                if files.is_empty() {
                    let error = DownloadError::NoOutput {
                        tool: media.program.clone(),
                    };
                    warn!(link_id = link.id, url = %link.url, "media tool finished without detected files");
                    ToolOutcome::failed(error.to_string(), files)
                } else {
                    info!(link_id = link.id, file_count = files.len(), "media download finished");
                    ToolOutcome::succeeded(files)
                }
            }
            Err(error) => {
                warn!(link_id = link.id, url = %link.url, error = %error, "media tool failed");
                ToolOutcome::failed(error.to_string(), files)
            }
        }
    }

    async fn run_batch(&self, link: &Link, batch: &BatchToolConfig) -> ToolOutcome {
        info!(link_id = link.id, url = %link.url, tool = %batch.program, "starting batch download");

        let output = Command::new(&batch.program)
            .args(&batch.args)
            .arg(&link.url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(source) => {
                let error = DownloadError::from_spawn(&batch.program, source);
                warn!(link_id = link.id, error = %error, "batch tool could not run");
                return ToolOutcome::failed(error.to_string(), Vec::new());
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Stdout is parsed regardless of exit code so partial progress is kept
        let files = parse_process_output(&stdout, &self.config.media_root);

        if output.status.success() {
            if files.is_empty() {
                warn!(link_id = link.id, url = %link.url, "batch tool succeeded but no files were parsed from output");
            }
            info!(link_id = link.id, file_count = files.len(), "batch download finished");
            ToolOutcome::succeeded(files)
        } else {
            let error = DownloadError::ToolFailed {
                tool: batch.program.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            };
            warn!(link_id = link.id, error = %error, "batch tool failed");
            ToolOutcome::failed(error.to_string(), files)
        }
    }
}

#[async_trait]
impl Downloader for ToolDownloader {
    #[instrument(skip(self, link), fields(link_id = link.id, url = %link.url))]
    async fn download(&self, link: &Link) -> ToolOutcome {
        match select_tool(link, &self.config) {
            ToolSelection::Media(media) => self.run_media(link, &media).await,
            ToolSelection::Batch(batch) => self.run_batch(link, &batch).await,
        }
    }
}
