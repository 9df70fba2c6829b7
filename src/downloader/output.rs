//! Tool output parsing: turning noisy tool output into verified file lists.
//!
//! Two parsing paths feed the same rules: the media tool reports one final
//! path per line through its print hook, while the batch tool's stdout is
//! scanned for paths under the media root. In both cases a path only counts
//! if it names an existing regular file, and duplicates are dropped while
//! preserving first-seen order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

/// Suffixes of in-progress artifacts that must never count as output.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".temp", ".ytdl"];

/// Accumulates verified download artifacts from per-file events.
///
/// Rejects partial files and paths that are not existing regular files;
/// deduplicates while preserving the order files were first reported.
#[derive(Debug, Default)]
pub struct FileCollector {
    seen: HashSet<PathBuf>,
    files: Vec<PathBuf>,
}

impl FileCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers one reported path. Returns `true` if it was accepted.
    pub fn offer(&mut self, raw_path: &str) -> bool {
        let trimmed = raw_path.trim();
        if trimmed.is_empty() {
            return false;
        }

        if PARTIAL_SUFFIXES
            .iter()
            .any(|suffix| trimmed.ends_with(suffix))
        {
            debug!(path = %trimmed, "ignoring partial artifact");
            return false;
        }

        let path = PathBuf::from(trimmed);
        if !path.is_file() {
            debug!(path = %path.display(), "ignoring non-existent or non-file path");
            return false;
        }

        if self.seen.contains(&path) {
            return false;
        }

        self.seen.insert(path.clone());
        self.files.push(path);
        true
    }

    /// Number of accepted files so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true when no files have been accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Consumes the collector, returning accepted files in first-seen order.
    #[must_use]
    pub fn into_files(self) -> Vec<PathBuf> {
        self.files
    }
}

/// Builds the regex matching file paths in batch tool output.
///
/// Matches a path under `media_root`, optionally single- or double-quoted,
/// optionally preceded by bracketed log tags and a `Writing data to` marker:
///
/// ```text
/// /media/pixiv/artist/12345.png
/// [download] '/media/pixiv/artist/12345.png'
/// [debug] Writing data to "/media/pixiv/artist/12345.json"
/// ```
fn path_pattern(media_root: &Path) -> Option<Regex> {
    let root = regex::escape(&media_root.display().to_string());
    Regex::new(&format!(
        r#"^(?:\[[^\]]+\]\s*)*(?:Writing data to\s*)?['"]?({root}/[^'"\s]+)['"]?"#
    ))
    .ok()
}

/// Extracts verified file paths from captured batch tool stdout.
///
/// Scans every line against [`path_pattern`], then applies the collector
/// rules (existing regular files only, deduplicated in order).
#[must_use]
pub fn parse_process_output(stdout: &str, media_root: &Path) -> Vec<PathBuf> {
    let Some(pattern) = path_pattern(media_root) else {
        return Vec::new();
    };

    let mut collector = FileCollector::new();
    for line in stdout.lines() {
        if let Some(captures) = pattern.captures(line.trim()) {
            if let Some(path_match) = captures.get(1) {
                collector.offer(path_match.as_str());
            }
        }
    }

    collector.into_files()
}
