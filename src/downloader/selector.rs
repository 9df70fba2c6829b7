//! Downloader selection: routing links to the right external tool.
//!
//! Selection is a pure function of the link, the configuration, and which
//! cookie files exist on disk. Gallery-style sites go to the batch tool;
//! everything else, including live recordings, goes to the media tool.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::MonitorConfig;
use crate::link::{Link, LinkKind};

/// Sites routed to the batch/gallery tool. Compared lowercase.
pub const BATCH_TOOL_SITES: &[&str] = &[
    "pixiv",
    "instagram",
    "deviantart",
    "artstation",
    "weibo",
    "xiaohongshu",
];

/// Format selector handed to the media tool for creator downloads.
const MEDIA_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Retry count shared by both tools.
const TOOL_RETRIES: u32 = 5;

/// Resolved invocation plan for the media tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaToolConfig {
    /// Program name or path.
    pub program: String,
    /// Format selector expression.
    pub format: String,
    /// Output path template with tool substitution variables.
    pub output_template: String,
    /// Archive file preventing re-downloads across runs.
    pub download_archive: PathBuf,
    /// Record live streams from their beginning.
    pub live_from_start: bool,
    /// Cookie file to pass, already verified to exist.
    pub cookies: Option<PathBuf>,
    /// Retry count for failed downloads and fragments.
    pub retries: u32,
}

/// Resolved invocation plan for the batch tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchToolConfig {
    /// Program name or path.
    pub program: String,
    /// Full argument list, excluding the link URL appended at invocation.
    pub args: Vec<String>,
}

/// Which tool a link routes to, with its resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolSelection {
    /// Batch/gallery tool invocation.
    Batch(BatchToolConfig),
    /// Media/video tool invocation.
    Media(MediaToolConfig),
}

impl ToolSelection {
    /// Returns the program name of the selected tool.
    #[must_use]
    pub fn program(&self) -> &str {
        match self {
            Self::Batch(batch) => &batch.program,
            Self::Media(media) => &media.program,
        }
    }
}

/// Selects the download tool and resolves its invocation plan for a link.
///
/// Routing is by site: members of [`BATCH_TOOL_SITES`] use the batch tool,
/// everything else the media tool. Live links get the recordings output
/// template and record from the stream start.
#[must_use]
pub fn select_tool(link: &Link, config: &MonitorConfig) -> ToolSelection {
    let site = link.site_key();
    let cookies = resolve_cookies(link, &site, config);

    if BATCH_TOOL_SITES.contains(&site.as_str()) {
        debug!(site = %site, link_id = link.id, "routing to batch tool");
        return ToolSelection::Batch(batch_config(config, cookies.as_deref()));
    }

    debug!(site = %site, link_id = link.id, "routing to media tool");
    ToolSelection::Media(media_config(link, config, cookies))
}

/// Resolves the cookie file for an invocation.
///
/// Link-specific cookies win when the file exists; otherwise the global
/// per-site cookie file from config when it exists; otherwise none.
/// A configured path whose file is missing logs a warning and is skipped.
fn resolve_cookies(link: &Link, site: &str, config: &MonitorConfig) -> Option<PathBuf> {
    if let Some(link_cookies) = link.cookies_path.as_deref() {
        let path = Path::new(link_cookies);
        if path.is_file() {
            debug!(link_id = link.id, path = %path.display(), "using link-specific cookies");
            return Some(path.to_path_buf());
        }
        warn!(
            link_id = link.id,
            path = %path.display(),
            "link-specific cookies file not found, checking global settings"
        );
    }

    if let Some(global_cookies) = config.site_cookie(site) {
        if global_cookies.is_file() {
            debug!(site = %site, path = %global_cookies.display(), "using global site cookies");
            return Some(global_cookies.to_path_buf());
        }
        warn!(
            site = %site,
            path = %global_cookies.display(),
            "global cookies file not found"
        );
    }

    None
}

fn batch_config(config: &MonitorConfig, cookies: Option<&Path>) -> BatchToolConfig {
    let mut args = vec![
        "--directory".to_string(),
        config.media_root.display().to_string(),
        "--write-metadata".to_string(),
        "--retries".to_string(),
        TOOL_RETRIES.to_string(),
        "--sleep".to_string(),
        "1-3".to_string(),
        "--download-archive".to_string(),
        config
            .media_root
            .join("gallery_dl_archive.sqlite")
            .display()
            .to_string(),
    ];

    if let Some(cookies) = cookies {
        args.push("--cookies".to_string());
        args.push(cookies.display().to_string());
    }

    BatchToolConfig {
        program: config.batch_tool.clone(),
        args,
    }
}

fn media_config(link: &Link, config: &MonitorConfig, cookies: Option<PathBuf>) -> MediaToolConfig {
    let (output_template, live_from_start) = match link.kind() {
        LinkKind::Live => (
            config
                .media_root
                .join("Live Recordings")
                .join("%(uploader)s [%(channel_id)s]")
                .join("%(title)s - %(timestamp)s [%(id)s].%(ext)s"),
            true,
        ),
        LinkKind::Creator => (
            config
                .media_root
                .join("%(uploader)s [%(channel_id)s]")
                .join("%(title)s [%(id)s].%(ext)s"),
            false,
        ),
    };

    MediaToolConfig {
        program: config.media_tool.clone(),
        format: MEDIA_FORMAT.to_string(),
        output_template: output_template.display().to_string(),
        download_archive: config.media_root.join("download_archive.txt"),
        live_from_start,
        cookies,
        retries: TOOL_RETRIES,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;

    fn make_link(site: &str, kind: &str) -> Link {
        Link {
            id: 1,
            url: "https://example.com/user".to_string(),
            kind_str: kind.to_string(),
            site_name: Some(site.to_string()),
            name: None,
            status_str: "idle".to_string(),
            is_enabled: true,
            cookies_path: None,
            settings: "{}".to_string(),
            error_message: None,
            last_checked_at: None,
            last_success_at: None,
            created_at: "2026-01-01".to_string(),
            updated_at: "2026-01-01".to_string(),
        }
    }

    #[test]
    fn test_batch_sites_route_to_batch_tool() {
        let config = MonitorConfig::default();
        for site in ["Pixiv", "Instagram", "DeviantArt", "Weibo", "Xiaohongshu"] {
            let link = make_link(site, "creator");
            assert!(
                matches!(select_tool(&link, &config), ToolSelection::Batch(_)),
                "{site} should route to the batch tool"
            );
        }
    }

    #[test]
    fn test_other_sites_route_to_media_tool() {
        let config = MonitorConfig::default();
        for site in ["YouTube", "Twitter", "Twitch", "Unknownsite"] {
            let link = make_link(site, "creator");
            assert!(
                matches!(select_tool(&link, &config), ToolSelection::Media(_)),
                "{site} should route to the media tool"
            );
        }
    }

    #[test]
    fn test_missing_site_name_routes_to_media_tool() {
        let config = MonitorConfig::default();
        let mut link = make_link("YouTube", "creator");
        link.site_name = None;
        assert!(matches!(select_tool(&link, &config), ToolSelection::Media(_)));
    }

    #[test]
    fn test_live_links_use_recordings_template() {
        let config = MonitorConfig::default();
        let link = make_link("Twitch", "live");

        let ToolSelection::Media(media) = select_tool(&link, &config) else {
            panic!("expected media tool");
        };
        assert!(media.live_from_start);
        assert!(media.output_template.contains("Live Recordings"));
        assert!(media.output_template.contains("%(timestamp)s"));
    }

    #[test]
    fn test_creator_links_use_standard_template() {
        let config = MonitorConfig::default();
        let link = make_link("YouTube", "creator");

        let ToolSelection::Media(media) = select_tool(&link, &config) else {
            panic!("expected media tool");
        };
        assert!(!media.live_from_start);
        assert!(!media.output_template.contains("Live Recordings"));
    }

    #[test]
    fn test_link_cookies_take_precedence_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let link_cookies = dir.path().join("link.txt");
        let global_cookies = dir.path().join("global.txt");
        fs::write(&link_cookies, b"link").unwrap();
        fs::write(&global_cookies, b"global").unwrap();

        let mut config = MonitorConfig::default();
        config
            .site_cookies
            .insert("youtube".to_string(), global_cookies);

        let mut link = make_link("YouTube", "creator");
        link.cookies_path = Some(link_cookies.display().to_string());

        let ToolSelection::Media(media) = select_tool(&link, &config) else {
            panic!("expected media tool");
        };
        assert_eq!(media.cookies, Some(link_cookies));
    }

    #[test]
    fn test_missing_link_cookies_fall_back_to_global() {
        let dir = tempfile::tempdir().unwrap();
        let global_cookies = dir.path().join("global.txt");
        fs::write(&global_cookies, b"global").unwrap();

        let mut config = MonitorConfig::default();
        config
            .site_cookies
            .insert("youtube".to_string(), global_cookies.clone());

        let mut link = make_link("YouTube", "creator");
        link.cookies_path = Some(dir.path().join("missing.txt").display().to_string());

        let ToolSelection::Media(media) = select_tool(&link, &config) else {
            panic!("expected media tool");
        };
        assert_eq!(media.cookies, Some(global_cookies));
    }

    #[test]
    fn test_missing_global_cookies_resolve_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MonitorConfig::default();
        config
            .site_cookies
            .insert("youtube".to_string(), dir.path().join("gone.txt"));

        let link = make_link("YouTube", "creator");
        let ToolSelection::Media(media) = select_tool(&link, &config) else {
            panic!("expected media tool");
        };
        assert_eq!(media.cookies, None);
    }

    #[test]
    fn test_batch_args_include_cookies_when_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let cookies = dir.path().join("pixiv.txt");
        fs::write(&cookies, b"cookies").unwrap();

        let mut config = MonitorConfig::default();
        config
            .site_cookies
            .insert("pixiv".to_string(), cookies.clone());

        let link = make_link("Pixiv", "creator");
        let ToolSelection::Batch(batch) = select_tool(&link, &config) else {
            panic!("expected batch tool");
        };
        let cookie_pos = batch
            .args
            .iter()
            .position(|arg| arg == "--cookies")
            .expect("--cookies flag present");
        assert_eq!(batch.args[cookie_pos + 1], cookies.display().to_string());
    }

    #[test]
    fn test_selection_is_deterministic() {
        let config = MonitorConfig::default();
        let link = make_link("Pixiv", "creator");
        assert_eq!(select_tool(&link, &config), select_tool(&link, &config));
    }
}
