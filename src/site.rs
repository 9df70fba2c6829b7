//! Site name extraction from monitored URLs.
//!
//! Site names drive downloader routing and per-site cookie lookup, so the
//! mapping for known hosts is fixed rather than heuristic. Unknown hosts
//! fall back to the capitalized second-level domain.

use url::Url;

/// Domain suffix to canonical site name mapping for known hosts.
///
/// Matched by suffix so subdomains (`www.`, `m.`, `live.`) resolve to the
/// same site. Aliases map to one canonical name (`x.com` is Twitter,
/// `youtu.be` is `YouTube`).
pub const KNOWN_SITES: &[(&str, &str)] = &[
    ("twitter.com", "Twitter"),
    ("x.com", "Twitter"),
    ("youtube.com", "YouTube"),
    ("youtu.be", "YouTube"),
    ("bilibili.com", "Bilibili"),
    ("weibo.com", "Weibo"),
    ("weibo.cn", "Weibo"),
    ("pixiv.net", "Pixiv"),
    ("instagram.com", "Instagram"),
    ("douyin.com", "Douyin"),
    ("tiktok.com", "TikTok"),
    ("kuaishou.com", "Kuaishou"),
    ("xiaohongshu.com", "Xiaohongshu"),
    ("twitch.tv", "Twitch"),
    ("deviantart.com", "DeviantArt"),
    ("artstation.com", "ArtStation"),
    ("soundcloud.com", "SoundCloud"),
    ("vimeo.com", "Vimeo"),
];

/// Extracts a site name from a URL for downloader routing.
///
/// Known hosts map to their canonical name; unknown hosts fall back to the
/// capitalized second-level domain, with a best-effort skip over short
/// public suffixes like `.co.uk`. Returns `None` when the URL has no
/// usable host.
///
/// ```
/// use media_saver_core::extract_site_name;
///
/// assert_eq!(extract_site_name("https://x.com/SpaceX"), Some("Twitter".to_string()));
/// assert_eq!(extract_site_name("https://sub.example.com/a"), Some("Example".to_string()));
/// assert_eq!(extract_site_name("not a url"), None);
/// ```
#[must_use]
pub fn extract_site_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    for (domain, name) in KNOWN_SITES {
        if host == *domain || host.ends_with(&format!(".{domain}")) {
            return Some((*name).to_string());
        }
    }

    let mut parts: Vec<&str> = host.split('.').collect();
    if parts.first() == Some(&"www") {
        parts.remove(0);
    }

    match parts.len() {
        0 => None,
        1 => Some(parts[0].to_string()),
        len => {
            // Two short trailing labels usually mean a compound public
            // suffix (.co.uk, .org.cn); the registrable label sits one
            // further left when present.
            let last = parts[len - 1];
            let second_last = parts[len - 2];
            let label = if last.len() <= 3 && second_last.len() <= 3 && len >= 3 {
                parts[len - 3]
            } else if last.len() <= 3 && second_last.len() <= 3 {
                parts[0]
            } else {
                second_last
            };
            Some(capitalize(label))
        }
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sites_resolve_to_canonical_names() {
        assert_eq!(
            extract_site_name("https://twitter.com/user"),
            Some("Twitter".to_string())
        );
        assert_eq!(
            extract_site_name("https://x.com/SpaceX"),
            Some("Twitter".to_string())
        );
        assert_eq!(
            extract_site_name("https://youtu.be/dQw4w9WgXcQ"),
            Some("YouTube".to_string())
        );
    }

    #[test]
    fn test_subdomains_match_known_sites() {
        assert_eq!(
            extract_site_name("https://www.youtube.com/watch?v=abc"),
            Some("YouTube".to_string())
        );
        assert_eq!(
            extract_site_name("https://m.weibo.cn/status/123"),
            Some("Weibo".to_string())
        );
        assert_eq!(
            extract_site_name("https://live.kuaishou.com/u/123456"),
            Some("Kuaishou".to_string())
        );
    }

    #[test]
    fn test_unknown_host_uses_second_level_domain() {
        assert_eq!(
            extract_site_name("https://github.com/some/repo"),
            Some("Github".to_string())
        );
        assert_eq!(
            extract_site_name("https://sub.domain.longname.com/path"),
            Some("Longname".to_string())
        );
    }

    #[test]
    fn test_compound_public_suffix_skipped() {
        assert_eq!(
            extract_site_name("http://example.co.uk/page"),
            Some("Example".to_string())
        );
    }

    #[test]
    fn test_port_is_ignored() {
        // Single-label hosts keep their original casing
        assert_eq!(
            extract_site_name("http://localhost:8080/api"),
            Some("localhost".to_string())
        );
    }

    #[test]
    fn test_invalid_url_returns_none() {
        assert_eq!(extract_site_name("invalid-url"), None);
        assert_eq!(extract_site_name(""), None);
    }

    #[test]
    fn test_host_matching_is_suffix_anchored() {
        // "notx.com" must not match the "x.com" entry
        assert_eq!(
            extract_site_name("https://notx.com/user"),
            Some("Notx".to_string())
        );
    }
}
