//! Return-URL checks for post-login redirects.

/// Returns true when `url` points back into this site.
///
/// Accepts `/path` (but not `//host` or `/\host`) and app-root relative
/// `~/path`, where the part after `~` must pass the same `/path` check.
/// Everything else, including absolute URLs, is rejected.
pub fn is_local_url(url: &str) -> bool {
    match url.strip_prefix('~') {
        Some(rest) => is_site_path(rest),
        None => is_site_path(url),
    }
}

fn is_site_path(path: &str) -> bool {
    match path.as_bytes() {
        [b'/'] => true,
        [b'/', second, ..] => *second != b'/' && *second != b'\\',
        _ => false,
    }
}

/// Resolves a local return URL to a redirect target, mapping `~/` to `/`.
///
/// Returns `None` when the URL is not local.
pub fn local_redirect_target(url: &str) -> Option<String> {
    if !is_local_url(url) {
        return None;
    }
    match url.strip_prefix('~') {
        Some(rest) => Some(rest.to_string()),
        None => Some(url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_urls() {
        assert!(is_local_url("/"));
        assert!(is_local_url("/account"));
        assert!(is_local_url("/torrents?page=2"));
        assert!(is_local_url("~/account"));
    }

    #[test]
    fn test_non_local_urls() {
        assert!(!is_local_url(""));
        assert!(!is_local_url("//evil.example.com"));
        assert!(!is_local_url("/\\evil.example.com"));
        assert!(!is_local_url("http://evil.example.com/"));
        assert!(!is_local_url("account"));
        assert!(!is_local_url("~"));
        assert!(!is_local_url("~//evil.example.com"));
        assert!(!is_local_url("~/\\evil.example.com"));
        assert!(!is_local_url("~~/account"));
    }

    #[test]
    fn test_redirect_target_strips_app_root_marker() {
        assert_eq!(local_redirect_target("~/account"), Some("/account".to_string()));
        assert_eq!(local_redirect_target("/account"), Some("/account".to_string()));
        assert_eq!(local_redirect_target("~/"), Some("/".to_string()));
        assert_eq!(local_redirect_target("https://x.test"), None);
        assert_eq!(local_redirect_target("~//evil.example.com"), None);
        assert_eq!(local_redirect_target("~/\\evil.example.com"), None);
    }
}
