//! Destination URL normalization and sanitization.

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Hard cap on destination URL length after normalization.
pub const MAX_URL_LENGTH: usize = 2048;

/// Normalizes a destination URL to a canonical form.
///
/// Lowercases the host, strips the fragment and default ports, and rejects
/// anything that is not plain `http`/`https` so `javascript:`, `data:` and
/// friends never become redirect targets. Path, query and custom ports are
/// preserved as-is.
///
/// # Errors
///
/// Returns [`AppError::Validation`] for malformed URLs, non-HTTP(S) schemes
/// and over-long URLs.
pub fn normalize_url(input: &str) -> Result<String, AppError> {
    let mut url = Url::parse(input.trim()).map_err(|e| {
        AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() }))
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AppError::bad_request(
                "Only http and https URLs can be shortened",
                json!({ "scheme": other }),
            ));
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| AppError::bad_request("URL must have a host", json!({})))?
        .to_ascii_lowercase();
    url.set_host(Some(&host))
        .map_err(|_| AppError::bad_request("URL host is invalid", json!({ "host": host })))?;

    url.set_fragment(None);

    if matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        // Cannot fail for http/https.
        let _ = url.set_port(None);
    }

    let normalized = url.to_string();
    if normalized.len() > MAX_URL_LENGTH {
        return Err(AppError::bad_request(
            "URL is too long",
            json!({ "length": normalized.len(), "max": MAX_URL_LENGTH }),
        ));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_host_case_and_default_port() {
        assert_eq!(
            normalize_url("HTTPS://Example.COM:443/Path?q=1#frag").unwrap(),
            "https://example.com/Path?q=1"
        );
        assert_eq!(
            normalize_url("http://example.com:80/").unwrap(),
            "http://example.com/"
        );
    }

    #[test]
    fn test_preserves_custom_port_and_query() {
        assert_eq!(
            normalize_url("http://example.com:8080/a?b=c&d=e").unwrap(),
            "http://example.com:8080/a?b=c&d=e"
        );
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(
            normalize_url("  https://example.com  ").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_rejects_dangerous_schemes() {
        for input in [
            "javascript:alert(1)",
            "data:text/html,hi",
            "file:///etc/passwd",
            "ftp://example.com/file",
        ] {
            let err = normalize_url(input).unwrap_err();
            assert!(err.to_string().contains("http"), "input: {input}");
        }
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(normalize_url("not a url").is_err());
        assert!(normalize_url("example.com").is_err());
        assert!(normalize_url("").is_err());
    }

    #[test]
    fn test_rejects_over_long_url() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(normalize_url(&url).is_err());
    }
}
