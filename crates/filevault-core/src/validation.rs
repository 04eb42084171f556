//! Validation helpers
//!
//! MIME pattern matching for the upload allowlist and the encryption type
//! filter. Patterns are either exact (`image/png`) or a top-level wildcard
//! (`image/*`). Matching is case-insensitive and ignores parameters
//! (`text/plain; charset=utf-8` matches `text/plain`).

/// True when `content_type` matches the given pattern.
pub fn mime_matches(pattern: &str, content_type: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    let content_type = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if pattern == "*/*" {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix("/*") {
        return content_type
            .split('/')
            .next()
            .map(|top| top == prefix)
            .unwrap_or(false);
    }

    pattern == content_type
}

/// True when `content_type` matches any pattern. An empty pattern list
/// matches everything - an unset allowlist means "no restriction".
pub fn mime_matches_any(patterns: &[String], content_type: &str) -> bool {
    patterns.is_empty() || patterns.iter().any(|p| mime_matches(p, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(mime_matches("image/png", "image/png"));
        assert!(mime_matches("image/png", "IMAGE/PNG"));
        assert!(!mime_matches("image/png", "image/jpeg"));
    }

    #[test]
    fn test_wildcard_match() {
        assert!(mime_matches("image/*", "image/png"));
        assert!(mime_matches("image/*", "image/webp"));
        assert!(!mime_matches("image/*", "video/mp4"));
        assert!(mime_matches("*/*", "application/octet-stream"));
    }

    #[test]
    fn test_parameters_ignored() {
        assert!(mime_matches("text/plain", "text/plain; charset=utf-8"));
    }

    #[test]
    fn test_empty_list_allows_all() {
        assert!(mime_matches_any(&[], "application/x-anything"));
    }

    #[test]
    fn test_list_match() {
        let patterns = vec!["image/*".to_string(), "application/pdf".to_string()];

        assert!(mime_matches_any(&patterns, "image/gif"));
        assert!(mime_matches_any(&patterns, "application/pdf"));
        assert!(!mime_matches_any(&patterns, "video/mp4"));
    }
}
