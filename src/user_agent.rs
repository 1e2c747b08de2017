//! User-Agent sent with every probe and download request.
//!
//! Mirrors commonly throttle or reject unknown clients, so measurements use a
//! mainstream desktop browser string rather than identifying the tool.

/// Browser User-Agent used for all speed test traffic.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// Default User-Agent for speed test requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_is_browser_string() {
        let ua = default_user_agent();
        assert!(ua.starts_with("Mozilla/5.0"), "unexpected UA: {ua}");
        assert!(ua.contains("Chrome/"), "UA must identify a browser: {ua}");
    }

    #[test]
    fn test_user_agent_has_no_line_breaks() {
        // Multi-line literals must collapse into a valid single header value.
        assert!(!BROWSER_USER_AGENT.contains('\n'));
        assert!(!BROWSER_USER_AGENT.contains("  "));
        assert!(reqwest::header::HeaderValue::from_str(BROWSER_USER_AGENT).is_ok());
    }
}
