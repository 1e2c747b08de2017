//! Display names for candidate files, taken from the last URL path segment.

use url::Url;

/// Returns the final path segment of `url`, or an empty string when the path
/// has no segments (or ends in `/`).
///
/// The segment is returned as it appears in the URL; percent-encoding is kept
/// so the name matches what the server was asked for.
#[must_use]
pub fn extract_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .to_string()
}
