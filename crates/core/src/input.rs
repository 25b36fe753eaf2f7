//! User-input parsing and URL helpers.
//!
//! Covers the textual side of batch intake: splitting a pasted URL list
//! into work items, validating that a source looks fetchable, and deriving
//! a short display name for status lines.

use url::Url;

use crate::error::CoreError;
use crate::types::WorkItem;

/// Parse a newline-separated URL list into work items.
///
/// Lines are trimmed; empty lines are dropped. No per-URL validation is
/// performed here — the submission endpoint is the authority on what it
/// accepts.
pub fn parse_work_items(raw: &str) -> Vec<WorkItem> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(WorkItem::new)
        .collect()
}

/// Validate that a source URL is non-empty and uses an http(s) scheme.
pub fn validate_source_url(url: &str) -> Result<(), CoreError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Source URL must not be empty".to_string(),
        ));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(CoreError::Validation(format!(
            "Source URL must start with http:// or https://, got: '{trimmed}'"
        )));
    }
    Ok(())
}

/// Derive a short human-readable label for a source URL.
///
/// Known media hosts get a friendly platform name. Otherwise the last
/// path segment is used, with its extension stripped and `-`/`_` replaced
/// by spaces, falling back to the host. Unparsable input is truncated.
pub fn display_name(source: &str) -> String {
    let Ok(parsed) = Url::parse(source) else {
        return truncate(source, 30);
    };

    let host = parsed.host_str().unwrap_or_default();
    if host.contains("youtube.com") || host.contains("youtu.be") {
        return "YouTube Video".to_string();
    }
    if host.contains("vimeo.com") {
        return "Vimeo Video".to_string();
    }
    if host.contains("soundcloud.com") {
        return "SoundCloud Track".to_string();
    }

    let last_segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back());

    match last_segment {
        Some(segment) => {
            let stem = segment.split('.').next().unwrap_or(segment);
            stem.replace(['-', '_'], " ")
        }
        None => host.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- parse_work_items ----------------------------------------------------

    #[test]
    fn parses_trimmed_nonempty_lines() {
        let items = parse_work_items("https://a.example/1\n  https://b.example/2  \n\n");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "https://a.example/1");
        assert_eq!(items[1].source, "https://b.example/2");
    }

    #[test]
    fn empty_input_yields_no_items() {
        assert!(parse_work_items("").is_empty());
        assert!(parse_work_items("\n   \n\t\n").is_empty());
    }

    #[test]
    fn input_order_is_preserved() {
        let items = parse_work_items("u3\nu1\nu2");
        let sources: Vec<_> = items.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, ["u3", "u1", "u2"]);
    }

    // -- validate_source_url -------------------------------------------------

    #[test]
    fn http_and_https_accepted() {
        assert!(validate_source_url("https://example.com/v").is_ok());
        assert!(validate_source_url("http://example.com/v").is_ok());
    }

    #[test]
    fn empty_and_non_http_rejected() {
        assert!(validate_source_url("").is_err());
        assert!(validate_source_url("   ").is_err());
        assert!(validate_source_url("ftp://example.com/v").is_err());
        assert!(validate_source_url("just-a-path").is_err());
    }

    // -- display_name --------------------------------------------------------

    #[test]
    fn known_platforms_get_friendly_names() {
        assert_eq!(
            display_name("https://www.youtube.com/watch?v=abc"),
            "YouTube Video"
        );
        assert_eq!(display_name("https://youtu.be/abc"), "YouTube Video");
        assert_eq!(display_name("https://vimeo.com/12345"), "Vimeo Video");
        assert_eq!(
            display_name("https://soundcloud.com/artist/track"),
            "SoundCloud Track"
        );
    }

    #[test]
    fn path_segment_becomes_readable_name() {
        assert_eq!(
            display_name("https://cdn.example.com/files/my-great_clip.mp4"),
            "my great clip"
        );
    }

    #[test]
    fn bare_host_falls_back_to_hostname() {
        assert_eq!(display_name("https://example.com/"), "example.com");
    }

    #[test]
    fn unparsable_input_is_truncated() {
        let long = "not a url but quite a long string of text indeed";
        let name = display_name(long);
        assert!(name.ends_with("..."));
        assert!(name.len() <= 33);
    }
}
