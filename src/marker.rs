//! The `[node-id=...]` marker that links an issue body back to a graph node.

const MARKER_PREFIX: &str = "[node-id=";
const MARKER_SUFFIX: char = ']';

/// Build the marker embedded in the body of an issue created for `node_id`.
pub fn node_marker(node_id: &str) -> String {
    format!("{}{}{}", MARKER_PREFIX, node_id, MARKER_SUFFIX)
}

/// Extract the node identifier from free-form text.
///
/// Returns the characters between the first `[node-id=` and the next `]`,
/// taken verbatim (newlines included). `None` when either is missing.
pub fn extract_node_id(text: &str) -> Option<&str> {
    let start = text.find(MARKER_PREFIX)? + MARKER_PREFIX.len();
    let len = text[start..].find(MARKER_SUFFIX)?;
    Some(&text[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_inline_marker() {
        assert_eq!(extract_node_id("foo [node-id=abc123] bar"), Some("abc123"));
    }

    #[test]
    fn test_extract_missing_marker() {
        assert_eq!(extract_node_id("no marker here"), None);
        assert_eq!(extract_node_id(""), None);
    }

    #[test]
    fn test_extract_first_marker_wins() {
        assert_eq!(extract_node_id("[node-id=a] and [node-id=b]"), Some("a"));
    }

    #[test]
    fn test_extract_stops_at_next_bracket() {
        assert_eq!(extract_node_id("[node-id=a]b]"), Some("a"));
    }

    #[test]
    fn test_extract_unterminated_marker() {
        assert_eq!(extract_node_id("[node-id=dangling"), None);
    }

    #[test]
    fn test_extract_spans_to_first_closing_bracket() {
        assert_eq!(
            extract_node_id("[node-id=a [node-id=b]"),
            Some("a [node-id=b")
        );
    }

    #[test]
    fn test_extract_empty_identifier() {
        assert_eq!(extract_node_id("[node-id=]"), Some(""));
    }

    #[test]
    fn test_extract_preserves_characters_verbatim() {
        assert_eq!(
            extract_node_id("see [node-id=\"x y\\z\"]\n"),
            Some("\"x y\\z\"")
        );
    }

    #[test]
    fn test_extract_multiline_body() {
        let body = "Context line\n\n[node-id=write_docs]\nmore text";
        assert_eq!(extract_node_id(body), Some("write_docs"));
    }

    #[test]
    fn test_marker_round_trips_through_extract() {
        let marker = node_marker("deploy-site");
        assert_eq!(marker, "[node-id=deploy-site]");
        assert_eq!(extract_node_id(&marker), Some("deploy-site"));
    }
}
