use once_cell::sync::Lazy;
use regex::Regex;

// Any info string after the opening fence is skipped.
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+.-]*[ \t]*\r?\n?(.*?)\n?\s*```").unwrap()
});
static OBJECT_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Picks the JSON text out of a model reply: first fenced block, else the
/// outermost `{...}` span, else the trimmed reply for the parser to reject.
pub(crate) fn extract_json_payload(output: &str) -> String {
    if let Some(inner) = FENCED_BLOCK
        .captures(output)
        .and_then(|captures| captures.get(1))
    {
        return inner.as_str().trim().to_string();
    }
    if let Some(span) = OBJECT_SPAN.find(output) {
        return span.as_str().trim().to_string();
    }
    output.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_fenced_json() {
        let reply = "Here you go:\n```json\n{\"suite\": {}}\n```\nThanks";
        assert_eq!(extract_json_payload(reply), "{\"suite\": {}}");
    }

    #[test]
    fn test_extracts_fence_with_uppercase_tag() {
        let reply = "```JSON\n{\"a\":1}\n```";
        assert_eq!(extract_json_payload(reply), "{\"a\":1}");
    }

    #[test]
    fn test_extracts_fence_with_other_tag() {
        let reply = "Result:\r\n```jsonc \r\n{\"rows\": []}\r\n```\r\n";
        assert_eq!(extract_json_payload(reply), "{\"rows\": []}");
    }

    #[test]
    fn test_extracts_fence_without_language() {
        let reply = "```\n  {\"a\": 1}  \n```";
        assert_eq!(extract_json_payload(reply), "{\"a\": 1}");
    }

    #[test]
    fn test_extracts_object_from_prose() {
        let reply = "Sure! {\"a\": {\"b\": 2}} hope this helps";
        assert_eq!(extract_json_payload(reply), "{\"a\": {\"b\": 2}}");
    }

    #[test]
    fn test_plain_json_passes_through() {
        assert_eq!(extract_json_payload("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn test_non_json_is_returned_trimmed() {
        assert_eq!(extract_json_payload("  not json \n"), "not json");
        assert_eq!(extract_json_payload(""), "");
    }
}
