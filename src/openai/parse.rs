//! Response post-processing for the augmented call.
//!
//! Three independent steps, each testable on its own:
//! 1. recover text from a `/v1/responses` body ([`extract_responses_text`]),
//! 2. interpret that text ([`parse_augmented`], with an explicit
//!    [`ParseTier`] instead of an implicit fallback order),
//! 3. sanitize text destined for a sheet cell ([`sanitize_for_sheet`]).

use regex::Regex;
use std::sync::OnceLock;

use super::types::{ResponsesResponse, WebAnswer};
use crate::urls;

/// Which interpretation tier produced the augmented result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    /// The text parsed as the requested `{answer, sources}` object.
    StructuredJson,
    /// JSON parsing failed but URL-looking substrings were found in the raw text.
    UrlScan,
    /// Neither structure nor URLs were recovered.
    Empty,
}

/// Result of interpreting the augmented call's recovered text.
/// `raw_sources` are not yet normalized or deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAugmented {
    pub answer: String,
    pub raw_sources: Vec<String>,
    pub tier: ParseTier,
}

/// Placeholder stored when no textual output could be recovered.
pub const NO_TEXT_MARKER: &str = "(no text extracted)";

/// Pull textual output from a `/v1/responses` body.
///
/// Prefers the canonical `output_text` field; otherwise concatenates the
/// text fragments of `message` items across the generic output list.
pub fn extract_responses_text(resp: &ResponsesResponse) -> String {
    if let Some(text) = &resp.output_text
        && !text.trim().is_empty()
    {
        return text.clone();
    }

    let parts: Vec<&str> = resp
        .output
        .iter()
        .filter(|item| item.item_type == "message")
        .flat_map(|item| item.content.iter())
        .filter_map(|c| c.text.as_deref())
        .collect();
    if !parts.is_empty() {
        return parts.join("\n\n");
    }

    NO_TEXT_MARKER.to_string()
}

/// Interpret recovered text as the requested JSON object, falling back to
/// a raw URL scan. The chosen tier is reported explicitly.
pub fn parse_augmented(raw: &str) -> ParsedAugmented {
    if let Ok(parsed) = serde_json::from_str::<WebAnswer>(raw) {
        return ParsedAugmented {
            answer: parsed.answer.unwrap_or_else(|| raw.to_string()),
            raw_sources: parsed.sources.into_iter().map(|s| s.url).collect(),
            tier: ParseTier::StructuredJson,
        };
    }

    let scanned = urls::extract_from_text(raw);
    let tier = if scanned.is_empty() {
        ParseTier::Empty
    } else {
        ParseTier::UrlScan
    };
    ParsedAugmented {
        answer: raw.to_string(),
        raw_sources: scanned,
        tier,
    }
}

/// Strip markdown-link syntax and collapse runs of whitespace.
/// The only text transform applied before classification and persistence.
pub fn sanitize_for_sheet(text: &str) -> String {
    static MD_LINK_RE: OnceLock<Regex> = OnceLock::new();
    static WS_RE: OnceLock<Regex> = OnceLock::new();
    let md = MD_LINK_RE
        .get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern is valid"));
    let ws = WS_RE.get_or_init(|| Regex::new(r"\s{2,}").expect("whitespace pattern is valid"));

    let without_links = md.replace_all(text, "$1");
    ws.replace_all(&without_links, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_prefers_output_text() {
        let resp: ResponsesResponse = serde_json::from_str(
            r#"{"output_text": "flat answer", "output": [
                {"type": "message", "content": [{"type": "output_text", "text": "ignored"}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(extract_responses_text(&resp), "flat answer");
    }

    #[test]
    fn extract_assembles_message_fragments() {
        let resp: ResponsesResponse = serde_json::from_str(
            r#"{"output": [
                {"type": "web_search_call"},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "first"},
                    {"type": "output_text", "text": "second"}
                ]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(extract_responses_text(&resp), "first\n\nsecond");
    }

    #[test]
    fn extract_falls_back_to_marker() {
        let resp: ResponsesResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_responses_text(&resp), NO_TEXT_MARKER);

        // Whitespace-only output_text does not count.
        let resp: ResponsesResponse =
            serde_json::from_str(r#"{"output_text": "   "}"#).unwrap();
        assert_eq!(extract_responses_text(&resp), NO_TEXT_MARKER);
    }

    #[test]
    fn structured_json_tier() {
        let raw = r#"{"answer": "Acme leads the market.",
                      "sources": [{"url": "https://a.com/x", "title": "A"},
                                  {"url": "https://b.com/y"}]}"#;
        let parsed = parse_augmented(raw);
        assert_eq!(parsed.tier, ParseTier::StructuredJson);
        assert_eq!(parsed.answer, "Acme leads the market.");
        assert_eq!(parsed.raw_sources, vec!["https://a.com/x", "https://b.com/y"]);
    }

    #[test]
    fn structured_json_without_answer_keeps_raw_text() {
        let raw = r#"{"sources": [{"url": "https://a.com/x"}]}"#;
        let parsed = parse_augmented(raw);
        assert_eq!(parsed.tier, ParseTier::StructuredJson);
        assert_eq!(parsed.answer, raw);
    }

    #[test]
    fn url_scan_tier() {
        let raw = "Plain prose citing https://example.com/report and more.";
        let parsed = parse_augmented(raw);
        assert_eq!(parsed.tier, ParseTier::UrlScan);
        assert_eq!(parsed.answer, raw);
        assert_eq!(parsed.raw_sources, vec!["https://example.com/report"]);
    }

    #[test]
    fn empty_tier() {
        let parsed = parse_augmented("no links here at all");
        assert_eq!(parsed.tier, ParseTier::Empty);
        assert!(parsed.raw_sources.is_empty());
    }

    #[test]
    fn sanitize_strips_markdown_links() {
        assert_eq!(
            sanitize_for_sheet("See [the report](https://a.com/r) for data."),
            "See the report for data."
        );
    }

    #[test]
    fn sanitize_collapses_whitespace_and_trims() {
        assert_eq!(sanitize_for_sheet("  a   b\n\n c  "), "a b c");
    }

    #[test]
    fn sanitize_keeps_single_spaces() {
        assert_eq!(sanitize_for_sheet("one two three"), "one two three");
    }
}
