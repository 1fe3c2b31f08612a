//! Source-URL hygiene: normalization, text scanning, dedupe.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Maximum number of sources kept per answer.
pub const MAX_SOURCES: usize = 5;

/// Query parameters stripped during normalization.
fn is_tracking_param(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower.starts_with("utm_") || lower == "gclid" || lower == "fbclid"
}

/// Normalize a raw URL: lowercase the host, drop a leading `www.`,
/// remove tracking query parameters, strip a single trailing slash from
/// non-root paths and clear a bare fragment. Unparseable input yields `None`.
///
/// Idempotent: normalizing a normalized URL is a no-op.
pub fn normalize(raw: &str) -> Option<String> {
    let mut u = Url::parse(raw.trim()).ok()?;

    if let Some(host) = u.host_str() {
        let lowered = host.to_lowercase();
        let stripped = lowered.strip_prefix("www.").unwrap_or(&lowered).to_string();
        u.set_host(Some(&stripped)).ok()?;
    }

    let kept: Vec<(String, String)> = u
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        u.set_query(None);
    } else {
        let mut pairs = u.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        drop(pairs);
    }

    let path = u.path().to_string();
    if path != "/" && path.ends_with('/') {
        u.set_path(path.trim_end_matches('/'));
    }

    if matches!(u.fragment(), Some("")) {
        u.set_fragment(None);
    }

    Some(u.to_string())
}

/// Scan free text for URL-looking substrings.
pub fn extract_from_text(text: &str) -> Vec<String> {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    let re = URL_RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s)\]>"']+"#).expect("url pattern is valid")
    });
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Normalize every URL, deduplicate by normalized form preserving
/// first-seen order, and truncate to [`MAX_SOURCES`]. URLs that fail to
/// parse are dropped silently.
pub fn dedupe_and_normalize<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in raw {
        let Some(u) = normalize(item.as_ref()) else {
            continue;
        };
        if seen.insert(u.clone()) {
            out.push(u);
        }
        if out.len() == MAX_SOURCES {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_www_and_tracking_params() {
        assert_eq!(
            normalize("https://WWW.Example.com/x/?utm_source=a").unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn normalize_keeps_meaningful_query() {
        assert_eq!(
            normalize("https://example.com/search?q=rust&utm_medium=email").unwrap(),
            "https://example.com/search?q=rust"
        );
    }

    #[test]
    fn normalize_drops_gclid_and_fbclid() {
        assert_eq!(
            normalize("https://example.com/p?gclid=1&fbclid=2").unwrap(),
            "https://example.com/p"
        );
    }

    #[test]
    fn normalize_keeps_root_slash() {
        assert_eq!(normalize("https://example.com/").unwrap(), "https://example.com/");
    }

    #[test]
    fn normalize_clears_bare_fragment() {
        assert_eq!(normalize("https://example.com/a#").unwrap(), "https://example.com/a");
        assert_eq!(
            normalize("https://example.com/a#section").unwrap(),
            "https://example.com/a#section"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "https://WWW.Example.com/x/?utm_source=a",
            "http://example.com/a/b/",
            "https://example.com/search?q=rust&page=2",
            "https://example.com/#",
        ];
        for raw in inputs {
            let once = normalize(raw).unwrap();
            assert_eq!(normalize(&once).unwrap(), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert_eq!(normalize("not a url"), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn extract_finds_urls_in_prose() {
        let text = "See https://example.com/a and (http://foo.org/b) for details.";
        assert_eq!(
            extract_from_text(text),
            vec!["https://example.com/a", "http://foo.org/b"]
        );
    }

    #[test]
    fn extract_stops_at_quotes_and_brackets() {
        let text = r#"link: "https://example.com/x" [https://example.com/y]"#;
        assert_eq!(
            extract_from_text(text),
            vec!["https://example.com/x", "https://example.com/y"]
        );
    }

    #[test]
    fn dedupe_preserves_order_and_caps_at_five() {
        // 7 inputs with 2 duplicates after normalization -> 5 unique, in order.
        let raw = vec![
            "https://a.com/1",
            "https://WWW.a.com/1/", // dup of the first after normalization
            "https://b.com/2",
            "https://c.com/3",
            "https://b.com/2?utm_source=x", // dup of b.com/2
            "https://d.com/4",
            "https://e.com/5",
        ];
        assert_eq!(
            dedupe_and_normalize(raw),
            vec![
                "https://a.com/1",
                "https://b.com/2",
                "https://c.com/3",
                "https://d.com/4",
                "https://e.com/5",
            ]
        );
    }

    #[test]
    fn dedupe_drops_unparseable_silently() {
        let raw = vec!["nope", "https://ok.com/x"];
        assert_eq!(dedupe_and_normalize(raw), vec!["https://ok.com/x"]);
    }
}
