//! Brand-mention classifier.
//!
//! Pure string matching over an answer text: reports whether the special
//! brand shows up (with or without internal whitespace, any case) and
//! which other brands from the watch list are mentioned on word
//! boundaries. No concurrency, no failure semantics.

use regex::{Regex, RegexBuilder};

/// The distinguished brand reported in the `SC=` field of every
/// classification, excluded from the generic hit list.
pub const SPECIAL_BRAND: &str = "Sales Captain";

/// Precompiled matcher for one run's brand list.
pub struct BrandMatcher {
    brands: Vec<String>,
    brand_res: Vec<Regex>,
    special_re: Regex,
    special_name_re: Regex,
}

impl BrandMatcher {
    /// Compile word-boundary patterns for each brand plus the relaxed
    /// pattern for the special brand. Brands whose names fail to compile
    /// (practically unreachable after escaping) are matched literally never.
    pub fn new(brands: Vec<String>) -> Self {
        let brand_res = brands
            .iter()
            .map(|b| {
                let escaped = regex::escape(b);
                RegexBuilder::new(&format!(r"\b{escaped}\b"))
                    .case_insensitive(true)
                    .build()
                    .unwrap_or_else(|_| never_matching())
            })
            .collect();
        Self {
            brands,
            brand_res,
            special_re: special_brand_pattern(SPECIAL_BRAND),
            special_name_re: RegexBuilder::new(&format!("^{}$", relaxed_spacing(SPECIAL_BRAND)))
                .case_insensitive(true)
                .build()
                .unwrap_or_else(|_| never_matching()),
        }
    }

    /// Classify one answer text into `"SC=Yes|No | Brands=a, b"`.
    pub fn analyze(&self, text: &str) -> String {
        if text.is_empty() {
            return "SC=No | Brands=".to_string();
        }
        let special = self.special_re.is_match(text);
        let mut hits = Vec::new();
        for (brand, re) in self.brands.iter().zip(&self.brand_res) {
            // The special brand is reported in its own field, not the list.
            if self.special_name_re.is_match(brand) {
                continue;
            }
            if re.is_match(text) {
                hits.push(brand.as_str());
            }
        }
        format!(
            "SC={} | Brands={}",
            if special { "Yes" } else { "No" },
            hits.join(", ")
        )
    }
}

/// `Sales Captain` → matches "Sales Captain", "sales  captain" and
/// "salescaptain": word-bounded with optional internal whitespace, plus
/// the squashed lowercase form.
fn special_brand_pattern(name: &str) -> Regex {
    let spaced = relaxed_spacing(name);
    let squashed = regex::escape(&name.split_whitespace().collect::<String>());
    RegexBuilder::new(&format!(r"(?:\b{spaced}\b|{squashed})"))
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|_| never_matching())
}

/// Join the escaped words of a name with `\s*`.
fn relaxed_spacing(name: &str) -> String {
    name.split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s*")
}

fn never_matching() -> Regex {
    Regex::new(r"\z.").expect("never-matching pattern is valid")
}
