//! Text cleaning for GLPI fields.
//!
//! Every text field goes through:
//!   entity decoding → tag removal → whitespace collapse → invisible-char removal
//! and description bodies are additionally truncated to [`DESCRICAO_MAX_CHARS`].
//! Quote escaping happens when the flat table is written (see `export::tickets_csv`).

use std::sync::LazyLock;

use regex::Regex;

pub const DESCRICAO_MAX_CHARS: usize = 500;
const ELLIPSIS: &str = "...";

// ── Static regex ──────────────────────────────────────────────────────────────

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("TAG_REGEX: invalid pattern"));

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_REGEX: invalid pattern"));

static INVISIBLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\u{200B}-\u{200F}\u{2028}-\u{202F}\u{205F}-\u{206F}\u{FEFF}]")
        .expect("INVISIBLE_REGEX: invalid pattern")
});

/// Decode HTML5 named and numeric character references. Unknown or invalid
/// references are left as-is.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Generic `<...>` removal, replaced by a space so adjacent words stay apart.
pub fn strip_tags(text: &str) -> String {
    TAG_REGEX.replace_all(text, " ").into_owned()
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").into_owned()
}

pub fn strip_invisible(text: &str) -> String {
    INVISIBLE_REGEX.replace_all(text, "").into_owned()
}

/// Cut to `max` characters, the last three being `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

fn clean(text: &str) -> String {
    let decoded = decode_entities(text);
    let untagged = strip_tags(&decoded);
    let collapsed = collapse_whitespace(&untagged);
    strip_invisible(&collapsed).trim().to_string()
}

/// Clean a short text field (title, names, labels). Not length-limited.
pub fn clean_field(text: &str) -> String {
    clean(text)
}

/// Clean a description body and truncate it to [`DESCRICAO_MAX_CHARS`].
pub fn clean_description(text: &str) -> String {
    truncate_chars(&clean(text), DESCRICAO_MAX_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_round_trip() {
        assert_eq!(clean_field("<b>Café &amp; Chá</b>\n\tOK"), "Café & Chá OK");
        assert_eq!(clean_description("<b>Café &amp; Chá</b>\n\tOK"), "Café & Chá OK");
    }

    #[test]
    fn test_decode_named_and_numeric() {
        assert_eq!(decode_entities("S&atilde;o Jo&#227;o &#x41;"), "São João A");
        assert_eq!(decode_entities("a &lt; b &gt; c"), "a < b > c");
    }

    #[test]
    fn test_decode_latin1_and_symbol_entities() {
        assert_eq!(
            decode_entities("&copy; &reg; &shy; &Uuml; &times; &ugrave; &sup2;"),
            "© ® \u{AD} Ü × ù ²"
        );
        assert_eq!(decode_entities("&mdash;&hellip;&euro;"), "\u{2014}…€");
    }

    #[test]
    fn test_decode_unknown_entity_kept() {
        assert_eq!(decode_entities("&foo; &#xZZ;"), "&foo; &#xZZ;");
        assert_eq!(decode_entities("R&D"), "R&D");
    }

    #[test]
    fn test_encoded_markup_is_stripped_after_decoding() {
        // GLPI stores rich text escaped.
        let body = "&lt;p&gt;Sem acesso&lt;/p&gt;&lt;p&gt;ao sistema&lt;/p&gt;";
        assert_eq!(clean_description(body), "Sem acesso ao sistema");
    }

    #[test]
    fn test_nbsp_collapses() {
        assert_eq!(clean_field("a&nbsp;&nbsp;b"), "a b");
    }

    #[test]
    fn test_strip_invisible() {
        assert_eq!(clean_field("zero\u{200B}width\u{FEFF} ok\u{2028}"), "zerowidth ok");
    }

    #[test]
    fn test_quotes_are_kept_verbatim() {
        assert_eq!(clean_field("monitor \"Dell\""), "monitor \"Dell\"");
    }

    #[test]
    fn test_description_truncation() {
        let long = "x".repeat(600);
        let out = clean_description(&long);
        assert_eq!(out.chars().count(), 500);
        assert!(out.ends_with("..."));
        assert_eq!(&out[..497], &"x".repeat(497));
    }

    #[test]
    fn test_description_truncation_counts_chars() {
        let long = "ç".repeat(501);
        let out = clean_description(&long);
        assert_eq!(out.chars().count(), 500);
    }

    #[test]
    fn test_description_at_limit_untouched() {
        let exact = "y".repeat(500);
        assert_eq!(clean_description(&exact), exact);
    }

    #[test]
    fn test_fields_are_not_truncated() {
        let long = "t".repeat(800);
        assert_eq!(clean_field(&long).len(), 800);
    }
}
