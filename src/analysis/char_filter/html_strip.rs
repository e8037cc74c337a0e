//! HTML markup removal.
//!
//! The filter runs in three passes:
//! 1. drop comments (`<!-- ... -->`, unterminated comments run to the end),
//! 2. decode character references (`&amp;`, `&lt;`, `&#8217;`, `&#x27;`, ...),
//! 3. drop anything shaped like a tag, `<` up to the next `>`.
//!
//! References are decoded before tags are dropped, so an escaped tag such as
//! `&lt;b&gt;` is removed as well and the output never contains `<...>`.
//! A `<` with no later `>` is ordinary text and survives.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::CharFilter;

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)").expect("valid comment pattern"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid entity pattern")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

/// A char filter that returns the text content of an HTML fragment.
#[derive(Clone, Debug, Default)]
pub struct HtmlStripCharFilter;

impl HtmlStripCharFilter {
    /// Create a new HTML strip char filter.
    pub fn new() -> Self {
        HtmlStripCharFilter
    }

    fn decode_entity(caps: &Captures<'_>) -> String {
        let body = &caps[1];
        let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = body.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match body {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                "ndash" => Some('–'),
                "mdash" => Some('—'),
                "lsquo" => Some('‘'),
                "rsquo" => Some('’'),
                "ldquo" => Some('“'),
                "rdquo" => Some('”'),
                "hellip" => Some('…'),
                _ => None,
            }
        };

        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    }
}

impl CharFilter for HtmlStripCharFilter {
    fn filter(&self, input: &str) -> String {
        if !input.contains('<') && !input.contains('&') {
            return input.to_string();
        }

        let without_comments = COMMENT.replace_all(input, "");
        let decoded = ENTITY.replace_all(&without_comments, Self::decode_entity);
        TAG.replace_all(&decoded, "").into_owned()
    }

    fn name(&self) -> &'static str {
        "html_strip"
    }
}
