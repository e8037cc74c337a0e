use regex::Regex;

use super::CharFilter;
use crate::error::Result;

/// Square-bracketed spans such as `[citation needed]`. No nesting: the span
/// ends at the first closing bracket.
pub const BRACKETED_SPAN_PATTERN: &str = r"\[[^\]]*\]";

/// A URL scheme followed by `://` and everything up to the next whitespace.
pub const URL_PATTERN: &str = r"(?i)[a-z][a-z0-9+.\-]*://\S+";

/// A char filter that replaces every match of a regex pattern.
#[derive(Clone, Debug)]
pub struct PatternReplaceCharFilter {
    pattern: Regex,
    replacement: String,
    name: &'static str,
}

impl PatternReplaceCharFilter {
    /// Create a new pattern replace char filter.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
            name: "pattern_replace",
        })
    }

    /// Filter removing bracketed citation spans.
    pub fn bracketed_spans() -> Result<Self> {
        Ok(Self::new(BRACKETED_SPAN_PATTERN, "")?.with_name("bracketed_spans"))
    }

    /// Filter removing protocol-prefixed URLs.
    pub fn urls() -> Result<Self> {
        Ok(Self::new(URL_PATTERN, "")?.with_name("urls"))
    }

    fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Get the regex pattern used by this filter.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl CharFilter for PatternReplaceCharFilter {
    fn filter(&self, input: &str) -> String {
        // `NoExpand` keeps `$` in the replacement literal.
        self.pattern
            .replace_all(input, regex::NoExpand(&self.replacement))
            .into_owned()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
