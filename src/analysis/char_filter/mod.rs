//! Char filter implementations for raw-text cleanup.
//!
//! Char filters rewrite the text string before it reaches the tokenizer.
//! They never fail: a filter that cannot make sense of its input returns a
//! best-effort result.
//!
//! # Available Filters
//!
//! - [`html_strip::HtmlStripCharFilter`] - Removes HTML markup, keeps text content
//! - [`pattern_replace::PatternReplaceCharFilter`] - Regex-based replacement, also
//!   used for bracketed citation and URL removal
//!
//! # Examples
//!
//! ```
//! use verity::analysis::char_filter::CharFilter;
//! use verity::analysis::char_filter::pattern_replace::PatternReplaceCharFilter;
//!
//! let filter = PatternReplaceCharFilter::bracketed_spans().unwrap();
//! assert_eq!(filter.filter("Reuters [citation needed] reports"), "Reuters  reports");
//! ```

/// Rewrites raw article text before tokenization.
pub trait CharFilter: Send + Sync {
    fn filter(&self, input: &str) -> String;

    fn name(&self) -> &'static str;
}

pub mod html_strip;
pub mod pattern_replace;

pub use html_strip::HtmlStripCharFilter;
pub use pattern_replace::PatternReplaceCharFilter;
