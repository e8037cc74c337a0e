//! Article text normalizer.
//!
//! [`TextNormalizer`] turns a raw article into the cleaned string that the
//! vocabulary and the explorer consume. Steps, in order:
//!
//! 1. strip HTML markup,
//! 2. remove `[...]` spans,
//! 3. remove `scheme://...` URLs,
//! 4. split on whitespace and lowercase,
//! 5. drop stopwords and single punctuation characters,
//! 6. lemmatize according to [`LemmatizePolicy`],
//!
//! then the surviving tokens are joined with single spaces.
//!
//! # Examples
//!
//! ```
//! use verity::analysis::normalizer::TextNormalizer;
//!
//! let normalizer = TextNormalizer::with_defaults().unwrap();
//! let cleaned = normalizer
//!     .normalize("<p>The Senate [1] voted - see https://t.co/x</p>")
//!     .unwrap();
//!
//! assert_eq!(cleaned, "senate voted see");
//! ```

use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::char_filter::{HtmlStripCharFilter, PatternReplaceCharFilter};
use crate::analysis::token_filter::stop::DEFAULT_STOP_WORDS_SET;
use crate::analysis::token_filter::{
    LowercaseFilter, NounLemmatizer, StemFilter, Stemmer, StopFilter,
};
use crate::analysis::tokenizer::WhitespaceTokenizer;
use crate::config::NormalizerConfig;
use crate::error::Result;

/// How the lemmatizer is applied to a cleaned article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LemmatizePolicy {
    /// The joined string is lemmatized as one unit. A multi-word string
    /// comes back unchanged; a single-word string is lemmatized.
    #[default]
    WholeString,

    /// Each surviving token is lemmatized on its own.
    PerToken,

    /// No lemmatization.
    Disabled,
}

/// Cleans raw article text.
#[derive(Clone)]
pub struct TextNormalizer {
    analyzer: PipelineAnalyzer,
    lemmatizer: Arc<dyn Stemmer>,
    policy: LemmatizePolicy,
}

impl TextNormalizer {
    /// Build a normalizer from its configuration.
    pub fn new(config: &NormalizerConfig) -> Result<Self> {
        let mut analyzer = PipelineAnalyzer::new(Arc::new(WhitespaceTokenizer::new()))
            .with_name("article_normalizer");

        if config.strip_html {
            analyzer = analyzer.add_char_filter(Arc::new(HtmlStripCharFilter::new()));
        }
        if config.remove_bracketed_spans {
            analyzer = analyzer.add_char_filter(Arc::new(PatternReplaceCharFilter::bracketed_spans()?));
        }
        if config.remove_urls {
            analyzer = analyzer.add_char_filter(Arc::new(PatternReplaceCharFilter::urls()?));
        }

        analyzer = analyzer.add_filter(Arc::new(LowercaseFilter::new()));

        if config.remove_stop_words {
            let stop_filter = if config.extra_stop_words.is_empty() {
                StopFilter::new()
            } else {
                let mut words = DEFAULT_STOP_WORDS_SET.clone();
                words.extend(config.extra_stop_words.iter().map(|w| w.trim().to_lowercase()));
                StopFilter::with_stop_words(words)
            };
            analyzer = analyzer.add_filter(Arc::new(stop_filter));
        }

        let lemmatizer: Arc<dyn Stemmer> = Arc::new(NounLemmatizer::new());
        if config.lemmatize == LemmatizePolicy::PerToken {
            analyzer = analyzer.add_filter(Arc::new(StemFilter::with_stemmer(Arc::clone(&lemmatizer))));
        }

        debug!("built text normalizer: {analyzer:?}, lemmatize={:?}", config.lemmatize);

        Ok(TextNormalizer {
            analyzer,
            lemmatizer,
            policy: config.lemmatize,
        })
    }

    /// Build a normalizer with the default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&NormalizerConfig::default())
    }

    /// The lemmatization policy in use.
    pub fn policy(&self) -> LemmatizePolicy {
        self.policy
    }

    /// Clean one text.
    pub fn normalize(&self, raw: &str) -> Result<String> {
        let words: Vec<String> = self.analyzer.analyze(raw)?.map(|token| token.text).collect();
        let joined = words.join(" ");

        match self.policy {
            LemmatizePolicy::WholeString => Ok(self.lemmatizer.stem(&joined)),
            LemmatizePolicy::PerToken | LemmatizePolicy::Disabled => Ok(joined),
        }
    }

    /// Clean many texts in parallel. Output order matches input order.
    pub fn normalize_all<S>(&self, texts: &[S]) -> Result<Vec<String>>
    where
        S: AsRef<str> + Sync,
    {
        let cleaned: Vec<String> = texts
            .par_iter()
            .map(|text| self.normalize(text.as_ref()))
            .collect::<Result<_>>()?;

        let empty = cleaned.iter().filter(|text| text.is_empty()).count();
        if empty > 0 {
            warn!("{empty} of {} texts are empty after cleaning", cleaned.len());
        }

        Ok(cleaned)
    }
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("analyzer", &self.analyzer)
            .field("lemmatizer", &self.lemmatizer.name())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer(policy: LemmatizePolicy) -> TextNormalizer {
        TextNormalizer::new(&NormalizerConfig::default().with_lemmatize(policy)).unwrap()
    }

    #[test]
    fn test_full_pipeline() {
        let n = TextNormalizer::with_defaults().unwrap();
        let raw = "<div>WASHINGTON (Reuters) - The <b>Senate</b> voted [citation needed] \
                   on Tuesday, see http://reut.rs/2xyz for details.</div>";

        assert_eq!(
            n.normalize(raw).unwrap(),
            "washington (reuters) senate voted tuesday, see details."
        );
    }

    #[test]
    fn test_empty_input() {
        let n = TextNormalizer::with_defaults().unwrap();
        assert_eq!(n.normalize("").unwrap(), "");
        assert_eq!(n.normalize("   \n\t ").unwrap(), "");
        assert_eq!(n.normalize("the and of").unwrap(), "");
    }

    #[test]
    fn test_whole_string_policy() {
        let n = normalizer(LemmatizePolicy::WholeString);
        // Multi-word strings pass through untouched.
        assert_eq!(n.normalize("Senators debate bills").unwrap(), "senators debate bills");
        // A single surviving word is lemmatized.
        assert_eq!(n.normalize("The senators").unwrap(), "senator");
        assert_eq!(n.normalize("The Texas").unwrap(), "texas");
    }

    #[test]
    fn test_per_token_policy() {
        let n = normalizer(LemmatizePolicy::PerToken);
        assert_eq!(n.normalize("Senators debate bills").unwrap(), "senator debate bill");
        assert_eq!(
            n.normalize("Texas movies show bias").unwrap(),
            "texas movie show bias"
        );
    }

    #[test]
    fn test_disabled_policy() {
        let n = normalizer(LemmatizePolicy::Disabled);
        assert_eq!(n.normalize("The senators").unwrap(), "senators");
    }

    #[test]
    fn test_toggles() {
        let config = NormalizerConfig {
            strip_html: false,
            remove_urls: false,
            remove_stop_words: false,
            ..NormalizerConfig::default()
        };
        let n = TextNormalizer::new(&config).unwrap();

        assert_eq!(
            n.normalize("<b>The</b> http://x.y").unwrap(),
            "<b>the</b> http://x.y"
        );
    }

    #[test]
    fn test_extra_stop_words() {
        let config = NormalizerConfig::default().with_extra_stop_words(["Reuters", "said"]);
        let n = TextNormalizer::new(&config).unwrap();
        assert_eq!(n.normalize("Reuters said the vote passed").unwrap(), "vote passed");
    }

    #[test]
    fn test_normalize_all_preserves_order() {
        let n = TextNormalizer::with_defaults().unwrap();
        let texts: Vec<String> = (0..200).map(|i| format!("Article number{i} the")).collect();

        let cleaned = n.normalize_all(&texts).unwrap();

        assert_eq!(cleaned.len(), 200);
        for (i, text) in cleaned.iter().enumerate() {
            assert_eq!(text, &format!("article number{i}"));
        }
    }
}
