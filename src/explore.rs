//! Descriptive statistics over a loaded corpus.
//!
//! Everything here is read-only: the explorer never changes articles or
//! cleaned text. The results are plain serializable structs that a chart
//! layer or the CLI can render.

use std::sync::{Arc, LazyLock};

use ahash::AHashMap;
use log::debug;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::token_filter::LowercaseFilter;
use crate::analysis::tokenizer::{RegexTokenizer, UnicodeWordTokenizer};
use crate::dataset::{Article, Corpus, Label};
use crate::error::{Result, VerityError};

static TWITTER_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("valid mention pattern"));

/// Bins used for the words-per-article histogram.
pub const WORD_HISTOGRAM_BINS: usize = 100;

/// Bins used for the per-label character histograms.
pub const CHAR_HISTOGRAM_BINS: usize = 10;

/// A term and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// Articles per label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub fake: usize,
    pub real: usize,
}

impl LabelCounts {
    pub fn get(&self, label: Label) -> usize {
        match label {
            Label::Fake => self.fake,
            Label::Real => self.real,
        }
    }

    fn add(&mut self, label: Label, n: usize) {
        match label {
            Label::Fake => self.fake += n,
            Label::Real => self.real += n,
        }
    }

    pub fn total(&self) -> usize {
        self.fake + self.real
    }
}

/// Articles of one subject, split by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCount {
    pub subject: String,
    pub counts: LabelCounts,
}

/// Summary of a list of lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LengthStats {
    pub count: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub median: f64,
}

impl LengthStats {
    pub fn from_lengths(lengths: &[usize]) -> Self {
        if lengths.is_empty() {
            return LengthStats::default();
        }
        let mut sorted = lengths.to_vec();
        sorted.sort_unstable();
        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2] as f64
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
        };
        LengthStats {
            count: n,
            min: sorted[0],
            max: sorted[n - 1],
            mean: sorted.iter().sum::<usize>() as f64 / n as f64,
            median,
        }
    }
}

/// One histogram bin covering `[start, end)`; the last bin also includes `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram between the smallest and largest value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn equal_width(values: &[usize], bins: usize) -> Self {
        let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
            return Histogram::default();
        };
        if bins == 0 {
            return Histogram::default();
        }

        let (low, high) = if min == max {
            (min as f64 - 0.5, max as f64 + 0.5)
        } else {
            (min as f64, max as f64)
        };
        let width = (high - low) / bins as f64;

        let mut counts = vec![0usize; bins];
        for &v in values {
            let i = (((v as f64 - low) / width) as usize).min(bins - 1);
            counts[i] += 1;
        }

        Histogram {
            bins: counts
                .into_iter()
                .enumerate()
                .map(|(i, count)| HistogramBin {
                    start: low + width * i as f64,
                    end: low + width * (i + 1) as f64,
                    count,
                })
                .collect(),
        }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Length statistics of one label's articles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LengthBreakdown {
    pub stats: LengthStats,
    pub histogram: Histogram,
}

impl LengthBreakdown {
    fn new(lengths: &[usize], bins: usize) -> Self {
        LengthBreakdown {
            stats: LengthStats::from_lengths(lengths),
            histogram: Histogram::equal_width(lengths, bins),
        }
    }
}

/// Everything the explorer reports for a corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationReport {
    pub total_articles: usize,
    pub labels: LabelCounts,
    pub subjects: Vec<SubjectCount>,
    /// `@username` mentions in article bodies, per label.
    pub twitter_mentions: LabelCounts,
    pub top_words: Vec<TermCount>,
    pub top_unigrams: Vec<TermCount>,
    pub top_bigrams: Vec<TermCount>,
    pub top_trigrams: Vec<TermCount>,
    /// Word tokens per cleaned article, punctuation included.
    pub words_per_article: LengthBreakdown,
    /// Longest cleaned article in word tokens.
    pub max_article_words: usize,
    pub fake_chars: LengthBreakdown,
    pub real_chars: LengthBreakdown,
    /// Whitespace-separated words per raw article body.
    pub fake_body_words: LengthBreakdown,
    pub real_body_words: LengthBreakdown,
}

/// Computes descriptive statistics.
#[derive(Clone)]
pub struct CorpusExplorer {
    ngram_analyzer: PipelineAnalyzer,
    word_counter: UnicodeWordTokenizer,
}

impl std::fmt::Debug for CorpusExplorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusExplorer")
            .field("ngram_analyzer", &self.ngram_analyzer)
            .finish()
    }
}

impl CorpusExplorer {
    pub fn new() -> Result<Self> {
        let ngram_analyzer = PipelineAnalyzer::new(Arc::new(RegexTokenizer::count_vectorizer()?))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .with_name("ngram_terms");

        Ok(CorpusExplorer {
            ngram_analyzer,
            word_counter: UnicodeWordTokenizer::new().keep_punctuation(true),
        })
    }

    /// Total `@username` mentions across the bodies of `articles`.
    pub fn twitter_mention_count<'a, I>(&self, articles: I) -> usize
    where
        I: IntoIterator<Item = &'a Article>,
    {
        articles
            .into_iter()
            .map(|a| TWITTER_MENTION.find_iter(&a.body).count())
            .sum()
    }

    pub fn label_distribution(&self, corpus: &Corpus) -> LabelCounts {
        let mut counts = LabelCounts::default();
        for article in corpus {
            counts.add(article.label, 1);
        }
        counts
    }

    /// Subject × label counts, subjects in order of first appearance.
    pub fn subject_breakdown(&self, corpus: &Corpus) -> Vec<SubjectCount> {
        let mut position: AHashMap<&str, usize> = AHashMap::new();
        let mut subjects: Vec<SubjectCount> = Vec::new();

        for article in corpus {
            let i = *position.entry(article.subject.as_str()).or_insert_with(|| {
                subjects.push(SubjectCount {
                    subject: article.subject.clone(),
                    counts: LabelCounts::default(),
                });
                subjects.len() - 1
            });
            subjects[i].counts.add(article.label, 1);
        }
        subjects
    }

    /// The `k` most frequent whitespace-delimited words, ties by first occurrence.
    pub fn most_common_words<S: AsRef<str>>(&self, texts: &[S], k: usize) -> Vec<TermCount> {
        let mut counter = TermCounter::default();
        for text in texts {
            for word in text.as_ref().split_whitespace() {
                counter.add(word);
            }
        }
        counter.top(k)
    }

    /// The `k` most frequent `n`-grams of count-vectorizer terms.
    ///
    /// Terms are lowercase runs of two or more word characters; n-grams never
    /// cross document boundaries.
    pub fn top_ngrams<S: AsRef<str>>(&self, texts: &[S], n: usize, k: usize) -> Result<Vec<TermCount>> {
        if n == 0 {
            return Err(VerityError::invalid_argument("n-gram size must be at least 1"));
        }

        let mut counter = TermCounter::default();
        for text in texts {
            let terms: Vec<String> = self
                .ngram_analyzer
                .analyze(text.as_ref())?
                .map(|t| t.text)
                .collect();
            for window in terms.windows(n) {
                counter.add(&window.join(" "));
            }
        }
        Ok(counter.top(k))
    }

    /// Word tokens in `text`, punctuation counted as tokens.
    pub fn word_count(&self, text: &str) -> usize {
        self.word_counter.count(text)
    }

    /// Full report. `cleaned[i]` must be the cleaned text of article `i`.
    pub fn explore<S>(&self, corpus: &Corpus, cleaned: &[S], top_k: usize) -> Result<ExplorationReport>
    where
        S: AsRef<str> + Sync,
    {
        if cleaned.len() != corpus.len() {
            return Err(VerityError::length_mismatch(cleaned.len(), corpus.len()));
        }

        let word_counts: Vec<usize> = cleaned
            .par_iter()
            .map(|text| self.word_count(text.as_ref()))
            .collect();

        let mut chars: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        let mut body_words: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        for (article, text) in corpus.iter().zip(cleaned) {
            let i = article.label.index();
            chars[i].push(text.as_ref().chars().count());
            body_words[i].push(article.body.split_whitespace().count());
        }

        let mut twitter_mentions = LabelCounts::default();
        for label in Label::ALL {
            twitter_mentions.add(label, self.twitter_mention_count(corpus.with_label(label)));
        }

        let report = ExplorationReport {
            total_articles: corpus.len(),
            labels: self.label_distribution(corpus),
            subjects: self.subject_breakdown(corpus),
            twitter_mentions,
            top_words: self.most_common_words(cleaned, top_k),
            top_unigrams: self.top_ngrams(cleaned, 1, top_k)?,
            top_bigrams: self.top_ngrams(cleaned, 2, top_k)?,
            top_trigrams: self.top_ngrams(cleaned, 3, top_k)?,
            max_article_words: word_counts.iter().copied().max().unwrap_or(0),
            words_per_article: LengthBreakdown::new(&word_counts, WORD_HISTOGRAM_BINS),
            fake_chars: LengthBreakdown::new(&chars[Label::Fake.index()], CHAR_HISTOGRAM_BINS),
            real_chars: LengthBreakdown::new(&chars[Label::Real.index()], CHAR_HISTOGRAM_BINS),
            fake_body_words: LengthBreakdown::new(&body_words[Label::Fake.index()], CHAR_HISTOGRAM_BINS),
            real_body_words: LengthBreakdown::new(&body_words[Label::Real.index()], CHAR_HISTOGRAM_BINS),
        };

        debug!(
            "explored {} articles: {} subjects, {} real / {} fake mentions",
            report.total_articles,
            report.subjects.len(),
            report.twitter_mentions.real,
            report.twitter_mentions.fake
        );
        Ok(report)
    }
}

/// Counts terms, remembering first occurrence for tie-breaking.
#[derive(Default)]
struct TermCounter {
    counts: AHashMap<String, (usize, usize)>,
}

impl TermCounter {
    fn add(&mut self, term: &str) {
        let next = self.counts.len();
        if let Some(entry) = self.counts.get_mut(term) {
            entry.0 += 1;
        } else {
            self.counts.insert(term.to_string(), (1, next));
        }
    }

    fn top(self, k: usize) -> Vec<TermCount> {
        let mut ranked: Vec<(String, usize, usize)> = self
            .counts
            .into_iter()
            .map(|(term, (count, first))| (term, count, first))
            .collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked
            .into_iter()
            .take(k)
            .map(|(term, count, _)| TermCount { term, count })
            .collect()
    }
}
