//! Labeled news articles.
//!
//! Articles come from two CSV files, one of real news and one of fake news.
//! The label is assigned by the file an article was read from and is never
//! computed from its content.

pub mod loader;
pub mod splitter;

pub use loader::{DatasetLoader, REQUIRED_COLUMNS};
pub use splitter::{Split, train_test_split};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary article label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Fake,
    Real,
}

impl Label {
    /// Both labels in matrix order: fake first.
    pub const ALL: [Label; 2] = [Label::Fake, Label::Real];

    /// Row/column index in a confusion matrix.
    pub fn index(self) -> usize {
        match self {
            Label::Fake => 0,
            Label::Real => 1,
        }
    }

    pub fn is_fake(self) -> bool {
        self == Label::Fake
    }

    pub fn from_is_fake(is_fake: bool) -> Self {
        if is_fake { Label::Fake } else { Label::Real }
    }

    /// Training target for the classifier: 1.0 for fake.
    pub fn target(self) -> f32 {
        if self.is_fake() { 1.0 } else { 0.0 }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Fake => "fake",
            Label::Real => "real",
        }
    }
}

impl From<bool> for Label {
    fn from(is_fake: bool) -> Self {
        Label::from_is_fake(is_fake)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub body: String,
    pub subject: String,
    pub label: Label,
}

impl Article {
    pub fn new<T, B, S>(title: T, body: B, subject: S, label: Label) -> Self
    where
        T: Into<String>,
        B: Into<String>,
        S: Into<String>,
    {
        Article {
            title: title.into(),
            body: body.into(),
            subject: subject.into(),
            label,
        }
    }

    /// Title and body joined by a single space, the text that gets cleaned.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }
}

/// All articles of a run: real articles first, then fake ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    articles: Vec<Article>,
}

impl Corpus {
    /// Concatenate real and fake articles, real first.
    pub fn from_parts(real: Vec<Article>, fake: Vec<Article>) -> Self {
        let mut articles = real;
        articles.extend(fake);
        Corpus { articles }
    }

    pub fn from_articles(articles: Vec<Article>) -> Self {
        Corpus { articles }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Article> {
        self.articles.iter()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Labels in corpus order.
    pub fn labels(&self) -> Vec<Label> {
        self.articles.iter().map(|a| a.label).collect()
    }

    /// `title + " " + body` for every article, in corpus order.
    pub fn full_texts(&self) -> Vec<String> {
        self.articles.iter().map(Article::full_text).collect()
    }

    /// Number of articles carrying `label`.
    pub fn count(&self, label: Label) -> usize {
        self.articles.iter().filter(|a| a.label == label).count()
    }

    /// Articles with the given label, in corpus order.
    pub fn with_label(&self, label: Label) -> impl Iterator<Item = &Article> {
        self.articles.iter().filter(move |a| a.label == label)
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Article;
    type IntoIter = std::slice::Iter<'a, Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.articles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_conventions() {
        assert_eq!(Label::Fake.index(), 0);
        assert_eq!(Label::Real.index(), 1);
        assert_eq!(Label::from(true), Label::Fake);
        assert_eq!(Label::from(false), Label::Real);
        assert_eq!(Label::Fake.target(), 1.0);
        assert_eq!(Label::Real.to_string(), "real");
        assert_eq!(serde_json::to_string(&Label::Fake).unwrap(), "\"fake\"");
    }

    #[test]
    fn test_corpus_order_real_first() {
        let real = vec![Article::new("r1", "body", "politicsNews", Label::Real)];
        let fake = vec![
            Article::new("f1", "body", "News", Label::Fake),
            Article::new("f2", "body", "News", Label::Fake),
        ];

        let corpus = Corpus::from_parts(real, fake);

        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.labels(), vec![Label::Real, Label::Fake, Label::Fake]);
        assert_eq!(corpus.count(Label::Fake), 2);
        assert_eq!(corpus.with_label(Label::Real).count(), 1);
        assert_eq!(corpus.full_texts()[0], "r1 body");
    }
}
