//! CSV dataset loader.
//!
//! Each file has a header row with at least these columns:
//! ```csv
//! title,text,subject,date
//! "Senate passes bill","WASHINGTON (Reuters) - ...",politicsNews,"December 31, 2017 "
//! ```
//! Extra columns are ignored. `date` must be present but is dropped.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};

use crate::dataset::{Article, Corpus, Label};
use crate::error::{Result, VerityError};

/// Columns every dataset file must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = ["title", "text", "subject", "date"];

/// Column positions resolved from a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    title: usize,
    text: usize,
    subject: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, source: &str) -> Result<Self> {
        let position = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| VerityError::missing_column(source, column))
        };

        for column in REQUIRED_COLUMNS {
            position(column)?;
        }

        Ok(ColumnIndex {
            title: position("title")?,
            text: position("text")?,
            subject: position("subject")?,
        })
    }
}

/// Reads labeled articles from CSV.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    /// CSV delimiter character (default: ',')
    delimiter: u8,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    /// Create a new loader with comma delimiter.
    pub fn new() -> Self {
        DatasetLoader { delimiter: b',' }
    }

    /// Set a custom delimiter character.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load both files and concatenate them, real articles first.
    pub fn load_corpus<P: AsRef<Path>, Q: AsRef<Path>>(&self, real: P, fake: Q) -> Result<Corpus> {
        let real = self.load_file(real, Label::Real)?;
        let fake = self.load_file(fake, Label::Fake)?;
        info!("loaded {} real and {} fake articles", real.len(), fake.len());
        Ok(Corpus::from_parts(real, fake))
    }

    /// Load every row of one file, labeling each article with `label`.
    pub fn load_file<P: AsRef<Path>>(&self, path: P, label: Label) -> Result<Vec<Article>> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            VerityError::dataset(format!("failed to open {}: {e}", path.display()))
        })?;
        self.load_reader(file, &path.display().to_string(), label)
    }

    /// Load articles from any reader. `source` names the input in errors.
    pub fn load_reader<R: Read>(&self, reader: R, source: &str, label: Label) -> Result<Vec<Article>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::Headers)
            .flexible(false)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let columns = ColumnIndex::resolve(&headers, source)?;

        let mut articles = Vec::new();
        for record in reader.records() {
            let record = record?;
            let field = |i: usize| record.get(i).unwrap_or_default().to_string();
            articles.push(Article {
                title: field(columns.title),
                body: field(columns.text),
                subject: field(columns.subject),
                label,
            });
        }

        debug!("read {} {label} articles from {source}", articles.len());
        Ok(articles)
    }
}
