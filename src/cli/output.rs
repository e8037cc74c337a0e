//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, VerityArgs};
use crate::dataset::Label;
use crate::error::Result;
use crate::explore::{ExplorationReport, LengthStats, TermCount};
use crate::ml::bundle::Prediction;
use crate::pipeline::PipelineReport;

/// Results that have a human-readable rendering.
pub trait HumanOutput {
    fn to_human(&self) -> String;
}

/// One cleaned article.
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanedArticle {
    pub index: usize,
    pub label: Label,
    pub subject: String,
    pub cleaned: String,
}

/// Result structure for the clean command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanResult {
    pub total_articles: usize,
    pub empty_after_cleaning: usize,
    pub articles: Vec<CleanedArticle>,
}

/// Result structure for the train command.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainResult {
    pub report: PipelineReport,
    pub model_path: Option<String>,
    pub duration_ms: u64,
}

/// Result structure for the predict command.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResult {
    pub model_path: String,
    pub predictions: Vec<Prediction>,
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &VerityArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match args.output_format {
        OutputFormat::Human => {
            output_human(message, result, args);
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: HumanOutput>(message: &str, result: &T, args: &VerityArgs) {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }
    print!("{}", result.to_human());
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &VerityArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

impl HumanOutput for ExplorationReport {
    fn to_human(&self) -> String {
        let mut out = String::new();

        section(&mut out, "Dataset");
        let _ = writeln!(out, "Total articles: {}", self.total_articles);
        let _ = writeln!(out, "Fake: {}", self.labels.fake);
        let _ = writeln!(out, "Real: {}", self.labels.real);
        let _ = writeln!(
            out,
            "Twitter mentions: fake {}, real {}",
            self.twitter_mentions.fake, self.twitter_mentions.real
        );

        section(&mut out, "Subjects");
        let _ = writeln!(out, "{:<20} {:>8} {:>8}", "subject", "fake", "real");
        for subject in &self.subjects {
            let _ = writeln!(
                out,
                "{:<20} {:>8} {:>8}",
                subject.subject, subject.counts.fake, subject.counts.real
            );
        }

        term_list(&mut out, "Most common words", &self.top_words);
        term_list(&mut out, "Top unigrams", &self.top_unigrams);
        term_list(&mut out, "Top bigrams", &self.top_bigrams);
        term_list(&mut out, "Top trigrams", &self.top_trigrams);

        section(&mut out, "Lengths");
        length_line(&mut out, "words per article", &self.words_per_article.stats);
        length_line(&mut out, "fake characters", &self.fake_chars.stats);
        length_line(&mut out, "real characters", &self.real_chars.stats);
        length_line(&mut out, "fake body words", &self.fake_body_words.stats);
        length_line(&mut out, "real body words", &self.real_body_words.stats);
        let _ = writeln!(out, "Maximum article length: {} words", self.max_article_words);

        out
    }
}

impl HumanOutput for CleanResult {
    fn to_human(&self) -> String {
        let mut out = String::new();
        for article in &self.articles {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}",
                article.index, article.label, article.subject, article.cleaned
            );
        }
        let _ = writeln!(
            out,
            "\n{} articles, {} empty after cleaning",
            self.total_articles, self.empty_after_cleaning
        );
        out
    }
}

impl HumanOutput for TrainResult {
    fn to_human(&self) -> String {
        let report = &self.report;
        let mut out = String::new();

        section(&mut out, "Training");
        let _ = writeln!(out, "Classifier: {}", report.classifier);
        let _ = writeln!(
            out,
            "Records: {} ({} train, {} test)",
            report.total_records, report.train_records, report.test_records
        );
        let _ = writeln!(out, "Vocabulary size: {}", report.vocabulary_size);
        let _ = writeln!(out, "Sequence length: {}", report.sequence_length);

        let history = &report.training;
        for epoch in 0..history.epochs {
            let _ = write!(
                out,
                "epoch {:>3}: loss {:.4} acc {:.4}",
                epoch + 1,
                history.training_losses.get(epoch).copied().unwrap_or(f64::NAN),
                history.training_accuracies.get(epoch).copied().unwrap_or(f64::NAN),
            );
            if let (Some(loss), Some(acc)) = (
                history.validation_losses.get(epoch),
                history.validation_accuracies.get(epoch),
            ) {
                let _ = write!(out, " | val_loss {loss:.4} val_acc {acc:.4}");
            }
            if let Some(lr) = history.learning_rates.get(epoch) {
                let _ = write!(out, " | lr {lr:.6}");
            }
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "Training time: {}ms", history.training_time_ms);

        section(&mut out, "Evaluation");
        let _ = writeln!(out, "Accuracy: {:.4}", report.accuracy);
        let _ = writeln!(out);
        let _ = write!(out, "{}", report.confusion_matrix);
        let _ = writeln!(out);
        let _ = write!(out, "{}", report.classification_report);

        if let Some(path) = &self.model_path {
            let _ = writeln!(out, "\nModel saved to: {path}");
        }
        let _ = writeln!(out, "Total time: {}ms", self.duration_ms);
        out
    }
}

impl HumanOutput for PredictResult {
    fn to_human(&self) -> String {
        let mut out = String::new();
        for prediction in &self.predictions {
            let _ = writeln!(
                out,
                "{:<4} {:.4}  {}",
                prediction.label, prediction.probability_fake, prediction.cleaned
            );
        }
        out
    }
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}:");
    let _ = writeln!(out, "{}", "─".repeat(title.chars().count() + 1));
}

fn term_list(out: &mut String, title: &str, terms: &[TermCount]) {
    section(out, title);
    for term in terms {
        let _ = writeln!(out, "{:>8}  {}", term.count, term.term);
    }
}

fn length_line(out: &mut String, name: &str, stats: &LengthStats) {
    let _ = writeln!(
        out,
        "{:<18} n={} min={} max={} mean={:.1} median={:.1}",
        name, stats.count, stats.min, stats.max, stats.mean, stats.median
    );
}
