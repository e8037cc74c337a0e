//! Command implementations for the verity CLI.

use std::path::Path;
use std::time::Instant;

use log::info;

use crate::analysis::normalizer::TextNormalizer;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::PipelineConfig;
use crate::dataset::{Corpus, DatasetLoader};
use crate::error::{Result, VerityError};
use crate::explore::CorpusExplorer;
use crate::ml::bundle::ModelBundle;
use crate::pipeline::Pipeline;

/// Execute a CLI command.
pub fn execute_command(args: VerityArgs) -> Result<()> {
    match &args.command {
        Command::Explore(explore_args) => explore_dataset(explore_args, &args),
        Command::Clean(clean_args) => clean_dataset(clean_args, &args),
        Command::Train(train_args) => train_model(train_args, &args),
        Command::Predict(predict_args) => predict_texts(predict_args, &args),
    }
}

/// Show descriptive statistics of a dataset.
fn explore_dataset(args: &ExploreArgs, cli_args: &VerityArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let corpus = load_corpus(&args.dataset)?;

    let normalizer = TextNormalizer::new(&config.normalizer)?;
    let cleaned = normalizer.normalize_all(&corpus.full_texts())?;
    let report = CorpusExplorer::new()?.explore(&corpus, &cleaned, args.top)?;

    output_result("Dataset exploration", &report, cli_args)
}

/// Print the cleaned text of each article.
fn clean_dataset(args: &CleanArgs, cli_args: &VerityArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let corpus = load_corpus(&args.dataset)?;

    let take = args.limit.unwrap_or(corpus.len()).min(corpus.len());
    let texts: Vec<String> = corpus.iter().take(take).map(|a| a.full_text()).collect();
    let cleaned = TextNormalizer::new(&config.normalizer)?.normalize_all(&texts)?;

    let articles: Vec<CleanedArticle> = corpus
        .iter()
        .zip(cleaned)
        .enumerate()
        .map(|(index, (article, cleaned))| CleanedArticle {
            index,
            label: article.label,
            subject: article.subject.clone(),
            cleaned,
        })
        .collect();

    let result = CleanResult {
        total_articles: corpus.len(),
        empty_after_cleaning: articles.iter().filter(|a| a.cleaned.is_empty()).count(),
        articles,
    };

    output_result("Cleaned articles", &result, cli_args)
}

/// Train and evaluate the classifier.
fn train_model(args: &TrainArgs, cli_args: &VerityArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = apply_overrides(load_config(args.config.as_deref())?, args);
    config.validate()?;

    let corpus = load_corpus(&args.dataset)?;
    let pipeline = Pipeline::new(config.clone())?;
    let trained = pipeline.run(&corpus)?;
    let report = trained.report.clone();

    let model_path = match &args.model_out {
        Some(path) => {
            trained.into_bundle(&config).save(path)?;
            Some(path.to_string_lossy().to_string())
        }
        None => None,
    };

    let result = TrainResult {
        report,
        model_path,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };

    output_result("Training finished", &result, cli_args)
}

/// Classify free text with a saved model.
fn predict_texts(args: &PredictArgs, cli_args: &VerityArgs) -> Result<()> {
    let bundle = ModelBundle::load(&args.model)?;
    let predictions = bundle.predict(&args.texts)?;

    let result = PredictResult {
        model_path: args.model.to_string_lossy().to_string(),
        predictions,
    };

    output_result("Predictions", &result, cli_args)
}

/// Load the pipeline configuration, or the defaults when no file is given.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            PipelineConfig::from_file(path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Command line flags take precedence over the configuration file.
fn apply_overrides(mut config: PipelineConfig, args: &TrainArgs) -> PipelineConfig {
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(epochs) = args.epochs {
        config.classifier.epochs = epochs;
    }
    if let Some(max_vocab) = args.max_vocab {
        config.vectorizer.max_vocab_size = max_vocab;
    }
    if let Some(sequence_length) = args.sequence_length {
        config.vectorizer.sequence_length = sequence_length;
    }
    if let Some(threads) = args.threads {
        config.num_threads = threads;
    }
    config
}

fn load_corpus(args: &DatasetArgs) -> Result<Corpus> {
    let delimiter = args.delimiter_byte().ok_or_else(|| {
        VerityError::invalid_argument(format!(
            "delimiter must be a single ASCII character, got {:?}",
            args.delimiter
        ))
    })?;

    let corpus = DatasetLoader::new()
        .with_delimiter(delimiter)
        .load_corpus(&args.real, &args.fake)?;
    info!(
        "loaded {} articles from {} and {}",
        corpus.len(),
        args.real.display(),
        args.fake.display()
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn train_args(argv: &[&str]) -> TrainArgs {
        let mut full = vec!["verity", "train", "real.csv", "fake.csv"];
        full.extend_from_slice(argv);
        match VerityArgs::try_parse_from(full).unwrap().command {
            Command::Train(args) => args,
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_apply_overrides() {
        let args = train_args(&[
            "--seed",
            "11",
            "--epochs",
            "4",
            "--max-vocab",
            "500",
            "--sequence-length",
            "20",
            "-j",
            "2",
        ]);

        let config = apply_overrides(PipelineConfig::default(), &args);

        assert_eq!(config.split.seed, Some(11));
        assert_eq!(config.classifier.seed, Some(11));
        assert_eq!(config.classifier.epochs, 4);
        assert_eq!(config.vectorizer.max_vocab_size, 500);
        assert_eq!(config.vectorizer.sequence_length, 20);
        assert_eq!(config.num_threads, 2);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let args = train_args(&[]);
        let config = apply_overrides(PipelineConfig::default(), &args);
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_load_config_default() {
        assert_eq!(load_config(None).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_load_corpus_missing_file() {
        let args = DatasetArgs {
            real: "does/not/exist.csv".into(),
            fake: "does/not/exist.csv".into(),
            delimiter: ',',
        };
        assert!(load_corpus(&args).is_err());
    }
}
