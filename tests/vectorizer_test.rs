//! Integration tests for vocabulary fitting and sequence encoding.

use verity::analysis::normalizer::TextNormalizer;
use verity::analysis::token_filter::stop::DEFAULT_STOP_WORDS_SET;
use verity::config::VectorizerConfig;
use verity::error::Result;
use verity::ml::sequence::{OovPolicy, SequenceEncoder};
use verity::ml::vocabulary::{RESERVED_ID, Vocabulary};

#[test]
fn test_two_document_scenario() -> Result<()> {
    let normalizer = TextNormalizer::with_defaults()?;
    let raw = ["good news today", "shocking fake claim"];
    let cleaned = normalizer.normalize_all(&raw)?;

    let config = VectorizerConfig::default()
        .with_max_vocab_size(10)
        .with_sequence_length(5);
    let encoder = SequenceEncoder::fit(&cleaned, &config)?;

    let expected: Vec<&str> = ["good", "news", "today", "shocking", "fake", "claim"]
        .into_iter()
        .filter(|w| !DEFAULT_STOP_WORDS_SET.contains(*w))
        .collect();
    for word in &expected {
        assert!(encoder.vocabulary().contains(word), "{word} has no id");
    }

    let encoded = encoder.encode(&normalizer.normalize("shocking fake claim")?);
    assert_eq!(encoded.len(), 5);
    assert!(encoded[..3].iter().all(|&id| id != RESERVED_ID));
    assert_eq!(&encoded[3..], &[RESERVED_ID, RESERVED_ID]);

    Ok(())
}

#[test]
fn test_encode_length_is_fixed() -> Result<()> {
    let texts = ["alpha beta gamma", "delta epsilon", "zeta"];
    let vocabulary = Vocabulary::fit(&texts, 100)?;

    for length in [1, 2, 3, 8] {
        let encoder = SequenceEncoder::new(vocabulary.clone(), length, OovPolicy::Sentinel)?;
        for text in ["", "alpha", "alpha beta gamma delta epsilon zeta unknown words here"] {
            assert_eq!(encoder.encode(text).len(), length);
        }
    }

    Ok(())
}

#[test]
fn test_encoding_is_deterministic() -> Result<()> {
    let texts = [
        "senate vote budget senate",
        "budget deal vote",
        "hoax claim video hoax",
    ];
    let config = VectorizerConfig::default().with_sequence_length(6);

    let first = SequenceEncoder::fit(&texts, &config)?;
    let second = SequenceEncoder::fit(&texts, &config)?;

    assert_eq!(first.vocabulary(), second.vocabulary());
    for text in texts {
        assert_eq!(first.encode(text), second.encode(text));
    }
    assert_eq!(first.encode_batch(&texts), second.encode_batch(&texts));

    Ok(())
}

#[test]
fn test_vocabulary_ranks_by_frequency() -> Result<()> {
    let texts = ["b a c", "a d a", "c"];

    let vocabulary = Vocabulary::fit(&texts, 10)?;

    // a:3, c:2, b:1 (first seen before d), d:1
    assert_eq!(vocabulary.id("a"), Some(1));
    assert_eq!(vocabulary.id("c"), Some(2));
    assert_eq!(vocabulary.id("b"), Some(3));
    assert_eq!(vocabulary.id("d"), Some(4));
    assert_eq!(vocabulary.token(1), Some("a"));

    Ok(())
}

#[test]
fn test_vocabulary_capacity_is_respected() -> Result<()> {
    let texts = ["one two three four five six seven"];

    let vocabulary = Vocabulary::fit(&texts, 4)?;

    assert_eq!(vocabulary.len(), 3);
    assert_eq!(vocabulary.id_space(), 4);

    let encoder = SequenceEncoder::new(vocabulary, 7, OovPolicy::Sentinel)?;
    let ids = encoder.encode("one two three four five six seven");
    assert!(ids.iter().all(|&id| id < 4));
    assert_eq!(ids, vec![1, 2, 3, 0, 0, 0, 0]);

    Ok(())
}

#[test]
fn test_oov_policies() -> Result<()> {
    let vocabulary = Vocabulary::fit(&["known words only"], 10)?;

    let sentinel = SequenceEncoder::new(vocabulary.clone(), 4, OovPolicy::Sentinel)?;
    let skip = SequenceEncoder::new(vocabulary, 4, OovPolicy::Skip)?;

    assert_eq!(sentinel.encode("strange known words"), vec![0, 1, 2, 0]);
    assert_eq!(skip.encode("strange known words"), vec![1, 2, 0, 0]);

    Ok(())
}

#[test]
fn test_invalid_configuration() {
    assert!(Vocabulary::fit(&["a"], 0).is_err());

    let config = VectorizerConfig::default().with_sequence_length(0);
    assert!(SequenceEncoder::fit(&["a b"], &config).is_err());
}
