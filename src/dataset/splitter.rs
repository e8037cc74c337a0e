//! Shuffled train/test split.
//!
//! The held-out size is `ceil(len * test_fraction)`, clamped so both sides
//! keep at least one record. Shuffling uses a seeded `StdRng` when a seed is
//! configured, so the same seed always yields the same split.

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::SplitConfig;
use crate::error::{Result, VerityError};

/// The two halves of a split.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

/// Split `items` into train and test sets.
pub fn train_test_split<T>(mut items: Vec<T>, config: &SplitConfig) -> Result<Split<T>> {
    config.validate()?;

    let total = items.len();
    if total < 2 {
        return Err(VerityError::dataset(format!(
            "need at least 2 records to split, got {total}"
        )));
    }

    if config.shuffle {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        items.shuffle(&mut rng);
    }

    let test_len = ((total as f64) * config.test_fraction).ceil() as usize;
    let test_len = test_len.clamp(1, total - 1);

    let test = items.split_off(total - test_len);

    debug!(
        "dataset split: {} train, {} test ({:.0}% held out)",
        items.len(),
        test.len(),
        config.test_fraction * 100.0
    );

    Ok(Split { train: items, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let config = SplitConfig::default().with_seed(1);
        let split = train_test_split((0..100).collect::<Vec<_>>(), &config).unwrap();

        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(), 20);
    }

    #[test]
    fn test_split_rounds_test_size_up() {
        let config = SplitConfig::default().with_seed(1);
        let split = train_test_split((0..11).collect::<Vec<_>>(), &config).unwrap();

        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 8);
    }

    #[test]
    fn test_split_preserves_every_record() {
        let config = SplitConfig::default().with_seed(9);
        let split = train_test_split((0..57).collect::<Vec<_>>(), &config).unwrap();

        let mut all: Vec<i32> = split.train.into_iter().chain(split.test).collect();
        all.sort();
        assert_eq!(all, (0..57).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let config = SplitConfig::default().with_seed(42);
        let a = train_test_split((0..50).collect::<Vec<_>>(), &config).unwrap();
        let b = train_test_split((0..50).collect::<Vec<_>>(), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_shuffle_keeps_order() {
        let config = SplitConfig {
            shuffle: false,
            ..SplitConfig::default()
        };
        let split = train_test_split((0..10).collect::<Vec<_>>(), &config).unwrap();

        assert_eq!(split.train, (0..8).collect::<Vec<_>>());
        assert_eq!(split.test, vec![8, 9]);
    }

    #[test]
    fn test_tiny_inputs() {
        let config = SplitConfig::default().with_seed(0);
        let split = train_test_split(vec!["a", "b"], &config).unwrap();
        assert_eq!(split.train.len(), 1);
        assert_eq!(split.test.len(), 1);

        assert!(train_test_split(vec!["a"], &config).is_err());
    }
}
