//! Evaluation metrics for the binary fake/real task.
//!
//! Confusion matrices use rows for the actual label and columns for the
//! predicted label, fake first:
//!
//! ```text
//!                 predicted fake   predicted real
//! actual fake     matrix[0][0]     matrix[0][1]
//! actual real     matrix[1][0]     matrix[1][1]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::Label;
use crate::error::{Result, VerityError};

/// Threshold probabilities. A probability equal to the threshold is not fake.
pub fn predict_labels(probabilities: &[f32], threshold: f32) -> Vec<bool> {
    probabilities.iter().map(|&p| p > threshold).collect()
}

/// Fraction of positions where `predicted` equals `actual`.
pub fn accuracy<T: PartialEq>(predicted: &[T], actual: &[T]) -> Result<f64> {
    if predicted.len() != actual.len() {
        return Err(VerityError::length_mismatch(predicted.len(), actual.len()));
    }
    if predicted.is_empty() {
        return Err(VerityError::invalid_argument("accuracy of zero predictions"));
    }
    let correct = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    Ok(correct as f64 / predicted.len() as f64)
}

/// 2×2 count table, `matrix[actual][predicted]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub matrix: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    /// Count label pairs. Lengths must match.
    pub fn from_labels(predicted: &[Label], actual: &[Label]) -> Result<Self> {
        if predicted.len() != actual.len() {
            return Err(VerityError::length_mismatch(predicted.len(), actual.len()));
        }
        let mut matrix = [[0usize; 2]; 2];
        for (p, a) in predicted.iter().zip(actual) {
            matrix[a.index()][p.index()] += 1;
        }
        Ok(ConfusionMatrix { matrix })
    }

    /// Same as [`from_labels`](Self::from_labels) with `true` meaning fake.
    pub fn from_bools(predicted: &[bool], actual: &[bool]) -> Result<Self> {
        let predicted: Vec<Label> = predicted.iter().map(|&b| Label::from(b)).collect();
        let actual: Vec<Label> = actual.iter().map(|&b| Label::from(b)).collect();
        Self::from_labels(&predicted, &actual)
    }

    /// Count of records with this actual and predicted label.
    pub fn get(&self, actual: Label, predicted: Label) -> usize {
        self.matrix[actual.index()][predicted.index()]
    }

    /// Records compared.
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        self.matrix[0][0] + self.matrix[1][1]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Records actually carrying `label`.
    pub fn support(&self, label: Label) -> usize {
        self.matrix[label.index()].iter().sum()
    }

    /// Records predicted as `label`.
    pub fn predicted_count(&self, label: Label) -> usize {
        self.matrix.iter().map(|row| row[label.index()]).sum()
    }

    /// Precision for `label`: TP / (TP + FP).
    pub fn precision(&self, label: Label) -> f64 {
        ratio(self.get(label, label), self.predicted_count(label))
    }

    /// Recall for `label`: TP / (TP + FN).
    pub fn recall(&self, label: Label) -> f64 {
        ratio(self.get(label, label), self.support(label))
    }

    /// F1 for `label`: 2PR / (P + R).
    pub fn f1_score(&self, label: Label) -> f64 {
        let precision = self.precision(label);
        let recall = self.recall(label);
        let denom = precision + recall;
        if denom == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / denom
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>10} {:>10}", "actual\\pred", "fake", "real")?;
        for label in Label::ALL {
            let row = self.matrix[label.index()];
            writeln!(f, "{:>14} {:>10} {:>10}", label.as_str(), row[0], row[1])?;
        }
        Ok(())
    }
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Averaged precision, recall and F1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class metrics plus accuracy and macro/weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub confusion_matrix: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn from_confusion_matrix(confusion_matrix: ConfusionMatrix) -> Self {
        let classes: Vec<ClassMetrics> = Label::ALL
            .iter()
            .map(|&label| ClassMetrics {
                label,
                precision: confusion_matrix.precision(label),
                recall: confusion_matrix.recall(label),
                f1_score: confusion_matrix.f1_score(label),
                support: confusion_matrix.support(label),
            })
            .collect();

        let total = confusion_matrix.total();
        let n = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n,
            support: total,
        };

        let weight = |c: &ClassMetrics| ratio(c.support, total);
        let weighted_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision * weight(c)).sum(),
            recall: classes.iter().map(|c| c.recall * weight(c)).sum(),
            f1_score: classes.iter().map(|c| c.f1_score * weight(c)).sum(),
            support: total,
        };

        ClassificationReport {
            classes,
            accuracy: confusion_matrix.accuracy(),
            macro_avg,
            weighted_avg,
            confusion_matrix,
        }
    }

    pub fn from_labels(predicted: &[Label], actual: &[Label]) -> Result<Self> {
        Ok(Self::from_confusion_matrix(ConfusionMatrix::from_labels(
            predicted, actual,
        )?))
    }

    /// Metrics for one class.
    pub fn class(&self, label: Label) -> &ClassMetrics {
        &self.classes[label.index()]
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                c.label.as_str(),
                c.precision,
                c.recall,
                c.f1_score,
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                name, avg.precision, avg.recall, avg.f1_score, avg.support
            )?;
        }
        Ok(())
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
