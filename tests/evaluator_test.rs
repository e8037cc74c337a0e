//! Integration tests for thresholding and evaluation metrics.

use verity::dataset::Label;
use verity::error::{Result, VerityError};
use verity::ml::metrics::{ClassificationReport, ConfusionMatrix, accuracy, predict_labels};

#[test]
fn test_accuracy_extremes() -> Result<()> {
    assert_eq!(accuracy(&[1, 0, 1], &[1, 0, 1])?, 1.0);
    assert_eq!(accuracy(&[1, 0], &[0, 1])?, 0.0);
    assert_eq!(accuracy(&[true, false, true, true], &[true, true, true, false])?, 0.5);
    Ok(())
}

#[test]
fn test_accuracy_length_mismatch() {
    match accuracy(&[1, 0, 1], &[1, 0]) {
        Err(VerityError::LengthMismatch { predicted, actual }) => {
            assert_eq!(predicted, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("expected LengthMismatch, got {other:?}"),
    }
}

#[test]
fn test_threshold_is_strict() {
    assert_eq!(predict_labels(&[0.49, 0.5, 0.51], 0.5), vec![false, false, true]);
    assert_eq!(predict_labels(&[0.0, 1.0], 0.0), vec![false, true]);
    assert!(predict_labels(&[], 0.5).is_empty());
}

#[test]
fn test_confusion_matrix_orientation() -> Result<()> {
    use Label::{Fake, Real};
    let actual = [Fake, Fake, Fake, Real, Real];
    let predicted = [Fake, Real, Fake, Fake, Real];

    let matrix = ConfusionMatrix::from_labels(&predicted, &actual)?;

    assert_eq!(matrix.get(Fake, Fake), 2);
    assert_eq!(matrix.get(Fake, Real), 1);
    assert_eq!(matrix.get(Real, Fake), 1);
    assert_eq!(matrix.get(Real, Real), 1);
    assert_eq!(matrix.total(), actual.len());
    assert_eq!(matrix.support(Fake), 3);
    assert_eq!(matrix.predicted_count(Fake), 3);

    Ok(())
}

#[test]
fn test_confusion_matrix_counts_sum_to_records() -> Result<()> {
    let actual: Vec<bool> = (0..37).map(|i| i % 3 == 0).collect();
    let predicted: Vec<bool> = (0..37).map(|i| i % 2 == 0).collect();

    let matrix = ConfusionMatrix::from_bools(&predicted, &actual)?;

    assert_eq!(matrix.total(), 37);
    assert_eq!(
        matrix.correct() as f64 / 37.0,
        accuracy(&predicted, &actual)?
    );

    Ok(())
}

#[test]
fn test_classification_report() -> Result<()> {
    use Label::{Fake, Real};
    let actual = [Fake, Fake, Fake, Fake, Real, Real];
    let predicted = [Fake, Fake, Fake, Real, Real, Fake];

    let report = ClassificationReport::from_labels(&predicted, &actual)?;

    let fake = report.class(Fake);
    assert!((fake.precision - 0.75).abs() < 1e-12);
    assert!((fake.recall - 0.75).abs() < 1e-12);
    assert!((fake.f1_score - 0.75).abs() < 1e-12);
    assert_eq!(fake.support, 4);

    let real = report.class(Real);
    assert!((real.precision - 0.5).abs() < 1e-12);
    assert!((real.recall - 0.5).abs() < 1e-12);
    assert_eq!(real.support, 2);

    assert!((report.accuracy - 4.0 / 6.0).abs() < 1e-12);
    assert!((report.macro_avg.f1_score - 0.625).abs() < 1e-12);
    assert!((report.weighted_avg.recall - (0.75 * 4.0 + 0.5 * 2.0) / 6.0).abs() < 1e-12);

    let rendered = report.to_string();
    assert!(rendered.contains("precision"));
    assert!(rendered.contains("fake"));

    Ok(())
}

#[test]
fn test_report_with_missing_class() -> Result<()> {
    let actual = [Label::Real, Label::Real];
    let predicted = [Label::Real, Label::Real];

    let report = ClassificationReport::from_labels(&predicted, &actual)?;

    let fake = report.class(Label::Fake);
    assert_eq!(fake.support, 0);
    assert_eq!(fake.precision, 0.0);
    assert_eq!(fake.recall, 0.0);
    assert_eq!(report.accuracy, 1.0);

    Ok(())
}
