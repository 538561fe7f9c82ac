//! Scoring.

use sl_core::{Error, Result};

/// Fraction of predictions equal to the truth.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
    if y_true.is_empty() {
        return Err(Error::Computation("accuracy of an empty test fold is undefined".into()));
    }
    if y_true.len() != y_pred.len() {
        return Err(Error::Validation(format!(
            "accuracy: {} targets vs {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    let hits = y_true.iter().zip(y_pred).filter(|(a, b)| a == b).count();
    Ok(hits as f64 / y_true.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap(), 0.75);
        assert!(accuracy(&[], &[]).is_err());
        assert!(accuracy(&[0], &[0, 1]).is_err());
    }
}
