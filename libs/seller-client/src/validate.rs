//! Per-argument validation rules.
//!
//! Integer-ness and text-ness are carried by the argument types; what is left
//! to check at runtime is range and emptiness.

use crate::error::{ValidationError, ValidationRule};

/// `value` must be zero or greater.
pub fn non_negative(field: &str, value: i64) -> Result<i64, ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(field, ValidationRule::NonNegative));
    }
    Ok(value)
}

/// Every value of a batch must be zero or greater.
///
/// The offending entry is reported by position, e.g. `qtys[2]`.
pub fn non_negative_values(
    field: &str,
    values: impl IntoIterator<Item = i64>,
) -> Result<(), ValidationError> {
    match values.into_iter().position(|value| value < 0) {
        Some(index) => Err(ValidationError::new(
            format!("{field}[{index}]"),
            ValidationRule::NonNegative,
        )),
        None => Ok(()),
    }
}

/// Sequence must hold at least one integer.
pub fn non_empty_sequence(field: &str, values: &[i64]) -> Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::new(field, ValidationRule::NonEmptySequence));
    }
    Ok(())
}

/// Text must not be empty.
pub fn non_empty_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, ValidationRule::NonEmptyText));
    }
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative("qty", 0).unwrap(), 0);
        assert_eq!(non_negative("qty", 17).unwrap(), 17);

        let err = non_negative("qty", -1).unwrap_err();
        assert_eq!(err.field, "qty");
        assert_eq!(err.rule, ValidationRule::NonNegative);
    }

    #[test]
    fn test_non_negative_values_reports_position() {
        assert!(non_negative_values("qtys", []).is_ok());
        assert!(non_negative_values("qtys", [0, 5]).is_ok());

        let err = non_negative_values("qtys", [0, 5, -4]).unwrap_err();
        assert_eq!(err.field, "qtys[2]");
        assert_eq!(err.to_string(), "qtys[2] must not be negative");
    }

    #[test]
    fn test_non_empty_sequence() {
        assert!(non_empty_sequence("skus", &[7]).is_ok());
        let err = non_empty_sequence("skus", &[]).unwrap_err();
        assert_eq!(err.rule, ValidationRule::NonEmptySequence);
    }

    #[test]
    fn test_non_empty_text() {
        assert!(non_empty_text("appId", "shop-1").is_ok());
        let err = non_empty_text("appId", "").unwrap_err();
        assert_eq!(err.to_string(), "appId must be a non-empty string");
    }
}
