//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every entry point enforces the same rules.

use chrono::Duration;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Largest amount a single sale, payment or expense may carry, in francs.
pub(crate) const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Reject non-positive amounts and amounts above [`MAX_AMOUNT`].
pub(crate) fn ensure_positive_amount(amount: i64, label: &str) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::Validation(format!(
            "{label} amount must be > 0"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(EngineError::Validation(format!(
            "{label} amount must be <= {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// Sum amounts, failing instead of wrapping.
pub(crate) fn checked_total<'a>(
    amounts: impl IntoIterator<Item = &'a i64>,
    label: &str,
) -> ResultEngine<i64> {
    amounts.into_iter().try_fold(0i64, |acc, amount| {
        acc.checked_add(*amount)
            .ok_or_else(|| EngineError::Consistency(format!("{label} total overflows")))
    })
}

/// Trim a required free-text field, rejecting blank values.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional free-text field, mapping blank values to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Build the lookup key of a client name.
///
/// Accents and case are folded and any run of non-alphanumeric characters
/// becomes a single space, so the key never contains SQL wildcards.
pub(crate) fn name_key(input: &str) -> Option<String> {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let normalized = out.trim();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// Number of whole or started `unit`s in a positive `left`.
///
/// Any remainder counts as one more unit, down to the nanosecond.
pub(crate) fn ceil_units(left: Duration, unit: Duration) -> i64 {
    let whole = left.num_seconds() / unit.num_seconds();
    if left > Duration::seconds(whole * unit.num_seconds()) {
        whole + 1
    } else {
        whole
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_key_folds_case_and_accents() {
        assert_eq!(name_key("  Marie KONÉ ").as_deref(), Some("marie kone"));
        assert_eq!(name_key("Jean-Kouassi").as_deref(), Some("jean kouassi"));
        assert_eq!(name_key("100%_sure").as_deref(), Some("100 sure"));
        assert_eq!(name_key(" -- "), None);
    }

    #[test]
    fn ceil_units_rounds_up_partial_units() {
        let hour = Duration::hours(1);
        assert_eq!(ceil_units(Duration::hours(71), hour), 71);
        assert_eq!(ceil_units(Duration::hours(71) + Duration::seconds(1), hour), 72);
        assert_eq!(ceil_units(Duration::hours(71) + Duration::microseconds(400), hour), 72);
        assert_eq!(ceil_units(Duration::nanoseconds(1), hour), 1);
        assert_eq!(ceil_units(Duration::days(2) + Duration::nanoseconds(1), Duration::days(1)), 3);
    }

    #[test]
    fn amounts_are_capped() {
        assert!(ensure_positive_amount(MAX_AMOUNT, "sale").is_ok());
        let err = ensure_positive_amount(MAX_AMOUNT + 1, "sale").unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert!(ensure_positive_amount(i64::MAX, "payment").is_err());
        assert!(ensure_positive_amount(0, "expense").is_err());
    }

    #[test]
    fn checked_total_reports_overflow() {
        assert_eq!(checked_total(&[1, 2, 3], "sales").unwrap(), 6);
        let err = checked_total(&[i64::MAX, 1], "sales").unwrap_err();
        assert_eq!(err.kind(), "consistency_error");
    }

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(normalize_required_text("  Riz ", "motif").unwrap(), "Riz");
        assert!(normalize_required_text("   ", "motif").is_err());
    }
}
