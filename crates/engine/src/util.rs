//! Internal helpers for input validation and model conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use chrono::Utc;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::CorruptData(format!("invalid {label} id")))
}

/// A ledger amount must be strictly positive and storable.
pub(crate) fn validate_amount(amount: Money) -> ResultEngine<Money> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
    }
    if !amount.is_storable() {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be <= {}",
            Money::MAX
        )));
    }
    Ok(amount)
}

/// Use the caller's reference when given, otherwise generate one.
///
/// A supplied reference is trimmed and must not end up empty.
pub(crate) fn resolve_reference(reference: Option<&str>) -> ResultEngine<String> {
    match reference {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(EngineError::InvalidReference(
                    "reference must not be empty".to_string(),
                ));
            }
            Ok(trimmed.to_string())
        }
        None => Ok(generate_reference()),
    }
}

/// System reference in the `TXN-<uuid>-<unix nanos>` format.
pub(crate) fn generate_reference() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("TXN-{}-{nanos}", Uuid::new_v4())
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} must not be empty")));
    }
    Ok(normalized)
}

/// Emails are compared case-insensitively, so they are stored lowercased.
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().nfc().collect::<String>().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(EngineError::InvalidInput(format!(
            "invalid email: {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_negative_and_unstorable_amounts() {
        assert!(validate_amount(Money::ZERO).is_err());
        assert!(validate_amount(Money::new(-1)).is_err());
        assert!(validate_amount(Money::MAX + Money::new(1)).is_err());
        assert_eq!(validate_amount(Money::new(1)).unwrap(), Money::new(1));
    }

    #[test]
    fn blank_reference_is_rejected() {
        assert!(matches!(
            resolve_reference(Some("   ")),
            Err(EngineError::InvalidReference(_))
        ));
        assert_eq!(resolve_reference(Some(" A ")).unwrap(), "A");
    }

    #[test]
    fn generated_references_are_unique() {
        let a = resolve_reference(None).unwrap();
        let b = resolve_reference(None).unwrap();
        assert!(a.starts_with("TXN-"));
        assert_ne!(a, b);
    }

    #[test]
    fn email_is_lowercased_and_checked() {
        assert_eq!(
            normalize_email("  Ada@Example.COM ").unwrap(),
            "ada@example.com"
        );
        assert!(normalize_email("ada").is_err());
        assert!(normalize_email("@example.com").is_err());
    }
}
