use std::collections::HashMap;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Local, NaiveDateTime, SubsecRound};
use tera::Value;

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AppError::PasswordError(e.to_string())
        })?;
    Ok(hash.to_string())
}

/// Returns `Ok(false)` for a wrong password, `Err` only if the stored hash is unreadable.
pub fn verify_password(provided: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| AppError::PasswordError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(provided.as_bytes(), &parsed)
        .is_ok())
}

/// Formats an amount as Indonesian rupiah, e.g. `Rp 1.234.567`.
pub fn format_rupiah(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if rounded < 0 {
        format!("Rp -{}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

/// Tera filter wrapping [`format_rupiah`]; null renders as `Rp 0`.
pub fn rupiah_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::Null => Ok(Value::String(format_rupiah(0.0))),
        other => other
            .as_f64()
            .map(|v| Value::String(format_rupiah(v)))
            .ok_or_else(|| tera::Error::msg(format!("rupiah: not a number: {}", other))),
    }
}

/// Local wall-clock time in whole seconds, the resolution ledger dates are stored at.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Parses a user-entered amount; only finite numbers above zero are accepted.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn rupiah_groups_thousands_with_dots() {
        assert_eq!(format_rupiah(0.0), "Rp 0");
        assert_eq!(format_rupiah(50.0), "Rp 50");
        assert_eq!(format_rupiah(1500.0), "Rp 1.500");
        assert_eq!(format_rupiah(1234567.0), "Rp 1.234.567");
        assert_eq!(format_rupiah(999999.6), "Rp 1.000.000");
        assert_eq!(format_rupiah(-25000.0), "Rp -25.000");
    }

    #[test]
    fn rupiah_filter_handles_null_and_rejects_text() {
        let args = HashMap::new();
        assert_eq!(
            rupiah_filter(&Value::Null, &args).unwrap(),
            Value::String("Rp 0".into())
        );
        assert_eq!(
            rupiah_filter(&Value::from(120000), &args).unwrap(),
            Value::String("Rp 120.000".into())
        );
        assert!(rupiah_filter(&Value::String("abc".into()), &args).is_err());
    }

    #[test]
    fn amounts_must_be_positive_numbers() {
        assert_eq!(parse_amount(" 2500 "), Some(2500.0));
        assert_eq!(parse_amount("12.5"), Some(12.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("-3"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("sepuluh"), None);
    }
}
