//! Custom field rules used by request payloads.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use validator::ValidationError;

pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Percentages are expressed in percent, so they must lie in `0..=100`.
pub fn percentage_in_range(value: &Decimal) -> Result<(), ValidationError> {
    non_negative(value)?;
    if *value > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("percentage_range");
        err.message = Some("percentage must not exceed 100".into());
        return Err(err);
    }
    Ok(())
}

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn password_length(password: &Secret<String>) -> Result<(), ValidationError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        let mut err = ValidationError::new("length");
        err.message = Some("Password must be at least 8 characters".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative() {
        assert!(non_negative(&Decimal::ZERO).is_ok());
        assert!(non_negative(&Decimal::new(150, 2)).is_ok());
        assert!(non_negative(&Decimal::new(-1, 2)).is_err());
    }

    #[test]
    fn test_percentage_in_range() {
        assert!(percentage_in_range(&Decimal::ONE_HUNDRED).is_ok());
        assert!(percentage_in_range(&Decimal::new(10001, 2)).is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(password_length(&Secret::new("12345678".to_string())).is_ok());
        let err = password_length(&Secret::new("short".to_string())).unwrap_err();
        assert_eq!(err.code, "length");
    }
}
