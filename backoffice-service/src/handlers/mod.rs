//! HTTP handlers for backoffice-service.
//!
//! Every gated handler opens a [`RequestAudit`](crate::services::RequestAudit)
//! for the caller, checks the operation's permission code, binds its input
//! and logs the outcome before answering.

pub mod access;
pub mod catalog;
pub mod finance;
pub mod health;
pub mod orders;
pub mod people;
pub mod scheduling;
pub mod users;

use service_core::error::AppError;
use std::fmt::Display;

/// Turn a missing row into a 404 naming the resource.
pub(crate) fn found<T>(value: Option<T>, what: &str, id: impl Display) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("{} {} not found", what, id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found() {
        assert_eq!(found(Some(3), "Item", 1).unwrap(), 3);
        let err = found(None::<i32>, "Item", 7).unwrap_err();
        assert_eq!(err.to_string(), "Not found: Item 7 not found");
    }
}
