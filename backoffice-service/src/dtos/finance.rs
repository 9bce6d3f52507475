use crate::models::{AdditionalExpenseFields, ExternalSaleFields};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
pub struct ExternalSaleRequest {
    /// Defaults to now.
    pub date_time: Option<NaiveDateTime>,
    #[validate(length(min = 1, max = 500, message = "Description is required"))]
    pub description: String,
    #[validate(custom(function = "crate::utils::validation::non_negative"))]
    pub amount: Decimal,
    pub seller_id: Option<i32>,
}

impl From<ExternalSaleRequest> for ExternalSaleFields {
    fn from(req: ExternalSaleRequest) -> Self {
        Self {
            date_time: req
                .date_time
                .unwrap_or_else(|| Local::now().naive_local()),
            description: req.description,
            amount: req.amount,
            seller_id: req.seller_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdditionalExpenseRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "crate::utils::validation::non_negative"))]
    pub amount: Decimal,
    pub expense_date: NaiveDate,
}

impl From<AdditionalExpenseRequest> for AdditionalExpenseFields {
    fn from(req: AdditionalExpenseRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            amount: req.amount,
            expense_date: req.expense_date,
        }
    }
}

fn validate_range(query: &ReportQuery) -> Result<(), ValidationError> {
    if query.from > query.to {
        let mut err = ValidationError::new("date_range");
        err.message = Some("'from' must not be after 'to'".into());
        return Err(err);
    }
    Ok(())
}

/// Inclusive day range.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_range"))]
pub struct ReportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_range_must_be_ordered() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        assert!(ReportQuery { from: day(1), to: day(31) }.validate().is_ok());
        assert!(ReportQuery { from: day(1), to: day(1) }.validate().is_ok());
        assert!(ReportQuery { from: day(2), to: day(1) }.validate().is_err());
    }
}
