use crate::models::{AdjustmentFields, LineItem};
use crate::utils::validation::percentage_in_range;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItem>,
    pub seller_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub responsible_id: Option<i32>,
}

/// Replacement contents for a pending order. Omitted people and date keep
/// their current value; lines and adjustments are replaced.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrderRequest {
    pub seller_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub responsible_id: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub date_time: Option<NaiveDateTime>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub discounts: Vec<i32>,
    #[serde(default)]
    pub taxes: Vec<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStateRequest {
    #[schema(example = 2)]
    pub order_state_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceRequest {
    pub customer_id: i32,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub discounts: Vec<i32>,
    #[serde(default)]
    pub taxes: Vec<i32>,
    /// Overrides the configured issuer block.
    pub enterprise_data: Option<String>,
}

fn validate_adjustment(req: &AdjustmentRequest) -> Result<(), ValidationError> {
    if req.is_percentage {
        percentage_in_range(&req.value)
    } else {
        Ok(())
    }
}

/// Discount or tax type definition.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_adjustment"))]
pub struct AdjustmentRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = "crate::utils::validation::non_negative"))]
    pub value: Decimal,
    pub is_percentage: bool,
}

impl From<AdjustmentRequest> for AdjustmentFields {
    fn from(req: AdjustmentRequest) -> Self {
        Self {
            name: req.name,
            value: req.value,
            is_percentage: req.is_percentage,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubtotalRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubtotalResponse {
    pub subtotal: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TotalRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub discounts: Vec<i32>,
    #[serde(default)]
    pub taxes: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjustment(value: &str, is_percentage: bool) -> AdjustmentRequest {
        AdjustmentRequest {
            name: "Loyalty".to_string(),
            value: value.parse().unwrap(),
            is_percentage,
        }
    }

    #[test]
    fn test_percentage_over_hundred_is_rejected() {
        assert!(adjustment("100", true).validate().is_ok());
        assert!(adjustment("100.01", true).validate().is_err());
        assert!(adjustment("250", false).validate().is_ok());
        assert!(adjustment("-5", false).validate().is_err());
    }

    #[test]
    fn test_lines_accept_stock_alias() {
        let req: SubtotalRequest = serde_json::from_value(serde_json::json!({
            "items": [{"id": 3, "stock": 2}, {"id": 4, "amount": 1}]
        }))
        .unwrap();
        assert_eq!(req.items[0].amount, 2);
        assert_eq!(req.items[1].amount, 1);
    }

    #[test]
    fn test_empty_order_is_rejected() {
        let req = CreatePurchaseOrderRequest {
            items: vec![],
            seller_id: None,
            customer_id: Some(1),
            responsible_id: None,
        };
        assert!(req.validate().is_err());
    }
}
