use crate::models::ItemFields;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

fn enabled() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct ItemRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: i32,
    #[validate(custom(function = "crate::utils::validation::non_negative"))]
    pub selling_price: Decimal,
    #[validate(custom(function = "crate::utils::validation::non_negative"))]
    pub purchase_price: Decimal,
    #[serde(default = "enabled")]
    pub item_state: bool,
    pub item_type_id: i32,
}

impl From<ItemRequest> for ItemFields {
    fn from(req: ItemRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            stock: req.stock,
            selling_price: req.selling_price,
            purchase_price: req.purchase_price,
            item_state: req.item_state,
            item_type_id: req.item_type_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ItemStateRequest {
    pub item_state: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StockQuery {
    #[validate(range(min = 1, message = "Quantity must be greater than zero"))]
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_prices_are_rejected() {
        let req: ItemRequest = serde_json::from_value(serde_json::json!({
            "name": "Shampoo",
            "stock": 4,
            "selling_price": "-1.00",
            "purchase_price": "3.00",
            "item_type_id": 1
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("selling_price"));
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        assert!(StockQuery { quantity: 0 }.validate().is_err());
        assert!(StockQuery { quantity: 3 }.validate().is_ok());
    }
}
