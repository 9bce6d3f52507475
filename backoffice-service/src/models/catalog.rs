//! Catalog models: item types, items and their selling price history.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ItemType {
    pub id: i32,
    pub name: String,
}

/// A sellable item. `item_state` false means disabled for new orders.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub stock: i32,
    pub selling_price: Decimal,
    pub purchase_price: Decimal,
    pub item_state: bool,
    pub item_type_id: i32,
}

/// Input for creating or replacing an item.
#[derive(Debug, Clone)]
pub struct ItemFields {
    pub name: String,
    pub description: String,
    pub stock: i32,
    pub selling_price: Decimal,
    pub purchase_price: Decimal,
    pub item_state: bool,
    pub item_type_id: i32,
}

/// Recorded whenever an item's selling price is set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoricalItemPrice {
    pub id: i32,
    pub item_id: i32,
    pub price: Decimal,
    pub modification_date: NaiveDateTime,
}

/// Result of a stock availability check.
#[derive(Debug, Clone, Serialize)]
pub struct StockCheck {
    pub item_id: i32,
    pub requested: i32,
    pub stock: i32,
    pub available: bool,
}

impl StockCheck {
    pub fn new(item: &Item, requested: i32) -> Self {
        Self {
            item_id: item.id,
            requested,
            stock: item.stock,
            available: item.stock >= requested,
        }
    }
}
