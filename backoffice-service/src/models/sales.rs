//! Sales models: purchase orders, invoices and the discount/tax types
//! applied to them.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Order state reference row (pending, paid, cancelled).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderStateType {
    pub id: i32,
    pub description: String,
}

/// One item line on an order or invoice.
///
/// `stock` is accepted as an alias of `amount` on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LineItem {
    pub id: i32,
    #[serde(alias = "stock")]
    pub amount: i32,
}

/// Line stored with the unit price charged at the time it was priced.
#[derive(Debug, Clone, FromRow)]
pub struct StoredLine {
    pub owner_id: i32,
    pub item_id: i32,
    pub amount: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PurchaseOrder {
    pub id: i32,
    pub seller_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub responsible_id: Option<i32>,
    pub date_time: NaiveDateTime,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub order_state_id: i32,
    #[sqlx(skip)]
    pub items: Vec<LineItem>,
    #[sqlx(skip)]
    pub discounts: Vec<i32>,
    #[sqlx(skip)]
    pub taxes: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Invoice {
    pub id: i32,
    pub enterprise_data: String,
    pub date_time: NaiveDateTime,
    pub customer_id: i32,
    pub purchase_order_id: Option<i32>,
    pub subtotal: Decimal,
    pub total: Decimal,
    #[sqlx(skip)]
    pub items: Vec<LineItem>,
    #[sqlx(skip)]
    pub discounts: Vec<i32>,
    #[sqlx(skip)]
    pub taxes: Vec<i32>,
}

/// A discount or tax definition. Percentage values are in percent (0..=100).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Adjustment {
    pub id: i32,
    pub name: String,
    pub value: Decimal,
    pub is_percentage: bool,
}

pub type DiscountType = Adjustment;
pub type TaxType = Adjustment;

#[derive(Debug, Clone)]
pub struct AdjustmentFields {
    pub name: String,
    pub value: Decimal,
    pub is_percentage: bool,
}

/// A priced line ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub item_id: i32,
    pub amount: i32,
    pub unit_price: Decimal,
}

/// Header and lines for a new purchase order.
#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    pub seller_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub responsible_id: Option<i32>,
    pub date_time: NaiveDateTime,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub lines: Vec<PricedLine>,
}

/// Replacement contents for a pending purchase order.
#[derive(Debug, Clone)]
pub struct PurchaseOrderChanges {
    pub seller_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub responsible_id: Option<i32>,
    pub date_time: Option<NaiveDateTime>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub lines: Vec<PricedLine>,
    pub discounts: Vec<i32>,
    pub taxes: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub enterprise_data: String,
    pub customer_id: i32,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub lines: Vec<PricedLine>,
    pub discounts: Vec<i32>,
    pub taxes: Vec<i32>,
}

/// Outcome of a purchase-order state change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StateChange {
    pub purchase_order: PurchaseOrder,
    pub invoice: Option<Invoice>,
}
