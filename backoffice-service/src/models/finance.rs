use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A sale made outside the order flow (e.g. a walk-in service).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExternalSale {
    pub id: i32,
    pub date_time: NaiveDateTime,
    pub description: String,
    pub amount: Decimal,
    pub seller_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct ExternalSaleFields {
    pub date_time: NaiveDateTime,
    pub description: String,
    pub amount: Decimal,
    pub seller_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdditionalExpense {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct AdditionalExpenseFields {
    pub name: String,
    pub description: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
}

/// Income and spending over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub invoice_count: i64,
    pub invoice_total: Decimal,
    pub external_sale_count: i64,
    pub external_sale_total: Decimal,
    pub additional_expense_total: Decimal,
    pub net: Decimal,
}

/// Raw sums as read from the database.
#[derive(Debug, Clone, Default, FromRow)]
pub struct SalesFigures {
    pub invoice_count: i64,
    pub invoice_total: Decimal,
    pub external_sale_count: i64,
    pub external_sale_total: Decimal,
    pub additional_expense_total: Decimal,
}

impl SalesReport {
    pub fn from_figures(from: NaiveDate, to: NaiveDate, figures: SalesFigures) -> Self {
        let net = figures.invoice_total + figures.external_sale_total
            - figures.additional_expense_total;
        Self {
            from,
            to,
            invoice_count: figures.invoice_count,
            invoice_total: figures.invoice_total,
            external_sale_count: figures.external_sale_count,
            external_sale_total: figures.external_sale_total,
            additional_expense_total: figures.additional_expense_total,
            net,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_net_subtracts_expenses() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let report = SalesReport::from_figures(
            day,
            day,
            SalesFigures {
                invoice_count: 2,
                invoice_total: dec("150.50"),
                external_sale_count: 1,
                external_sale_total: dec("20.00"),
                additional_expense_total: dec("70.25"),
            },
        );
        assert_eq!(report.net, dec("100.25"));
        assert_eq!(report.invoice_count, 2);
    }
}
