//! Order and invoice money math.
//!
//! Discounts are applied to the subtotal, then taxes are applied to the
//! discounted base. Every reported figure is rounded to cents, midpoint away
//! from zero.

use crate::models::{Adjustment, Item, LineItem, PricedLine};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use service_core::error::AppError;
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Largest quantity one line may carry, after repeated ids are merged.
pub const MAX_LINE_AMOUNT: i32 = 1_000_000;

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price requested lines against current items.
///
/// Every line must name an existing, enabled item and an amount in
/// `1..=MAX_LINE_AMOUNT`. Repeated item ids are merged into one line and the
/// merged amount is held to the same bound.
pub fn price_lines(lines: &[LineItem], items: &[Item]) -> Result<Vec<PricedLine>, AppError> {
    if lines.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "At least one item is required"
        )));
    }

    let catalog: HashMap<i32, &Item> = items.iter().map(|item| (item.id, item)).collect();
    let mut priced: Vec<PricedLine> = Vec::with_capacity(lines.len());

    for line in lines {
        if line.amount <= 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Amount for item {} must be greater than zero",
                line.id
            )));
        }
        if line.amount > MAX_LINE_AMOUNT {
            return Err(too_large(line.id));
        }
        let item = catalog
            .get(&line.id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item {} not found", line.id)))?;
        if !item.item_state {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Item {} is disabled",
                line.id
            )));
        }

        match priced.iter_mut().find(|p| p.item_id == line.id) {
            Some(existing) => {
                existing.amount = existing
                    .amount
                    .checked_add(line.amount)
                    .filter(|merged| *merged <= MAX_LINE_AMOUNT)
                    .ok_or_else(|| too_large(line.id))?;
            }
            None => priced.push(PricedLine {
                item_id: item.id,
                amount: line.amount,
                unit_price: item.selling_price,
            }),
        }
    }

    Ok(priced)
}

fn too_large(item_id: i32) -> AppError {
    AppError::BadRequest(anyhow::anyhow!("Amount for item {} is too large", item_id))
}

pub fn subtotal(lines: &[PricedLine]) -> Decimal {
    round_money(
        lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.amount))
            .sum(),
    )
}

fn adjustment_amount(base: Decimal, adjustment: &Adjustment) -> Decimal {
    if adjustment.is_percentage {
        base * adjustment.value / Decimal::ONE_HUNDRED
    } else {
        adjustment.value
    }
}

/// Apply discounts and taxes to priced lines.
pub fn totals(lines: &[PricedLine], discounts: &[Adjustment], taxes: &[Adjustment]) -> Totals {
    let subtotal = subtotal(lines);

    let raw_discount: Decimal = discounts
        .iter()
        .map(|d| adjustment_amount(subtotal, d))
        .sum();
    let discount = round_money(raw_discount.min(subtotal));
    let base = subtotal - discount;

    let tax = round_money(taxes.iter().map(|t| adjustment_amount(base, t)).sum());

    Totals {
        subtotal,
        discount,
        tax,
        total: base + tax,
    }
}

/// Resolve adjustment ids against the loaded definitions, in request order.
pub fn resolve_adjustments(
    ids: &[i32],
    found: &[Adjustment],
    kind: &str,
) -> Result<Vec<Adjustment>, AppError> {
    ids.iter()
        .map(|id| {
            found
                .iter()
                .find(|a| a.id == *id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("{} {} not found", kind, id)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(id: i32, price: &str, enabled: bool) -> Item {
        Item {
            id,
            name: format!("item-{}", id),
            description: String::new(),
            stock: 10,
            selling_price: dec(price),
            purchase_price: Decimal::ZERO,
            item_state: enabled,
            item_type_id: 1,
        }
    }

    fn adjustment(value: &str, is_percentage: bool) -> Adjustment {
        Adjustment {
            id: 1,
            name: "adj".to_string(),
            value: dec(value),
            is_percentage,
        }
    }

    fn line(item_id: i32, amount: i32, price: &str) -> PricedLine {
        PricedLine {
            item_id,
            amount,
            unit_price: dec(price),
        }
    }

    #[test]
    fn test_subtotal_sums_lines() {
        let lines = [line(1, 2, "10.50"), line(2, 1, "4.25")];
        assert_eq!(subtotal(&lines), dec("25.25"));
    }

    #[test]
    fn test_percentage_discount_then_tax() {
        let lines = [line(1, 4, "25.00")];
        let t = totals(
            &lines,
            &[adjustment("10", true)],
            &[adjustment("19", true)],
        );
        assert_eq!(t.subtotal, dec("100.00"));
        assert_eq!(t.discount, dec("10.00"));
        assert_eq!(t.tax, dec("17.10"));
        assert_eq!(t.total, dec("107.10"));
    }

    #[test]
    fn test_fixed_discount_is_capped_at_subtotal() {
        let lines = [line(1, 1, "5.00")];
        let t = totals(&lines, &[adjustment("8.00", false)], &[adjustment("10", true)]);
        assert_eq!(t.discount, dec("5.00"));
        assert_eq!(t.tax, Decimal::ZERO);
        assert_eq!(t.total, Decimal::ZERO);
    }

    #[test]
    fn test_rounding_is_midpoint_away_from_zero() {
        assert_eq!(round_money(dec("0.125")), dec("0.13"));
        assert_eq!(round_money(dec("0.135")), dec("0.14"));
    }

    #[test]
    fn test_no_adjustments_total_equals_subtotal() {
        let lines = [line(1, 3, "3.33")];
        let t = totals(&lines, &[], &[]);
        assert_eq!(t.total, t.subtotal);
        assert_eq!(t.total, dec("9.99"));
    }

    #[test]
    fn test_price_lines_merges_and_validates() {
        let items = [item(1, "2.00", true), item(2, "3.00", false)];

        let priced = price_lines(
            &[LineItem { id: 1, amount: 1 }, LineItem { id: 1, amount: 2 }],
            &items,
        )
        .unwrap();
        assert_eq!(priced, vec![line(1, 3, "2.00")]);

        assert!(matches!(
            price_lines(&[LineItem { id: 2, amount: 1 }], &items),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            price_lines(&[LineItem { id: 7, amount: 1 }], &items),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            price_lines(&[LineItem { id: 1, amount: 0 }], &items),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(price_lines(&[], &items), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_price_lines_bounds_line_amounts() {
        let items = [item(1, "2.00", true)];

        let err = price_lines(&[LineItem { id: 1, amount: i32::MAX }], &items).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Amount for item 1 is too large");

        // Each line is valid alone; the merged quantity is not.
        let err = price_lines(
            &[
                LineItem { id: 1, amount: MAX_LINE_AMOUNT },
                LineItem { id: 1, amount: 1 },
            ],
            &items,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let priced = price_lines(
            &[
                LineItem { id: 1, amount: MAX_LINE_AMOUNT - 1 },
                LineItem { id: 1, amount: 1 },
            ],
            &items,
        )
        .unwrap();
        assert_eq!(priced[0].amount, MAX_LINE_AMOUNT);
    }

    #[test]
    fn test_resolve_adjustments_reports_missing() {
        let found = [adjustment("5", true)];
        assert_eq!(resolve_adjustments(&[1], &found, "Discount").unwrap().len(), 1);

        let err = resolve_adjustments(&[1, 3], &found, "Discount").unwrap_err();
        assert_eq!(err.to_string(), "Not found: Discount 3 not found");
    }
}
