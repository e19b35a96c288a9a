//! # Stock Reconciliation Rules
//!
//! Decides how product quantities change when a purchase, sale or stock
//! adjustment is created, edited or deleted.
//!
//! ## Rule Table
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────────────┐
//! │ Event                │ Movements                                        │
//! ├──────────────────────┼──────────────────────────────────────────────────┤
//! │ purchase created     │ product += qty                                   │
//! │ purchase updated     │ same product:    product += (new - old)          │
//! │                      │ product changed: old -= old.qty, new += new.qty  │
//! │ purchase deleted     │ product -= qty, refused if on hand < qty         │
//! ├──────────────────────┼──────────────────────────────────────────────────┤
//! │ sale created         │ product -= qty                                   │
//! │ sale updated         │ same product:    product -= (new - old)          │
//! │                      │ product changed: old += old.qty, new -= new.qty  │
//! │ sale deleted         │ product += qty                                   │
//! ├──────────────────────┼──────────────────────────────────────────────────┤
//! │ adjustment created   │ product -= qty, refused if on hand < qty         │
//! └──────────────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! The functions here are pure: they return the [`StockMovement`]s to apply
//! and the database layer applies them in the same transaction that writes
//! the event row. A rule that refuses returns an error before anything is
//! written.
//!
//! ## Example
//! ```rust
//! use shopledger_core::stock::{purchase_updated, StockLine, StockMovement};
//!
//! // Quantity edited from 5 to 8 on the same product: only the delta moves.
//! let movements = purchase_updated(
//!     StockLine::new("prod-1", 5),
//!     StockLine::new("prod-1", 8),
//! ).unwrap();
//! assert_eq!(movements, vec![StockMovement::new("prod-1", 3)]);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::validation::validate_quantity;

// =============================================================================
// Types
// =============================================================================

/// A signed change to one product's on-hand quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub product_id: String,
    /// Positive adds stock, negative removes it.
    pub delta: i64,
}

impl StockMovement {
    pub fn new(product_id: impl Into<String>, delta: i64) -> Self {
        StockMovement {
            product_id: product_id.into(),
            delta,
        }
    }
}

/// The stock-relevant part of a purchase or sale: which product, how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine<'a> {
    pub product_id: &'a str,
    pub quantity: i64,
}

impl<'a> StockLine<'a> {
    pub fn new(product_id: &'a str, quantity: i64) -> Self {
        StockLine {
            product_id,
            quantity,
        }
    }
}

fn checked(line: StockLine<'_>) -> CoreResult<()> {
    validate_quantity("quantity", line.quantity)?;
    Ok(())
}

/// Refuses `delta` if it would take `on_hand` below zero.
pub fn ensure_non_negative(product_id: &str, on_hand: i64, delta: i64) -> CoreResult<()> {
    if on_hand + delta < 0 {
        return Err(CoreError::NegativeStock {
            product_id: product_id.to_string(),
            on_hand,
            change: delta,
        });
    }
    Ok(())
}

/// Movements for an edit where stock flows in direction `sign` (+1 for
/// purchases, -1 for sales).
fn updated(old: StockLine<'_>, new: StockLine<'_>, sign: i64) -> CoreResult<Vec<StockMovement>> {
    checked(old)?;
    checked(new)?;

    if old.product_id == new.product_id {
        let delta = sign * (new.quantity - old.quantity);
        if delta == 0 {
            return Ok(Vec::new());
        }
        return Ok(vec![StockMovement::new(new.product_id, delta)]);
    }

    // Two independent movements, never netted.
    Ok(vec![
        StockMovement::new(old.product_id, -sign * old.quantity),
        StockMovement::new(new.product_id, sign * new.quantity),
    ])
}

// =============================================================================
// Purchases
// =============================================================================

/// A new purchase adds its quantity to the product.
pub fn purchase_created(product_id: &str, quantity: i64) -> CoreResult<Vec<StockMovement>> {
    checked(StockLine::new(product_id, quantity))?;
    Ok(vec![StockMovement::new(product_id, quantity)])
}

/// An edited purchase applies the net delta, or moves stock between products
/// when the product changed.
pub fn purchase_updated(old: StockLine<'_>, new: StockLine<'_>) -> CoreResult<Vec<StockMovement>> {
    updated(old, new, 1)
}

/// Removing a purchase takes its quantity back out of stock.
///
/// ## Guard
/// ```text
/// on hand 2, purchase qty 5 → 2 - 5 = -3 < 0 → NegativeStock, nothing written
/// ```
pub fn purchase_deleted(purchase: StockLine<'_>, on_hand: i64) -> CoreResult<Vec<StockMovement>> {
    checked(purchase)?;
    ensure_non_negative(purchase.product_id, on_hand, -purchase.quantity)?;
    Ok(vec![StockMovement::new(purchase.product_id, -purchase.quantity)])
}

// =============================================================================
// Sales
// =============================================================================

/// A new sale removes its quantity from the product.
///
/// Not guarded: selling ahead of recorded stock is allowed and the caller
/// logs it.
pub fn sale_created(product_id: &str, quantity: i64) -> CoreResult<Vec<StockMovement>> {
    checked(StockLine::new(product_id, quantity))?;
    Ok(vec![StockMovement::new(product_id, -quantity)])
}

/// Mirror of [`purchase_updated`] with the sign inverted.
pub fn sale_updated(old: StockLine<'_>, new: StockLine<'_>) -> CoreResult<Vec<StockMovement>> {
    updated(old, new, -1)
}

/// Removing a sale returns its quantity to stock.
pub fn sale_deleted(sale: StockLine<'_>) -> CoreResult<Vec<StockMovement>> {
    checked(sale)?;
    Ok(vec![StockMovement::new(sale.product_id, sale.quantity)])
}

// =============================================================================
// Adjustments
// =============================================================================

/// A write-off removes stock; refused when it exceeds what is on hand.
pub fn adjustment_created(
    product_id: &str,
    quantity: i64,
    on_hand: i64,
) -> CoreResult<Vec<StockMovement>> {
    checked(StockLine::new(product_id, quantity))?;
    ensure_non_negative(product_id, on_hand, -quantity)?;
    Ok(vec![StockMovement::new(product_id, -quantity)])
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    type Book = BTreeMap<String, i64>;

    fn book(entries: &[(&str, i64)]) -> Book {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn apply(book: &mut Book, movements: &[StockMovement]) {
        for m in movements {
            *book.entry(m.product_id.clone()).or_insert(0) += m.delta;
        }
    }

    #[test]
    fn test_purchase_create_then_delete_restores_stock() {
        for start in [0, 1, 10, 250] {
            for qty in [1, 5, 999] {
                let mut stock = book(&[("p", start)]);
                apply(&mut stock, &purchase_created("p", qty).unwrap());
                let on_hand = stock["p"];
                apply(
                    &mut stock,
                    &purchase_deleted(StockLine::new("p", qty), on_hand).unwrap(),
                );
                assert_eq!(stock["p"], start);
            }
        }
    }

    #[test]
    fn test_sale_create_then_delete_restores_stock() {
        for start in [-3, 0, 10] {
            for qty in [1, 4, 20] {
                let mut stock = book(&[("p", start)]);
                apply(&mut stock, &sale_created("p", qty).unwrap());
                apply(&mut stock, &sale_deleted(StockLine::new("p", qty)).unwrap());
                assert_eq!(stock["p"], start);
            }
        }
    }

    #[test]
    fn test_purchase_delete_refused_when_stock_would_go_negative() {
        let err = purchase_deleted(StockLine::new("q", 5), 2).unwrap_err();
        match err {
            CoreError::NegativeStock {
                product_id,
                on_hand,
                change,
            } => {
                assert_eq!(product_id, "q");
                assert_eq!(on_hand, 2);
                assert_eq!(change, -5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Exactly reaching zero is fine.
        assert!(purchase_deleted(StockLine::new("q", 2), 2).is_ok());
    }

    #[test]
    fn test_quantity_only_edit_moves_signed_delta() {
        for (old, new) in [(5, 8), (8, 5), (3, 3), (1, 100)] {
            let purchase = purchase_updated(StockLine::new("p", old), StockLine::new("p", new)).unwrap();
            let sale = sale_updated(StockLine::new("p", old), StockLine::new("p", new)).unwrap();

            let mut a = book(&[("p", 50)]);
            apply(&mut a, &purchase);
            assert_eq!(a["p"] - 50, new - old);

            let mut b = book(&[("p", 50)]);
            apply(&mut b, &sale);
            assert_eq!(b["p"] - 50, old - new);
        }
    }

    #[test]
    fn test_unchanged_edit_produces_no_movement() {
        assert!(purchase_updated(StockLine::new("p", 4), StockLine::new("p", 4))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_product_change_matches_delete_then_recreate() {
        let old = StockLine::new("a", 4);
        let new = StockLine::new("b", 7);

        let mut via_edit = book(&[("a", 20), ("b", 20)]);
        apply(&mut via_edit, &purchase_updated(old, new).unwrap());

        let mut via_recreate = book(&[("a", 20), ("b", 20)]);
        apply(&mut via_recreate, &purchase_deleted(old, 20).unwrap());
        apply(&mut via_recreate, &purchase_created("b", 7).unwrap());

        assert_eq!(via_edit, via_recreate);
        assert_eq!(via_edit["a"], 16);
        assert_eq!(via_edit["b"], 27);

        let mut sale_edit = book(&[("a", 20), ("b", 20)]);
        apply(&mut sale_edit, &sale_updated(old, new).unwrap());
        let mut sale_recreate = book(&[("a", 20), ("b", 20)]);
        apply(&mut sale_recreate, &sale_deleted(old).unwrap());
        apply(&mut sale_recreate, &sale_created("b", 7).unwrap());
        assert_eq!(sale_edit, sale_recreate);
    }

    #[test]
    fn test_purchase_sale_scenario() {
        let mut stock = book(&[("P", 10)]);
        apply(&mut stock, &purchase_created("P", 5).unwrap());
        assert_eq!(stock["P"], 15);

        apply(&mut stock, &sale_created("P", 3).unwrap());
        assert_eq!(stock["P"], 12);

        apply(&mut stock, &sale_deleted(StockLine::new("P", 3)).unwrap());
        assert_eq!(stock["P"], 15);
    }

    #[test]
    fn test_adjustment_guard() {
        assert_eq!(
            adjustment_created("p", 3, 10).unwrap(),
            vec![StockMovement::new("p", -3)]
        );
        assert!(matches!(
            adjustment_created("p", 11, 10),
            Err(CoreError::NegativeStock { .. })
        ));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        assert!(matches!(
            purchase_created("p", 0),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(sale_created("p", -1), Err(CoreError::Validation(_))));
        assert!(matches!(
            sale_updated(StockLine::new("p", 1), StockLine::new("p", 0)),
            Err(CoreError::Validation(_))
        ));
    }
}
