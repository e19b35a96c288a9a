//! # Invoice Totals
//!
//! Recomputes an invoice's subtotal, GST breakdown and total from its lines.
//! Totals sent by a client are never trusted.
//!
//! ```text
//! subtotal = Σ qty × price_per_unit
//! taxable  = subtotal - discount
//! CGST+SGST mode:  cgst = taxable × cgst%   sgst = taxable × sgst%   igst = 0
//! IGST mode:       igst = taxable × igst%   cgst = sgst = 0
//! total    = taxable + cgst + sgst + igst
//! ```
//!
//! Each tax amount is rounded half away from zero to the paisa.

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{GstMode, GstRates, InvoiceItemInput, TaxRate};
use crate::validation::validate_quantity;

/// Computed invoice amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// One total per input line, in order.
    pub line_totals: Vec<Money>,
    pub subtotal: Money,
    pub discount: Money,
    pub taxable: Money,
    /// The rates actually applied; the inactive mode's rates are zero.
    pub rates: GstRates,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub total: Money,
}

impl GstRates {
    /// Zeroes the rates that do not belong to the selected mode.
    pub fn effective(&self) -> GstRates {
        match self.mode {
            GstMode::CgstSgst => GstRates {
                igst: TaxRate::zero(),
                ..*self
            },
            GstMode::Igst => GstRates {
                cgst: TaxRate::zero(),
                sgst: TaxRate::zero(),
                ..*self
            },
        }
    }
}

/// Computes invoice totals.
///
/// ## Errors
/// - no items
/// - a line with a non-positive quantity
/// - discount larger than the subtotal
///
/// ## Example
/// ```rust
/// use shopledger_core::invoice::compute_totals;
/// use shopledger_core::money::Money;
/// use shopledger_core::types::{GstMode, GstRates, InvoiceItemInput, TaxRate};
///
/// let items = vec![InvoiceItemInput {
///     product_id: "p".into(),
///     quantity: 2,
///     price_per_unit: Money::from_major(500),
/// }];
/// let gst = GstRates {
///     mode: GstMode::CgstSgst,
///     cgst: TaxRate::from_bps(900),
///     sgst: TaxRate::from_bps(900),
///     igst: TaxRate::zero(),
/// };
/// let totals = compute_totals(&items, Money::from_major(100), gst).unwrap();
/// assert_eq!(totals.taxable, Money::from_major(900));
/// assert_eq!(totals.cgst, Money::from_major(81));
/// assert_eq!(totals.total, Money::from_major(1062));
/// ```
pub fn compute_totals(
    items: &[InvoiceItemInput],
    discount: Money,
    gst: GstRates,
) -> CoreResult<InvoiceTotals> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }

    let mut line_totals = Vec::with_capacity(items.len());
    for item in items {
        validate_quantity("items.quantity", item.quantity)?;
        if item.price_per_unit.is_negative() {
            return Err(ValidationError::Negative {
                field: "items.price_per_unit".to_string(),
            }
            .into());
        }
        line_totals.push(item.price_per_unit.multiply_quantity(item.quantity));
    }
    let subtotal: Money = line_totals.iter().sum();

    if discount.is_negative() {
        return Err(ValidationError::Negative {
            field: "discount".to_string(),
        }
        .into());
    }
    if discount > subtotal {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: subtotal.minor(),
        }
        .into());
    }

    let taxable = subtotal - discount;
    let rates = gst.effective();
    let cgst = taxable.apply_rate(rates.cgst);
    let sgst = taxable.apply_rate(rates.sgst);
    let igst = taxable.apply_rate(rates.igst);
    let total = taxable + cgst + sgst + igst;

    Ok(InvoiceTotals {
        line_totals,
        subtotal,
        discount,
        taxable,
        rates,
        cgst,
        sgst,
        igst,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn item(qty: i64, ppu_minor: i64) -> InvoiceItemInput {
        InvoiceItemInput {
            product_id: "p".to_string(),
            quantity: qty,
            price_per_unit: Money::from_minor(ppu_minor),
        }
    }

    fn rates(mode: GstMode, cgst: u32, sgst: u32, igst: u32) -> GstRates {
        GstRates {
            mode,
            cgst: TaxRate::from_bps(cgst),
            sgst: TaxRate::from_bps(sgst),
            igst: TaxRate::from_bps(igst),
        }
    }

    #[test]
    fn test_subtotal_is_sum_of_lines() {
        let totals = compute_totals(
            &[item(2, 1050), item(1, 999)],
            Money::zero(),
            GstRates::default(),
        )
        .unwrap();
        assert_eq!(
            totals.line_totals,
            vec![Money::from_minor(2100), Money::from_minor(999)]
        );
        assert_eq!(totals.subtotal.minor(), 3099);
        assert_eq!(totals.total.minor(), 3099);
    }

    #[test]
    fn test_igst_mode_ignores_cgst_and_sgst() {
        let totals = compute_totals(
            &[item(1, 10000)],
            Money::zero(),
            rates(GstMode::Igst, 900, 900, 1800),
        )
        .unwrap();
        assert_eq!(totals.cgst, Money::zero());
        assert_eq!(totals.sgst, Money::zero());
        assert_eq!(totals.igst.minor(), 1800);
        assert_eq!(totals.rates.cgst, TaxRate::zero());
        assert_eq!(totals.total.minor(), 11800);
    }

    #[test]
    fn test_cgst_sgst_mode_ignores_igst() {
        let totals = compute_totals(
            &[item(3, 333)],
            Money::from_minor(99),
            rates(GstMode::CgstSgst, 250, 250, 1800),
        )
        .unwrap();
        // taxable 900, 2.5% = 22.5 → 23 each
        assert_eq!(totals.taxable.minor(), 900);
        assert_eq!(totals.cgst.minor(), 23);
        assert_eq!(totals.sgst.minor(), 23);
        assert_eq!(totals.igst, Money::zero());
        assert_eq!(totals.total.minor(), 946);
    }

    #[test]
    fn test_rejects_bad_invoices() {
        assert!(matches!(
            compute_totals(&[], Money::zero(), GstRates::default()),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert!(matches!(
            compute_totals(&[item(0, 100)], Money::zero(), GstRates::default()),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            compute_totals(&[item(1, 100)], Money::from_minor(101), GstRates::default()),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }
}
