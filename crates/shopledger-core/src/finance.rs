//! # Financial Aggregation Engine
//!
//! Profit & loss figures and a day-bucketed ledger over a resolved date range.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RangeSelector ──resolve──► ResolvedRange [start, end]                  │
//! │                                   │                                     │
//! │           ┌───────────────────────┼───────────────────────┐             │
//! │           ▼                       ▼                       ▼             │
//! │  SaleLine (qty, rate, cost)   ExpenseLine (amount)   (db fetch)         │
//! │           │                       │                                     │
//! │           ▼                       ▼                                     │
//! │  revenue = Σ qty × rate      expenses = Σ amount                        │
//! │  cogs    = Σ qty × cost                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  gross  = revenue - cogs                                                │
//! │  net    = gross - expenses                                              │
//! │  normal = Σ (rate - cost) × qty    (per-line cross-check of gross)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Known Limitation
//! `cost` is the product's cost price at the time the report is read. Editing
//! a product's price retroactively changes historical COGS.
//!
//! All arithmetic is integer `Money`, so the identities above hold exactly.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::date_range::ResolvedRange;
use crate::money::Money;

// =============================================================================
// Inputs
// =============================================================================

/// Where revenue lines come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitSource {
    /// The sales table.
    #[default]
    Sales,
    /// Invoice items, dated by their invoice.
    Invoices,
}

impl ProfitSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfitSource::Sales => "sales",
            ProfitSource::Invoices => "invoices",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sales" | "sale" => Some(ProfitSource::Sales),
            "invoices" | "invoice" => Some(ProfitSource::Invoices),
            _ => None,
        }
    }
}

/// One revenue line joined to its product's cost price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub date: NaiveDateTime,
    pub quantity: i64,
    /// Selling price per unit.
    pub rate: Money,
    /// Product cost price per unit at read time.
    pub unit_cost: Money,
}

impl SaleLine {
    pub fn revenue(&self) -> Money {
        self.rate.multiply_quantity(self.quantity)
    }

    pub fn cogs(&self) -> Money {
        self.unit_cost.multiply_quantity(self.quantity)
    }
}

/// One expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub date: NaiveDateTime,
    pub amount: Money,
}

// =============================================================================
// Profit & Loss
// =============================================================================

/// P&L for a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitLoss {
    pub range: ResolvedRange,
    pub source: ProfitSource,
    pub revenue: Money,
    pub cogs: Money,
    pub gross_profit: Money,
    pub expenses: Money,
    pub net_profit: Money,
    /// Σ (rate - cost) × qty, computed line by line.
    pub normal_profit: Money,
}

impl ProfitLoss {
    /// Zeroed figures for a range with no activity.
    pub fn empty(range: ResolvedRange, source: ProfitSource) -> Self {
        ProfitLoss {
            range,
            source,
            revenue: Money::zero(),
            cogs: Money::zero(),
            gross_profit: Money::zero(),
            expenses: Money::zero(),
            net_profit: Money::zero(),
            normal_profit: Money::zero(),
        }
    }
}

/// Computes P&L figures. Lines outside `range` are ignored.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use shopledger_core::date_range::RangeSelector;
/// use shopledger_core::finance::{compute_profit_loss, ProfitSource, SaleLine};
/// use shopledger_core::money::Money;
///
/// let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let range = RangeSelector::Explicit { from, to: from }.resolve_at(from);
/// let sale = SaleLine {
///     date: from.and_hms_opt(10, 0, 0).unwrap(),
///     quantity: 3,
///     rate: Money::from_major(80),
///     unit_cost: Money::from_major(50),
/// };
///
/// let pl = compute_profit_loss(range, ProfitSource::Sales, &[sale], &[]);
/// assert_eq!(pl.revenue, Money::from_major(240));
/// assert_eq!(pl.cogs, Money::from_major(150));
/// assert_eq!(pl.gross_profit, Money::from_major(90));
/// ```
pub fn compute_profit_loss(
    range: ResolvedRange,
    source: ProfitSource,
    sales: &[SaleLine],
    expenses: &[ExpenseLine],
) -> ProfitLoss {
    let in_range_sales = sales.iter().filter(|s| range.contains(s.date));

    let mut revenue = Money::zero();
    let mut cogs = Money::zero();
    let mut normal_profit = Money::zero();
    for line in in_range_sales {
        revenue += line.revenue();
        cogs += line.cogs();
        normal_profit += (line.rate - line.unit_cost).multiply_quantity(line.quantity);
    }

    let expenses: Money = expenses
        .iter()
        .filter(|e| range.contains(e.date))
        .map(|e| e.amount)
        .sum();

    let gross_profit = revenue - cogs;
    let net_profit = gross_profit - expenses;

    ProfitLoss {
        range,
        source,
        revenue,
        cogs,
        gross_profit,
        expenses,
        net_profit,
        normal_profit,
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// One calendar day of activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub sales: Money,
    pub cogs: Money,
    pub expenses: Money,
    /// `sales - cogs - expenses`
    pub profit: Money,
}

impl LedgerRow {
    fn new(date: NaiveDate) -> Self {
        LedgerRow {
            date,
            sales: Money::zero(),
            cogs: Money::zero(),
            expenses: Money::zero(),
            profit: Money::zero(),
        }
    }
}

/// Day-bucketed P&L for a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub range: ResolvedRange,
    pub source: ProfitSource,
    /// Newest day first. Days without activity are absent.
    pub rows: Vec<LedgerRow>,
}

/// Groups sales and expenses by calendar day, newest first.
pub fn compute_ledger(
    range: ResolvedRange,
    source: ProfitSource,
    sales: &[SaleLine],
    expenses: &[ExpenseLine],
) -> Ledger {
    let mut days: BTreeMap<NaiveDate, LedgerRow> = BTreeMap::new();

    for line in sales.iter().filter(|s| range.contains(s.date)) {
        let day = line.date.date();
        let row = days.entry(day).or_insert_with(|| LedgerRow::new(day));
        row.sales += line.revenue();
        row.cogs += line.cogs();
    }

    for expense in expenses.iter().filter(|e| range.contains(e.date)) {
        let day = expense.date.date();
        let row = days.entry(day).or_insert_with(|| LedgerRow::new(day));
        row.expenses += expense.amount;
    }

    let rows = days
        .into_values()
        .rev()
        .map(|mut row| {
            row.profit = row.sales - row.cogs - row.expenses;
            row
        })
        .collect();

    Ledger {
        range,
        source,
        rows,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_range::RangeSelector;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn january() -> ResolvedRange {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        RangeSelector::Explicit { from, to }.resolve_at(from)
    }

    fn sale(date: NaiveDateTime, qty: i64, rate: i64, cost: i64) -> SaleLine {
        SaleLine {
            date,
            quantity: qty,
            rate: Money::from_minor(rate),
            unit_cost: Money::from_minor(cost),
        }
    }

    fn expense(date: NaiveDateTime, amount: i64) -> ExpenseLine {
        ExpenseLine {
            date,
            amount: Money::from_minor(amount),
        }
    }

    #[test]
    fn test_profit_identities_hold_for_generated_data() {
        // Deterministic pseudo-random dataset.
        let mut seed: i64 = 17;
        let mut next = |modulo: i64| {
            seed = (seed * 1_103_515_245 + 12_345) % 2_147_483_648;
            seed % modulo
        };

        for _ in 0..20 {
            let sales: Vec<SaleLine> = (0..30)
                .map(|_| {
                    let day = 1 + next(31) as u32;
                    sale(at(2024, 1, day, 12), 1 + next(50), next(100_000), next(100_000))
                })
                .collect();
            let expenses: Vec<ExpenseLine> = (0..10)
                .map(|_| expense(at(2024, 1, 1 + next(31) as u32, 9), next(500_000)))
                .collect();

            let pl = compute_profit_loss(january(), ProfitSource::Sales, &sales, &expenses);
            assert_eq!(pl.gross_profit, pl.revenue - pl.cogs);
            assert_eq!(pl.net_profit, pl.gross_profit - pl.expenses);
            assert_eq!(pl.normal_profit, pl.gross_profit);

            let ledger = compute_ledger(january(), ProfitSource::Sales, &sales, &expenses);
            let summed: Money = ledger.rows.iter().map(|r| r.profit).sum();
            assert_eq!(summed, pl.net_profit);
        }
    }

    #[test]
    fn test_scenario_revenue_and_cogs() {
        let sales = [sale(at(2024, 1, 10, 11), 3, 8000, 5000)];
        let pl = compute_profit_loss(january(), ProfitSource::Sales, &sales, &[]);
        assert_eq!(pl.revenue, Money::from_major(240));
        assert_eq!(pl.cogs, Money::from_major(150));
        assert_eq!(pl.net_profit, Money::from_major(90));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let sales = [
            sale(at(2024, 1, 1, 0), 1, 100, 0),
            sale(
                NaiveDate::from_ymd_opt(2024, 1, 31)
                    .unwrap()
                    .and_hms_milli_opt(23, 59, 59, 999)
                    .unwrap(),
                1,
                100,
                0,
            ),
            sale(at(2024, 2, 1, 0), 1, 100, 0),
            sale(at(2023, 12, 31, 23), 1, 100, 0),
        ];
        let pl = compute_profit_loss(january(), ProfitSource::Sales, &sales, &[]);
        assert_eq!(pl.revenue.minor(), 200);
    }

    #[test]
    fn test_empty_range_is_zero() {
        let pl = compute_profit_loss(january(), ProfitSource::Invoices, &[], &[]);
        assert_eq!(pl, ProfitLoss::empty(january(), ProfitSource::Invoices));
    }

    #[test]
    fn test_ledger_is_sparse_and_newest_first() {
        let sales = [
            sale(at(2024, 1, 3, 10), 2, 1000, 600),
            sale(at(2024, 1, 3, 17), 1, 1000, 600),
            sale(at(2024, 1, 20, 10), 1, 500, 100),
        ];
        let expenses = [expense(at(2024, 1, 7, 9), 250), expense(at(2024, 1, 3, 9), 100)];

        let ledger = compute_ledger(january(), ProfitSource::Sales, &sales, &expenses);
        let days: Vec<String> = ledger.rows.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(days, vec!["2024-01-20", "2024-01-07", "2024-01-03"]);

        let jan3 = &ledger.rows[2];
        assert_eq!(jan3.sales.minor(), 3000);
        assert_eq!(jan3.cogs.minor(), 1800);
        assert_eq!(jan3.expenses.minor(), 100);
        assert_eq!(jan3.profit.minor(), 1100);

        let jan7 = &ledger.rows[1];
        assert_eq!(jan7.sales, Money::zero());
        assert_eq!(jan7.profit.minor(), -250);
    }

    #[test]
    fn test_ledger_row_serializes_day_key() {
        let row = LedgerRow::new(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["date"], "2024-01-05");
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(ProfitSource::parse("Invoices"), Some(ProfitSource::Invoices));
        assert_eq!(ProfitSource::parse("sales"), Some(ProfitSource::Sales));
        assert_eq!(ProfitSource::parse("x"), None);
    }
}
