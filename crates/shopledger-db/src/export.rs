//! # CSV Export
//!
//! Writes report output and ledgers as CSV. Amounts are two-decimal
//! strings without a currency symbol, dates are `YYYY-MM-DD`.

use std::io::Write;

use shopledger_core::finance::Ledger;
use shopledger_core::Money;

use crate::error::{DbError, DbResult};
use crate::reports::{ProfitSummary, PurchaseReportRow, ReportOutput, SaleReportRow};

const SALES_HEADER: &[&str] = &[
    "date",
    "product",
    "customer",
    "quantity",
    "rate",
    "discount",
    "total",
    "net",
    "paid",
    "credit",
];

const PURCHASES_HEADER: &[&str] = &[
    "date",
    "product",
    "supplier",
    "quantity",
    "price_per_unit",
    "total",
];

const PROFIT_HEADER: &[&str] = &["total_sales", "total_purchase", "profit"];

const LEDGER_HEADER: &[&str] = &["date", "sales", "cogs", "expenses", "profit"];

fn writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

fn amount(minor: i64) -> String {
    Money::from_minor(minor).to_string()
}

/// Writes any report kind with its own header row.
pub fn export_report<W: Write>(report: &ReportOutput, out: W) -> DbResult<()> {
    match report {
        ReportOutput::Sales(rows) => write_sales(rows, out),
        ReportOutput::Purchases(rows) => write_purchases(rows, out),
        ReportOutput::Profit(summary) => write_profit(summary, out),
    }
}

fn write_sales<W: Write>(rows: &[SaleReportRow], out: W) -> DbResult<()> {
    let mut csv = writer(out);
    csv.write_record(SALES_HEADER)?;

    for row in rows {
        csv.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.product_name.clone(),
            row.customer_name.clone().unwrap_or_default(),
            row.quantity.to_string(),
            amount(row.rate_minor),
            amount(row.discount_minor),
            amount(row.total_minor),
            amount(row.net_minor),
            amount(row.paid_minor),
            amount(row.credit_minor),
        ])?;
    }

    finish(csv)
}

fn write_purchases<W: Write>(rows: &[PurchaseReportRow], out: W) -> DbResult<()> {
    let mut csv = writer(out);
    csv.write_record(PURCHASES_HEADER)?;

    for row in rows {
        csv.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.product_name.clone(),
            row.supplier_name.clone().unwrap_or_default(),
            row.quantity.to_string(),
            amount(row.price_per_unit_minor),
            amount(row.total_minor),
        ])?;
    }

    finish(csv)
}

fn write_profit<W: Write>(summary: &ProfitSummary, out: W) -> DbResult<()> {
    let mut csv = writer(out);
    csv.write_record(PROFIT_HEADER)?;
    csv.write_record([
        summary.total_sales.to_string(),
        summary.total_purchase.to_string(),
        summary.profit.to_string(),
    ])?;
    finish(csv)
}

/// Writes one line per ledger day, newest first.
pub fn export_ledger<W: Write>(ledger: &Ledger, out: W) -> DbResult<()> {
    let mut csv = writer(out);
    csv.write_record(LEDGER_HEADER)?;

    for row in &ledger.rows {
        csv.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.sales.to_string(),
            row.cogs.to_string(),
            row.expenses.to_string(),
            row.profit.to_string(),
        ])?;
    }

    finish(csv)
}

fn finish<W: Write>(mut csv: csv::Writer<W>) -> DbResult<()> {
    csv.flush().map_err(|e| DbError::Export(e.to_string()))
}
