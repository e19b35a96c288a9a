//! # Report Commands
//!
//! ```text
//! report dashboard
//! report low-stock
//! report search <query> [--module products|customers|...]
//! report profit-loss [--range this_month | --from 2024-01-01 --to 2024-01-31] [--source invoices]
//! report ledger      [...same range flags...] [--csv]
//! report export --kind sales|purchases|profit --from ... --to ... [--json]
//! ```
//!
//! An unknown `--range` falls back to this week; a `--from`/`--to` pair
//! overrides `--range`.

use clap::{Args, Subcommand};
use shopledger_core::date_range::RangeSelector;
use shopledger_core::finance::ProfitSource;
use shopledger_core::validation::{optional_id, parse_date, validate_search_query};
use shopledger_core::ValidationError;
use shopledger_db::export::{export_ledger, export_report};
use shopledger_db::reports::{ReportKind, ReportQuery, SearchModule};
use shopledger_db::Database;

use super::{json, CommandResult, Output};
use crate::config::AppConfig;
use crate::error::ApiError;

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Headline figures for today
    Dashboard,

    /// Products at or below their low-stock threshold
    LowStock,

    /// Search across products, customers, suppliers, invoices and categories
    Search {
        query: String,
        #[arg(long, default_value = "all")]
        module: String,
    },

    /// Revenue, COGS, expenses and profit for a period
    ProfitLoss(RangeArgs),

    /// Day-by-day profit for a period, newest first
    Ledger {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        csv: bool,
    },

    /// Sales rows, purchase rows or a sales-vs-purchases summary as CSV
    Export {
        #[arg(long, default_value = "")]
        kind: String,
        #[arg(long, default_value = "")]
        from: String,
        #[arg(long, default_value = "")]
        to: String,
        /// Sales only
        #[arg(long)]
        customer_id: Option<String>,
        #[arg(long)]
        product_id: Option<String>,
        /// Print JSON instead of CSV
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct RangeArgs {
    /// today, this_week, last_week, this_month, last_month, financial_year
    #[arg(long)]
    pub range: Option<String>,
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub to: Option<String>,
    /// sales or invoices
    #[arg(long, default_value = "sales")]
    pub source: String,
}

impl RangeArgs {
    fn parse(&self) -> Result<(RangeSelector, ProfitSource), ApiError> {
        let selector = RangeSelector::from_parts(
            self.range.as_deref(),
            self.from.as_deref(),
            self.to.as_deref(),
        )?;
        let source = ProfitSource::parse(&self.source).ok_or_else(|| ValidationError::NotAllowed {
            field: "source".to_string(),
            allowed: vec!["sales".to_string(), "invoices".to_string()],
        })?;
        Ok((selector, source))
    }
}

fn not_allowed(field: &str, allowed: &[&str]) -> ValidationError {
    ValidationError::NotAllowed {
        field: field.to_string(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    }
}

fn csv(write: impl FnOnce(&mut Vec<u8>) -> shopledger_db::DbResult<()>) -> CommandResult {
    let mut buf = Vec::new();
    write(&mut buf)?;
    String::from_utf8(buf)
        .map(Output::Csv)
        .map_err(|e| ApiError::internal(format!("CSV output is not UTF-8: {}", e)))
}

pub async fn run(db: &Database, config: &AppConfig, cmd: ReportCommand) -> CommandResult {
    let reports = db.reports();

    match cmd {
        ReportCommand::Dashboard => json(&reports.dashboard_summary().await?),
        ReportCommand::LowStock => json(&reports.low_stock().await?),
        ReportCommand::Search { query, module } => {
            let query = validate_search_query(&query)?;
            let module = SearchModule::parse(&module)
                .ok_or_else(|| not_allowed("module", &SearchModule::NAMES))?;
            json(&reports.search(&query, module).await?)
        }
        ReportCommand::ProfitLoss(range) => {
            let (selector, source) = range.parse()?;
            let pl = reports.profit_loss(selector, source).await?;

            let mut out = serde_json::to_value(&pl)
                .map_err(|e| ApiError::internal(format!("Failed to serialize output: {}", e)))?;
            out["formatted"] = serde_json::json!({
                "revenue": config.format_currency(pl.revenue),
                "cogs": config.format_currency(pl.cogs),
                "gross_profit": config.format_currency(pl.gross_profit),
                "expenses": config.format_currency(pl.expenses),
                "net_profit": config.format_currency(pl.net_profit),
            });
            Ok(Output::Json(out))
        }
        ReportCommand::Ledger { range, csv: as_csv } => {
            let (selector, source) = range.parse()?;
            let ledger = reports.ledger(selector, source).await?;
            if as_csv {
                csv(|buf| export_ledger(&ledger, buf))
            } else {
                json(&ledger)
            }
        }
        ReportCommand::Export {
            kind,
            from,
            to,
            customer_id,
            product_id,
            json: as_json,
        } => {
            let kind =
                ReportKind::parse(&kind).ok_or_else(|| not_allowed("kind", &ReportKind::NAMES))?;
            let query = ReportQuery {
                kind,
                from: parse_date("from", &from)?,
                to: parse_date("to", &to)?,
                customer_id: optional_id("customer_id", customer_id.as_deref())?,
                product_id: optional_id("product_id", product_id.as_deref())?,
            };
            if query.to < query.from {
                return Err(ValidationError::InvalidFormat {
                    field: "to".to_string(),
                    reason: "must not be before from".to_string(),
                }
                .into());
            }

            let report = reports.report(&query).await?;
            if as_json {
                json(&report)
            } else {
                csv(|buf| export_report(&report, buf))
            }
        }
    }
}
