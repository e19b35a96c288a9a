//! # Commands
//!
//! One module per subcommand group. Each group parses its raw string
//! arguments into a core form, validates it, and only then calls the
//! database layer.
//!
//! ```text
//! clap args ──► *Form ──parse()──► *Input ──► Database ──► Output
//!                         │                      │
//!                         └── ValidationError    └── DbError / AggregationFailure
//!                                      └──────────┬──────────┘
//!                                                 ▼
//!                                              ApiError
//! ```

pub mod adjust;
pub mod expense;
pub mod invoice;
pub mod master;
pub mod product;
pub mod purchase;
pub mod report;
pub mod sale;
pub mod settings;

use clap::Subcommand;
use serde::Serialize;
use shopledger_db::Database;

use crate::config::AppConfig;
use crate::error::ApiError;

/// What a successful command prints.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Json(serde_json::Value),
    Csv(String),
}

pub type CommandResult = Result<Output, ApiError>;

pub(crate) fn json<T: Serialize>(value: &T) -> CommandResult {
    serde_json::to_value(value)
        .map(Output::Json)
        .map_err(|e| ApiError::internal(format!("Failed to serialize output: {}", e)))
}

pub(crate) fn deleted(id: &str) -> CommandResult {
    Ok(Output::Json(serde_json::json!({ "deleted": id })))
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Products and their stock
    #[command(subcommand)]
    Product(product::ProductCommand),

    /// Stock purchases
    #[command(subcommand)]
    Purchase(purchase::PurchaseCommand),

    /// Sales
    #[command(subcommand)]
    Sale(sale::SaleCommand),

    /// Manual stock adjustments
    #[command(subcommand)]
    Adjust(adjust::AdjustCommand),

    /// GST invoices
    #[command(subcommand)]
    Invoice(invoice::InvoiceCommand),

    /// Business expenses
    #[command(subcommand)]
    Expense(expense::ExpenseCommand),

    #[command(subcommand)]
    Customer(master::PartyCommand),

    #[command(subcommand)]
    Supplier(master::PartyCommand),

    /// Product categories
    #[command(subcommand)]
    Category(master::CategoryCommand),

    #[command(subcommand, name = "expense-category")]
    ExpenseCategory(master::CategoryCommand),

    /// Business profile
    #[command(subcommand)]
    Settings(settings::SettingsCommand),

    /// Dashboard, search, P&L, ledger and exports
    #[command(subcommand)]
    Report(report::ReportCommand),
}

impl Command {
    pub async fn run(self, db: &Database, config: &AppConfig) -> CommandResult {
        match self {
            Command::Product(cmd) => product::run(db, cmd).await,
            Command::Purchase(cmd) => purchase::run(db, cmd).await,
            Command::Sale(cmd) => sale::run(db, cmd).await,
            Command::Adjust(cmd) => adjust::run(db, cmd).await,
            Command::Invoice(cmd) => invoice::run(db, cmd).await,
            Command::Expense(cmd) => expense::run(db, cmd).await,
            Command::Customer(cmd) => master::run_party(db.customers(), cmd).await,
            Command::Supplier(cmd) => master::run_party(db.suppliers(), cmd).await,
            Command::Category(cmd) => master::run_named(db.categories(), cmd).await,
            Command::ExpenseCategory(cmd) => {
                master::run_named(db.expense_categories(), cmd).await
            }
            Command::Settings(cmd) => settings::run(db, cmd).await,
            Command::Report(cmd) => report::run(db, config, cmd).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use shopledger_db::{Database, DbConfig};

    use super::Output;

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn value(output: Output) -> serde_json::Value {
        match output {
            Output::Json(value) => value,
            Output::Csv(text) => panic!("expected JSON, got CSV: {text}"),
        }
    }
}
