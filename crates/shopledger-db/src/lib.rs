//! # shopledger-db: Ledger Store for shopledger
//!
//! This crate persists the shop's ledger in SQLite and applies the stock
//! reconciliation rules from `shopledger-core` inside database transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        shopledger Data Flow                             │
//! │                                                                         │
//! │  CLI command (sale add)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  shopledger-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ purchase/sale │    │  (embedded)  │  │   │
//! │  │   │               │    │ invoice/...   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ stock.rs      │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │          ▲                                                      │   │
//! │  │          │             ┌───────────────┐    ┌──────────────┐  │   │
//! │  │          └─────────────│  reports.rs   │───►│  export.rs   │  │   │
//! │  │                        │ P&L, ledger   │    │  CSV         │  │   │
//! │  │                        └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`reports`] - Read-only reporting facade
//! - [`export`] - CSV export of report rows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopledger_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/shopledger.db")).await?;
//! let sale = db.sales().create(&input).await?;
//! let summary = db.reports().dashboard_summary().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod migrations;
pub mod pool;
pub mod reports;
pub mod repository;
mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{AggregationFailure, DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use reports::ReportRepository;

// Repository re-exports for convenience
pub use repository::category::{CategoryRepository, ExpenseCategoryRepository};
pub use repository::expense::ExpenseRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::party::{CustomerRepository, SupplierRepository};
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::sale::SaleRepository;
pub use repository::settings::SettingsRepository;
pub use repository::stock_adjustment::StockAdjustmentRepository;

/// Generates a new entity id.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, NaiveDateTime};
    use shopledger_core::{Money, NewProduct, Product};

    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    pub async fn product(db: &Database, name: &str, quantity: i64, cost_major: i64) -> Product {
        db.products()
            .insert(&NewProduct {
                name: name.to_string(),
                sku: None,
                description: None,
                price: Money::from_major(cost_major),
                selling_price: None,
                quantity,
                low_stock_threshold: None,
                category_id: None,
            })
            .await
            .unwrap()
    }

    pub async fn quantity(db: &Database, id: &str) -> i64 {
        db.products().get(id).await.unwrap().quantity
    }
}
