//! # Repository Module
//!
//! Database repository implementations for shopledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock-affecting writes                               │
//! │                                                                         │
//! │  db.purchases().delete(id)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    load purchase + on-hand quantity                                    │
//! │    shopledger_core::stock::purchase_deleted(..)  ← may refuse          │
//! │    DELETE FROM purchases ...                                           │
//! │    UPDATE products SET quantity = quantity + delta                     │
//! │  COMMIT                      (any error: the transaction is dropped    │
//! │                               and rolls back, nothing is written)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD, search, low stock
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Purchases (+ stock)
//! - [`SaleRepository`](sale::SaleRepository) - Sales (- stock)
//! - [`StockAdjustmentRepository`](stock_adjustment::StockAdjustmentRepository) - Losses (- stock)
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoices with GST, no stock effect
//! - [`ExpenseRepository`](expense::ExpenseRepository) - Expenses
//! - [`CustomerRepository`](party::CustomerRepository), [`SupplierRepository`](party::SupplierRepository)
//! - [`CategoryRepository`](category::CategoryRepository), [`ExpenseCategoryRepository`](category::ExpenseCategoryRepository)
//! - [`SettingsRepository`](settings::SettingsRepository) - Singleton business profile

pub mod category;
pub mod expense;
pub mod invoice;
pub mod party;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod settings;
pub mod stock_adjustment;
