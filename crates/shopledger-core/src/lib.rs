//! # shopledger-core: Pure Business Logic for shopledger
//!
//! This crate holds the rules that keep product stock correct and the
//! arithmetic behind profit & loss reporting. Everything here is a pure
//! function over plain data; the database crate feeds it rows and persists
//! what it decides.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        shopledger Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Command layer (apps/cli)                     │   │
//! │  │    purchase add, sale update, invoice add, report profit-loss  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shopledger-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌──────────┐  ┌────────────────┐  │   │
//! │  │   │  stock  │  │ finance │  │date_range│  │ invoice (GST)  │  │   │
//! │  │   └─────────┘  └─────────┘  └──────────┘  └────────────────┘  │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌──────────┐                       │   │
//! │  │   │  types  │  │  money  │  │validation│                       │   │
//! │  │   └─────────┘  └─────────┘  └──────────┘                       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopledger-db (Ledger Store)                    │   │
//! │  │         SQLite queries, transactions, repositories              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Purchase, Sale, Invoice, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation and parsing
//! - [`form`] - Raw string forms parsed into validated inputs
//! - [`stock`] - Stock Reconciliation Rules
//! - [`finance`] - Financial Aggregation Engine
//! - [`date_range`] - Date-Range Resolver
//! - [`invoice`] - Invoice subtotal / GST / total computation
//!
//! ## Example Usage
//!
//! ```rust
//! use shopledger_core::stock::{sale_created, StockMovement};
//!
//! let movements = sale_created("prod-1", 3).unwrap();
//! assert_eq!(movements, vec![StockMovement::new("prod-1", -3)]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod date_range;
pub mod error;
pub mod finance;
pub mod form;
pub mod invoice;
pub mod money;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Low-stock threshold used when neither the product nor the settings row
/// provides one.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum quantity accepted on a single purchase, sale or adjustment.
///
/// ## Business Reason
/// Catches fat-finger entries (typing 100000 instead of 100) before they
/// land in stock.
pub const MAX_ITEM_QUANTITY: i64 = 1_000_000;

/// Largest single amount accepted from input, in minor units (₹10 crore).
///
/// Keeps `amount × MAX_ITEM_QUANTITY` and period totals inside `i64`.
pub const MAX_AMOUNT_MINOR: i64 = 10_000_000_000;

/// Sentinel a purchase form sends instead of a product id when the product
/// should be created together with the purchase.
pub const NEW_PRODUCT_SENTINEL: &str = "none";
