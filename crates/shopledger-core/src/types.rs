//! # Domain Types
//!
//! Core domain types used throughout shopledger.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Master data                 Stock events (mutate Product.quantity)    │
//! │  ┌─────────────────┐         ┌─────────────────┐  ┌─────────────────┐  │
//! │  │    Product      │◄────────│    Purchase     │  │      Sale       │  │
//! │  │  ─────────────  │         │  + quantity     │  │  - quantity     │  │
//! │  │  quantity       │◄────────┴─────────────────┘  └────────┬────────┘  │
//! │  │  price (cost)   │◄──────────────────────────────────────┘           │
//! │  │  low_stock_thr. │         ┌─────────────────┐                       │
//! │  └─────────────────┘◄────────│ StockAdjustment │  - quantity           │
//! │   Category, Customer,        └─────────────────┘                       │
//! │   Supplier, ExpenseCategory                                            │
//! │                                                                         │
//! │  Documents (never touch stock)                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐         │
//! │  │    Invoice      │──│  InvoiceItem    │  │    Expense      │         │
//! │  │  GST breakdown  │  │  qty × ppu      │  │  amount, date   │         │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘         │
//! │                                                                         │
//! │  Settings: singleton business profile                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dates
//! Business dates (`date` on purchases, sales, invoices, expenses) are local
//! wall-clock `NaiveDateTime` values; a form date `2024-01-15` becomes
//! `2024-01-15T00:00:00`. Audit timestamps (`created_at`, `updated_at`) are
//! `DateTime<Utc>`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 900 bps = 9% (a common CGST slab), 250 bps = 2.5%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Master Data
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A category for expenses (rent, electricity, wages, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExpenseCategory {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A customer. The email, when present, is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A supplier goods are purchased from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or updating a customer or supplier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartyInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
///
/// `quantity` is the single source of truth for on-hand stock. After
/// creation it only changes through the stock reconciliation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Stock Keeping Unit, unique when present.
    pub sku: Option<String>,

    pub description: Option<String>,

    /// Cost (purchase) price in minor units. COGS is computed from this.
    pub price_minor: i64,

    /// Suggested selling price in minor units.
    pub selling_price_minor: Option<i64>,

    /// Current on-hand stock.
    pub quantity: i64,

    /// Flag the product as low stock once `quantity <= low_stock_threshold`.
    pub low_stock_threshold: i64,

    pub category_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the cost price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price_minor)
    }

    /// Returns the selling price, if one is set.
    #[inline]
    pub fn selling_price(&self) -> Option<Money> {
        self.selling_price_minor.map(Money::from_minor)
    }

    /// Value of the stock on hand at cost price.
    pub fn stock_value(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }

    /// Whether the product should appear in low-stock alerts.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

/// Input for creating a product.
///
/// `quantity` is the opening stock. `low_stock_threshold` falls back to the
/// settings default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Money,
    pub selling_price: Option<Money>,
    pub quantity: i64,
    pub low_stock_threshold: Option<i64>,
    pub category_id: Option<String>,
}

/// Input for updating a product. Stock is not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Money,
    pub selling_price: Option<Money>,
    pub low_stock_threshold: i64,
    pub category_id: Option<String>,
}

// =============================================================================
// Purchase
// =============================================================================

/// Stock bought from a supplier. Creation adds `quantity` to the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: String,
    pub product_id: String,
    pub supplier_id: Option<String>,
    pub quantity: i64,
    pub price_per_unit_minor: i64,
    /// Always `quantity × price_per_unit`.
    pub total_minor: i64,
    pub date: NaiveDateTime,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    #[inline]
    pub fn price_per_unit(&self) -> Money {
        Money::from_minor(self.price_per_unit_minor)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }
}

/// Which product a new purchase is for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductChoice {
    /// An existing product by id.
    Existing(String),
    /// Create the product in the same transaction as the purchase.
    New(NewProductSpec),
}

/// What is known about a product first seen on a purchase.
///
/// The product is created with zero stock and cost price equal to the
/// purchase's price per unit; the purchase then adds its quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProductSpec {
    pub name: String,
    pub sku: Option<String>,
    pub category_id: Option<String>,
}

/// Validated input for creating a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseInput {
    pub product: ProductChoice,
    pub supplier_id: Option<String>,
    pub quantity: i64,
    pub price_per_unit: Money,
    pub date: NaiveDateTime,
}

/// Validated input for editing a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseUpdate {
    pub product_id: String,
    pub supplier_id: Option<String>,
    pub quantity: i64,
    pub price_per_unit: Money,
    pub date: NaiveDateTime,
}

// =============================================================================
// Sale
// =============================================================================

/// Stock sold to a customer. Creation removes `quantity` from the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub customer_id: Option<String>,
    pub quantity: i64,
    /// Selling price actually charged per unit.
    pub rate_minor: i64,
    /// Listed price per unit; equals `rate_minor` unless supplied separately.
    pub price_per_unit_minor: i64,
    pub discount_minor: i64,
    /// `quantity × rate`
    pub total_minor: i64,
    /// `total - discount`
    pub net_minor: i64,
    pub paid_minor: i64,
    /// Outstanding amount, `net - paid` unless supplied.
    pub credit_minor: i64,
    pub remarks: Option<String>,
    pub date: NaiveDateTime,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_minor(self.rate_minor)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }

    #[inline]
    pub fn net(&self) -> Money {
        Money::from_minor(self.net_minor)
    }
}

/// Validated input for creating or editing a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleInput {
    pub product_id: String,
    pub customer_id: Option<String>,
    pub quantity: i64,
    pub rate: Money,
    pub price_per_unit: Option<Money>,
    pub discount: Money,
    pub paid: Money,
    pub credit: Option<Money>,
    pub remarks: Option<String>,
    pub date: NaiveDateTime,
}

impl SaleInput {
    /// Derives the stored amounts.
    ///
    /// ```text
    /// total  = quantity × rate
    /// net    = total - discount
    /// credit = net - paid          (unless supplied)
    /// ppu    = rate                (unless supplied)
    /// ```
    ///
    /// A credit below zero means the customer paid in advance.
    pub fn amounts(&self) -> ValidationResult<SaleAmounts> {
        let total = self.rate.multiply_quantity(self.quantity);
        if self.discount.is_negative() {
            return Err(ValidationError::Negative {
                field: "discount".to_string(),
            });
        }
        if self.discount > total {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: total.minor(),
            });
        }
        if self.paid.is_negative() {
            return Err(ValidationError::Negative {
                field: "paid".to_string(),
            });
        }

        let net = total - self.discount;
        Ok(SaleAmounts {
            price_per_unit: self.price_per_unit.unwrap_or(self.rate),
            total,
            net,
            paid: self.paid,
            credit: self.credit.unwrap_or(net - self.paid),
        })
    }
}

/// The derived amounts stored on a sale row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleAmounts {
    pub price_per_unit: Money,
    pub total: Money,
    pub net: Money,
    pub paid: Money,
    pub credit: Money,
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// Why stock was written off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum StockAdjustmentType {
    Damaged,
    Expired,
    Lost,
    Manual,
}

impl StockAdjustmentType {
    /// All variants, in display order.
    pub const ALL: [StockAdjustmentType; 4] = [
        StockAdjustmentType::Damaged,
        StockAdjustmentType::Expired,
        StockAdjustmentType::Lost,
        StockAdjustmentType::Manual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StockAdjustmentType::Damaged => "damaged",
            StockAdjustmentType::Expired => "expired",
            StockAdjustmentType::Lost => "lost",
            StockAdjustmentType::Manual => "manual",
        }
    }

    /// Parses a lowercase type name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim().to_lowercase())
    }
}

/// A stock write-off. Always removes `quantity` from the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockAdjustment {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub adjustment_type: StockAdjustmentType,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a stock adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdjustmentInput {
    pub product_id: String,
    pub quantity: i64,
    pub adjustment_type: StockAdjustmentType,
    pub note: Option<String>,
}

// =============================================================================
// Invoice
// =============================================================================

/// Which GST components apply to an invoice.
///
/// CGST+SGST (intra-state) and IGST (inter-state) are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum GstMode {
    #[default]
    CgstSgst,
    Igst,
}

impl GstMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GstMode::CgstSgst => "cgst_sgst",
            GstMode::Igst => "igst",
        }
    }

    /// Accepts `cgst_sgst`, `CGST_SGST`, `cgst+sgst` and `igst` in any case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('+', "_").as_str() {
            "cgst_sgst" => Some(GstMode::CgstSgst),
            "igst" => Some(GstMode::Igst),
            _ => None,
        }
    }
}

/// GST percentages chosen for an invoice.
///
/// Only the rates belonging to `mode` are applied; the others are stored as
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GstRates {
    pub mode: GstMode,
    pub cgst: TaxRate,
    pub sgst: TaxRate,
    pub igst: TaxRate,
}

/// An invoice header. Totals are always recomputed from the items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: String,
    /// Business identifier, unique.
    pub invoice_number: String,
    pub customer_id: Option<String>,
    pub date: NaiveDateTime,
    pub subtotal_minor: i64,
    pub discount_minor: i64,
    pub gst_mode: GstMode,
    pub cgst_bps: u32,
    pub cgst_minor: i64,
    pub sgst_bps: u32,
    pub sgst_minor: i64,
    pub igst_bps: u32,
    pub igst_minor: i64,
    pub total_minor: i64,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_minor(self.subtotal_minor)
    }
}

/// An invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    /// Filled in when the item is read together with its product.
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub product_name: Option<String>,
    pub quantity: i64,
    pub price_per_unit_minor: i64,
    /// `quantity × price_per_unit`
    pub total_minor: i64,
}

/// An invoice together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

/// One validated invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItemInput {
    pub product_id: String,
    pub quantity: i64,
    pub price_per_unit: Money,
}

/// Validated input for creating or replacing an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceInput {
    pub invoice_number: String,
    pub customer_id: Option<String>,
    pub date: NaiveDateTime,
    pub discount: Money,
    pub gst: GstRates,
    pub remarks: Option<String>,
    pub items: Vec<InvoiceItemInput>,
}

// =============================================================================
// Expense
// =============================================================================

/// A business expense. Feeds the P&L, never touches stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub amount_minor: i64,
    pub date: NaiveDateTime,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor)
    }
}

/// Validated input for creating or editing an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub category_id: Option<String>,
    pub title: String,
    pub amount: Money,
    pub date: NaiveDateTime,
    pub notes: Option<String>,
}

// =============================================================================
// Settings
// =============================================================================

/// The business profile. Exactly one row exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Settings {
    pub id: i64,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub gstin: Option<String>,
    pub invoice_footer: Option<String>,
    /// Threshold given to new products that do not set their own.
    pub default_low_stock: i64,
    pub updated_at: DateTime<Utc>,
}

/// Input for updating the settings row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub gstin: Option<String>,
    pub invoice_footer: Option<String>,
    pub default_low_stock: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: i64, threshold: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Rice 1kg".to_string(),
            sku: None,
            description: None,
            price_minor: 5000,
            selling_price_minor: Some(8000),
            quantity,
            low_stock_threshold: threshold,
            category_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(250);
        assert_eq!(rate.bps(), 250);
        assert!((rate.percentage() - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        assert!(product(5, 5).is_low_stock());
        assert!(product(0, 5).is_low_stock());
        assert!(!product(6, 5).is_low_stock());
    }

    #[test]
    fn test_stock_value_uses_cost_price() {
        assert_eq!(product(12, 5).stock_value().minor(), 60000);
    }

    #[test]
    fn test_adjustment_type_parse() {
        assert_eq!(
            StockAdjustmentType::parse("Damaged"),
            Some(StockAdjustmentType::Damaged)
        );
        assert_eq!(StockAdjustmentType::parse("stolen"), None);
        for t in StockAdjustmentType::ALL {
            assert_eq!(StockAdjustmentType::parse(t.as_str()), Some(t));
        }
    }

    fn sale_input(qty: i64, rate: i64, discount: i64, paid: i64) -> SaleInput {
        SaleInput {
            product_id: "p-1".to_string(),
            customer_id: None,
            quantity: qty,
            rate: Money::from_minor(rate),
            price_per_unit: None,
            discount: Money::from_minor(discount),
            paid: Money::from_minor(paid),
            credit: None,
            remarks: None,
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 10)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_sale_amounts() {
        let amounts = sale_input(3, 8000, 1000, 20000).amounts().unwrap();
        assert_eq!(amounts.total.minor(), 24000);
        assert_eq!(amounts.net.minor(), 23000);
        assert_eq!(amounts.credit.minor(), 3000);
        assert_eq!(amounts.price_per_unit.minor(), 8000);
    }

    #[test]
    fn test_sale_amounts_keep_supplied_credit_and_ppu() {
        let mut input = sale_input(2, 500, 0, 0);
        input.credit = Some(Money::zero());
        input.price_per_unit = Some(Money::from_minor(600));
        let amounts = input.amounts().unwrap();
        assert_eq!(amounts.credit, Money::zero());
        assert_eq!(amounts.price_per_unit.minor(), 600);
    }

    #[test]
    fn test_sale_discount_cannot_exceed_total() {
        assert!(matches!(
            sale_input(1, 500, 501, 0).amounts(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_gst_mode_parse() {
        assert_eq!(GstMode::parse("CGST_SGST"), Some(GstMode::CgstSgst));
        assert_eq!(GstMode::parse("cgst+sgst"), Some(GstMode::CgstSgst));
        assert_eq!(GstMode::parse("IGST"), Some(GstMode::Igst));
        assert_eq!(GstMode::parse("vat"), None);
        assert_eq!(GstMode::default(), GstMode::CgstSgst);
    }
}
