//! # Reports
//!
//! Read-only views over the ledger: profit & loss, the daily ledger, the
//! dashboard, low stock, global search and the filtered sales/purchase
//! reports.
//!
//! ## P&L and Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RangeSelector ──resolve──► ResolvedRange [start, end]                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  revenue lines                       expense lines                      │
//! │  ProfitSource::Sales:    sales ⋈ products                               │
//! │  ProfitSource::Invoices: invoice_items ⋈ invoices ⋈ products            │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │  finance::compute_profit_loss / compute_ledger  (pure)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! COGS uses each product's cost price at read time. Editing a product's
//! cost therefore changes historical COGS.
//!
//! A failed read returns [`AggregationFailure`] and is logged; a range
//! with no activity returns zeroed figures.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shopledger_core::date_range::{RangeSelector, ResolvedRange};
use shopledger_core::finance::{
    compute_ledger, compute_profit_loss, ExpenseLine, Ledger, ProfitLoss, ProfitSource, SaleLine,
};
use shopledger_core::{Category, Customer, Invoice, Money, Product, Purchase, Sale, Supplier};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, error};

use crate::error::{AggregationFailure, DbError, DbResult};
use crate::repository::category::CategoryRepository;
use crate::repository::invoice::InvoiceRepository;
use crate::repository::party::{CustomerRepository, SupplierRepository};
use crate::repository::product::ProductRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::sale::SaleRepository;

/// Rows per module returned by [`ReportRepository::search`].
pub const SEARCH_LIMIT: u32 = 10;

/// Entries in each "recent" list on the dashboard.
pub const DASHBOARD_RECENT: u32 = 5;

// =============================================================================
// Types
// =============================================================================

/// Headline figures for the home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_products: i64,
    /// Σ quantity × cost price.
    pub stock_value: Money,
    pub low_stock_count: i64,
    pub today_sales_count: i64,
    /// Σ sale totals dated today.
    pub today_sales_amount: Money,
    pub today_purchases_count: i64,
    pub today_purchases_amount: Money,
    pub recent_invoices: Vec<Invoice>,
    pub recent_sales: Vec<Sale>,
    pub recent_purchases: Vec<Purchase>,
}

/// Which tables a global search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchModule {
    #[default]
    All,
    Products,
    Customers,
    Suppliers,
    Invoices,
    Categories,
}

impl SearchModule {
    pub const NAMES: [&'static str; 6] = [
        "all",
        "products",
        "customers",
        "suppliers",
        "invoices",
        "categories",
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Some(SearchModule::All),
            "products" => Some(SearchModule::Products),
            "customers" => Some(SearchModule::Customers),
            "suppliers" => Some(SearchModule::Suppliers),
            "invoices" => Some(SearchModule::Invoices),
            "categories" => Some(SearchModule::Categories),
            _ => None,
        }
    }

    fn covers(&self, module: SearchModule) -> bool {
        *self == SearchModule::All || *self == module
    }
}

/// Search hits grouped by module. Modules not searched are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customers: Option<Vec<Customer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<Vec<Supplier>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoices: Option<Vec<Invoice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.products.as_ref().map_or(true, Vec::is_empty)
            && self.customers.as_ref().map_or(true, Vec::is_empty)
            && self.suppliers.as_ref().map_or(true, Vec::is_empty)
            && self.invoices.as_ref().map_or(true, Vec::is_empty)
            && self.categories.as_ref().map_or(true, Vec::is_empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Sales,
    Purchases,
    Profit,
}

impl ReportKind {
    pub const NAMES: [&'static str; 3] = ["sales", "purchases", "profit"];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sales" => Some(ReportKind::Sales),
            "purchases" => Some(ReportKind::Purchases),
            "profit" => Some(ReportKind::Profit),
            _ => None,
        }
    }
}

/// Filters for [`ReportRepository::report`].
///
/// `from` and `to` are inclusive calendar days. The customer filter applies
/// to sales only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQuery {
    pub kind: ReportKind,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SaleReportRow {
    pub id: String,
    pub date: NaiveDateTime,
    pub product_id: String,
    pub product_name: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub quantity: i64,
    pub rate_minor: i64,
    pub discount_minor: i64,
    pub total_minor: i64,
    pub net_minor: i64,
    pub paid_minor: i64,
    pub credit_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PurchaseReportRow {
    pub id: String,
    pub date: NaiveDateTime,
    pub product_id: String,
    pub product_name: String,
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,
    pub quantity: i64,
    pub price_per_unit_minor: i64,
    pub total_minor: i64,
}

/// Σ sale totals against Σ purchase totals for the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitSummary {
    pub total_sales: Money,
    pub total_purchase: Money,
    pub profit: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ReportOutput {
    Sales(Vec<SaleReportRow>),
    Purchases(Vec<PurchaseReportRow>),
    Profit(ProfitSummary),
}

#[derive(Debug, FromRow)]
struct RevenueRow {
    date: NaiveDateTime,
    quantity: i64,
    rate_minor: i64,
    unit_cost_minor: i64,
}

#[derive(Debug, FromRow)]
struct ExpenseRow {
    date: NaiveDateTime,
    amount_minor: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Read-only reporting facade.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Profit & loss / ledger
    // -------------------------------------------------------------------------

    /// P&L for a range resolved against the local clock.
    pub async fn profit_loss(
        &self,
        selector: RangeSelector,
        source: ProfitSource,
    ) -> Result<ProfitLoss, AggregationFailure> {
        self.profit_loss_in(selector.resolve(), source).await
    }

    /// P&L for a range resolved against a given day.
    pub async fn profit_loss_at(
        &self,
        selector: RangeSelector,
        source: ProfitSource,
        today: NaiveDate,
    ) -> Result<ProfitLoss, AggregationFailure> {
        self.profit_loss_in(selector.resolve_at(today), source).await
    }

    async fn profit_loss_in(
        &self,
        range: ResolvedRange,
        source: ProfitSource,
    ) -> Result<ProfitLoss, AggregationFailure> {
        let (sales, expenses) = self
            .lines(&range, source)
            .await
            .map_err(|e| failure("profit_loss", &range, e))?;

        Ok(compute_profit_loss(range, source, &sales, &expenses))
    }

    /// Day-by-day ledger for a range resolved against the local clock.
    pub async fn ledger(
        &self,
        selector: RangeSelector,
        source: ProfitSource,
    ) -> Result<Ledger, AggregationFailure> {
        self.ledger_in(selector.resolve(), source).await
    }

    pub async fn ledger_at(
        &self,
        selector: RangeSelector,
        source: ProfitSource,
        today: NaiveDate,
    ) -> Result<Ledger, AggregationFailure> {
        self.ledger_in(selector.resolve_at(today), source).await
    }

    async fn ledger_in(
        &self,
        range: ResolvedRange,
        source: ProfitSource,
    ) -> Result<Ledger, AggregationFailure> {
        let (sales, expenses) = self
            .lines(&range, source)
            .await
            .map_err(|e| failure("ledger", &range, e))?;

        Ok(compute_ledger(range, source, &sales, &expenses))
    }

    async fn lines(
        &self,
        range: &ResolvedRange,
        source: ProfitSource,
    ) -> DbResult<(Vec<SaleLine>, Vec<ExpenseLine>)> {
        debug!(start = %range.start, end = %range.end, source = source.as_str(), "Reading report lines");

        let revenue_sql = match source {
            ProfitSource::Sales => {
                r#"
                SELECT s.date AS date, s.quantity AS quantity, s.rate_minor AS rate_minor,
                       p.price_minor AS unit_cost_minor
                FROM sales s
                JOIN products p ON p.id = s.product_id
                WHERE s.date >= ?1 AND s.date <= ?2
                "#
            }
            ProfitSource::Invoices => {
                r#"
                SELECT i.date AS date, it.quantity AS quantity,
                       it.price_per_unit_minor AS rate_minor, p.price_minor AS unit_cost_minor
                FROM invoice_items it
                JOIN invoices i ON i.id = it.invoice_id
                JOIN products p ON p.id = it.product_id
                WHERE i.date >= ?1 AND i.date <= ?2
                "#
            }
        };

        let sales = sqlx::query_as::<_, RevenueRow>(revenue_sql)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| SaleLine {
                date: row.date,
                quantity: row.quantity,
                rate: Money::from_minor(row.rate_minor),
                unit_cost: Money::from_minor(row.unit_cost_minor),
            })
            .collect();

        let expenses = sqlx::query_as::<_, ExpenseRow>(
            "SELECT date, amount_minor FROM expenses WHERE date >= ?1 AND date <= ?2",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| ExpenseLine {
            date: row.date,
            amount: Money::from_minor(row.amount_minor),
        })
        .collect();

        Ok((sales, expenses))
    }

    // -------------------------------------------------------------------------
    // Dashboard, low stock, search
    // -------------------------------------------------------------------------

    /// Dashboard figures for the local "today".
    pub async fn dashboard_summary(&self) -> DbResult<DashboardSummary> {
        self.dashboard_summary_at(Local::now().date_naive()).await
    }

    pub async fn dashboard_summary_at(&self, today: NaiveDate) -> DbResult<DashboardSummary> {
        let (total_products, stock_value, low_stock_count): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(quantity * price_minor), 0),
                   COALESCE(SUM(CASE WHEN quantity <= low_stock_threshold THEN 1 ELSE 0 END), 0)
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let day = RangeSelector::Explicit {
            from: today,
            to: today,
        }
        .resolve_at(today);

        let (today_sales_count, today_sales_amount): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(total_minor), 0) FROM sales WHERE date >= ?1 AND date <= ?2",
        )
        .bind(day.start)
        .bind(day.end)
        .fetch_one(&self.pool)
        .await?;

        let (today_purchases_count, today_purchases_amount): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(total_minor), 0) FROM purchases WHERE date >= ?1 AND date <= ?2",
        )
        .bind(day.start)
        .bind(day.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardSummary {
            total_products,
            stock_value: Money::from_minor(stock_value),
            low_stock_count,
            today_sales_count,
            today_sales_amount: Money::from_minor(today_sales_amount),
            today_purchases_count,
            today_purchases_amount: Money::from_minor(today_purchases_amount),
            recent_invoices: InvoiceRepository::new(self.pool.clone())
                .recent(DASHBOARD_RECENT)
                .await?,
            recent_sales: SaleRepository::new(self.pool.clone())
                .recent(DASHBOARD_RECENT)
                .await?,
            recent_purchases: PurchaseRepository::new(self.pool.clone())
                .recent(DASHBOARD_RECENT)
                .await?,
        })
    }

    /// Products at or below their threshold, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        ProductRepository::new(self.pool.clone()).low_stock().await
    }

    /// Substring search across one module or all of them.
    ///
    /// A blank query returns empty results without touching the database.
    pub async fn search(&self, query: &str, module: SearchModule) -> DbResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults::default());
        }

        debug!(query = %query, module = ?module, "Global search");

        let mut results = SearchResults::default();
        if module.covers(SearchModule::Products) {
            results.products = Some(
                ProductRepository::new(self.pool.clone())
                    .search(query, SEARCH_LIMIT)
                    .await?,
            );
        }
        if module.covers(SearchModule::Customers) {
            results.customers = Some(
                CustomerRepository::new(self.pool.clone())
                    .search(query, SEARCH_LIMIT)
                    .await?,
            );
        }
        if module.covers(SearchModule::Suppliers) {
            results.suppliers = Some(
                SupplierRepository::new(self.pool.clone())
                    .search(query, SEARCH_LIMIT)
                    .await?,
            );
        }
        if module.covers(SearchModule::Invoices) {
            results.invoices = Some(
                InvoiceRepository::new(self.pool.clone())
                    .search(query, SEARCH_LIMIT)
                    .await?,
            );
        }
        if module.covers(SearchModule::Categories) {
            results.categories = Some(
                CategoryRepository::new(self.pool.clone())
                    .search(query, SEARCH_LIMIT)
                    .await?,
            );
        }

        Ok(results)
    }

    // -------------------------------------------------------------------------
    // Filtered reports
    // -------------------------------------------------------------------------

    /// Sales rows, purchase rows or a sales-vs-purchases summary.
    pub async fn report(&self, query: &ReportQuery) -> DbResult<ReportOutput> {
        let range = RangeSelector::Explicit {
            from: query.from,
            to: query.to,
        }
        .resolve_at(query.from);

        debug!(kind = ?query.kind, start = %range.start, end = %range.end, "Building report");

        match query.kind {
            ReportKind::Sales => Ok(ReportOutput::Sales(self.sale_rows(&range, query).await?)),
            ReportKind::Purchases => Ok(ReportOutput::Purchases(
                self.purchase_rows(&range, query).await?,
            )),
            ReportKind::Profit => {
                let total_sales: Money = self
                    .sale_rows(&range, query)
                    .await?
                    .iter()
                    .map(|row| Money::from_minor(row.total_minor))
                    .sum();
                let total_purchase: Money = self
                    .purchase_rows(&range, query)
                    .await?
                    .iter()
                    .map(|row| Money::from_minor(row.total_minor))
                    .sum();

                Ok(ReportOutput::Profit(ProfitSummary {
                    total_sales,
                    total_purchase,
                    profit: total_sales - total_purchase,
                }))
            }
        }
    }

    async fn sale_rows(
        &self,
        range: &ResolvedRange,
        query: &ReportQuery,
    ) -> DbResult<Vec<SaleReportRow>> {
        let rows = sqlx::query_as::<_, SaleReportRow>(
            r#"
            SELECT s.id, s.date, s.product_id, p.name AS product_name,
                   s.customer_id, c.name AS customer_name,
                   s.quantity, s.rate_minor, s.discount_minor, s.total_minor,
                   s.net_minor, s.paid_minor, s.credit_minor
            FROM sales s
            JOIN products p ON p.id = s.product_id
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE s.date >= ?1 AND s.date <= ?2
              AND (?3 IS NULL OR s.customer_id = ?3)
              AND (?4 IS NULL OR s.product_id = ?4)
            ORDER BY s.date DESC, s.created_at DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(&query.customer_id)
        .bind(&query.product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn purchase_rows(
        &self,
        range: &ResolvedRange,
        query: &ReportQuery,
    ) -> DbResult<Vec<PurchaseReportRow>> {
        let rows = sqlx::query_as::<_, PurchaseReportRow>(
            r#"
            SELECT pu.id, pu.date, pu.product_id, p.name AS product_name,
                   pu.supplier_id, su.name AS supplier_name,
                   pu.quantity, pu.price_per_unit_minor, pu.total_minor
            FROM purchases pu
            JOIN products p ON p.id = pu.product_id
            LEFT JOIN suppliers su ON su.id = pu.supplier_id
            WHERE pu.date >= ?1 AND pu.date <= ?2
              AND (?3 IS NULL OR pu.product_id = ?3)
            ORDER BY pu.date DESC, pu.created_at DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(&query.product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

fn failure(report: &'static str, range: &ResolvedRange, err: DbError) -> AggregationFailure {
    error!(
        report,
        start = %range.start,
        end = %range.end,
        error = %err,
        "Aggregation read failed"
    );
    AggregationFailure::new(report, err)
}
