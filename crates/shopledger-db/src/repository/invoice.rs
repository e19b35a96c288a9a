//! # Invoice Repository
//!
//! Invoices are documents: a header with a GST breakdown and one or more
//! item lines. They never move stock.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvoiceInput                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute_totals(items, discount, gst)   ← subtotal, taxes, total       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    check every item's product exists                                   │
//! │    INSERT/UPDATE invoices                                               │
//! │    DELETE old invoice_items (update only), INSERT new ones             │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use shopledger_core::invoice::{compute_totals, InvoiceTotals};
use shopledger_core::{Invoice, InvoiceInput, InvoiceItem, InvoiceWithItems};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;
use crate::stock::on_hand;

const SELECT_INVOICE: &str = r#"
    SELECT id, invoice_number, customer_id, date, subtotal_minor, discount_minor,
           gst_mode, cgst_bps, cgst_minor, sgst_bps, sgst_minor, igst_bps, igst_minor,
           total_minor, remarks, created_at, updated_at
    FROM invoices
"#;

/// Repository for invoices and their items.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Lists invoice headers, newest first.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let sql = format!("{SELECT_INVOICE} ORDER BY date DESC, created_at DESC");
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// The most recently created invoices.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Invoice>> {
        let sql = format!("{SELECT_INVOICE} ORDER BY created_at DESC LIMIT ?1");
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Invoices whose number contains `query`.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Invoice>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{SELECT_INVOICE} WHERE invoice_number LIKE '%' || ?1 || '%' ORDER BY date DESC LIMIT ?2"
        );
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Gets an invoice with its items; item lines carry the product name.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InvoiceWithItems>> {
        let mut conn = self.pool.acquire().await?;

        let Some(invoice) = fetch_header(&mut conn, id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT it.id, it.invoice_id, it.product_id, p.name AS product_name,
                   it.quantity, it.price_per_unit_minor, it.total_minor
            FROM invoice_items it
            LEFT JOIN products p ON p.id = it.product_id
            WHERE it.invoice_id = ?1
            ORDER BY it.rowid
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(InvoiceWithItems { invoice, items }))
    }

    /// Creates an invoice with its items.
    ///
    /// ## Errors
    /// * `UniqueViolation { field: "invoice_number" }` - number already used
    /// * `NotFound` - an item references an unknown product
    /// * `Domain(Validation)` - no items, bad quantity, discount above subtotal
    pub async fn create(&self, input: &InvoiceInput) -> DbResult<InvoiceWithItems> {
        let totals = compute_totals(&input.items, input.discount, input.gst)?;

        let mut tx = self.pool.begin().await?;
        ensure_products(&mut tx, input).await?;

        let now = Utc::now();
        let invoice = header(generate_id(), input, &totals, now, now);

        debug!(invoice_number = %invoice.invoice_number, items = input.items.len(), "Inserting invoice");

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, customer_id, date, subtotal_minor, discount_minor,
                gst_mode, cgst_bps, cgst_minor, sgst_bps, sgst_minor, igst_bps, igst_minor,
                total_minor, remarks, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer_id)
        .bind(invoice.date)
        .bind(invoice.subtotal_minor)
        .bind(invoice.discount_minor)
        .bind(invoice.gst_mode)
        .bind(invoice.cgst_bps)
        .bind(invoice.cgst_minor)
        .bind(invoice.sgst_bps)
        .bind(invoice.sgst_minor)
        .bind(invoice.igst_bps)
        .bind(invoice.igst_minor)
        .bind(invoice.total_minor)
        .bind(&invoice.remarks)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_value(&input.invoice_number))?;

        let items = insert_items(&mut tx, &invoice.id, input, &totals).await?;
        tx.commit().await?;

        info!(id = %invoice.id, invoice_number = %invoice.invoice_number, total = invoice.total_minor, "Invoice created");
        Ok(InvoiceWithItems { invoice, items })
    }

    /// Replaces an invoice's header and items in one transaction.
    pub async fn update(&self, id: &str, input: &InvoiceInput) -> DbResult<InvoiceWithItems> {
        let totals = compute_totals(&input.items, input.discount, input.gst)?;

        let mut tx = self.pool.begin().await?;

        let existing = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;
        ensure_products(&mut tx, input).await?;

        let invoice = header(id.to_string(), input, &totals, existing.created_at, Utc::now());

        sqlx::query(
            r#"
            UPDATE invoices SET
                invoice_number = ?2,
                customer_id = ?3,
                date = ?4,
                subtotal_minor = ?5,
                discount_minor = ?6,
                gst_mode = ?7,
                cgst_bps = ?8,
                cgst_minor = ?9,
                sgst_bps = ?10,
                sgst_minor = ?11,
                igst_bps = ?12,
                igst_minor = ?13,
                total_minor = ?14,
                remarks = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer_id)
        .bind(invoice.date)
        .bind(invoice.subtotal_minor)
        .bind(invoice.discount_minor)
        .bind(invoice.gst_mode)
        .bind(invoice.cgst_bps)
        .bind(invoice.cgst_minor)
        .bind(invoice.sgst_bps)
        .bind(invoice.sgst_minor)
        .bind(invoice.igst_bps)
        .bind(invoice.igst_minor)
        .bind(invoice.total_minor)
        .bind(&invoice.remarks)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_value(&input.invoice_number))?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let items = insert_items(&mut tx, id, input, &totals).await?;
        tx.commit().await?;

        info!(id = %id, invoice_number = %invoice.invoice_number, "Invoice updated");
        Ok(InvoiceWithItems { invoice, items })
    }

    /// Deletes an invoice: items first, then the header.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        tx.commit().await?;

        info!(id = %id, "Invoice deleted");
        Ok(())
    }
}

fn header(
    id: String,
    input: &InvoiceInput,
    totals: &InvoiceTotals,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Invoice {
    Invoice {
        id,
        invoice_number: input.invoice_number.clone(),
        customer_id: input.customer_id.clone(),
        date: input.date,
        subtotal_minor: totals.subtotal.minor(),
        discount_minor: totals.discount.minor(),
        gst_mode: totals.rates.mode,
        cgst_bps: totals.rates.cgst.bps(),
        cgst_minor: totals.cgst.minor(),
        sgst_bps: totals.rates.sgst.bps(),
        sgst_minor: totals.sgst.minor(),
        igst_bps: totals.rates.igst.bps(),
        igst_minor: totals.igst.minor(),
        total_minor: totals.total.minor(),
        remarks: input.remarks.clone(),
        created_at,
        updated_at,
    }
}

async fn fetch_header(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Invoice>> {
    let sql = format!("{SELECT_INVOICE} WHERE id = ?1");
    let invoice = sqlx::query_as::<_, Invoice>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(invoice)
}

async fn ensure_products(conn: &mut SqliteConnection, input: &InvoiceInput) -> DbResult<()> {
    for item in &input.items {
        on_hand(conn, &item.product_id).await?;
    }
    Ok(())
}

async fn insert_items(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    input: &InvoiceInput,
    totals: &InvoiceTotals,
) -> DbResult<Vec<InvoiceItem>> {
    let mut items = Vec::with_capacity(input.items.len());

    for (line, line_total) in input.items.iter().zip(&totals.line_totals) {
        let item = InvoiceItem {
            id: generate_id(),
            invoice_id: invoice_id.to_string(),
            product_id: line.product_id.clone(),
            product_name: None,
            quantity: line.quantity,
            price_per_unit_minor: line.price_per_unit.minor(),
            total_minor: line_total.minor(),
        };

        sqlx::query(
            r#"
            INSERT INTO invoice_items (id, invoice_id, product_id, quantity, price_per_unit_minor, total_minor)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.invoice_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.price_per_unit_minor)
        .bind(item.total_minor)
        .execute(&mut *conn)
        .await?;

        items.push(item);
    }

    Ok(items)
}
