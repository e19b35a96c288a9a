//! # Sale Repository
//!
//! Sales take stock out. Every write runs in one transaction together with
//! the product quantity change it causes.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create   product -= qty        (not refused on short stock; a warning │
//! │                                  is logged when quantity goes below 0) │
//! │                                                                         │
//! │  update   same product    → product -= new.qty - old.qty               │
//! │           product changed → old += old.qty, new -= new.qty             │
//! │                                                                         │
//! │  delete   product += qty                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are derived from the input, never taken on trust:
//! `total = qty × rate`, `net = total - discount`, `credit = net - paid`
//! unless the caller supplied one.

use chrono::Utc;
use shopledger_core::stock::{self, StockLine};
use shopledger_core::{Sale, SaleInput};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;
use crate::stock::{apply_movements, on_hand, warn_if_negative};

const SELECT_SALE: &str = r#"
    SELECT id, product_id, customer_id, quantity, rate_minor, price_per_unit_minor,
           discount_minor, total_minor, net_minor, paid_minor, credit_minor,
           remarks, date, created_at
    FROM sales
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists sales, newest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("{SELECT_SALE} ORDER BY date DESC, created_at DESC");
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// The most recently recorded sales.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!("{SELECT_SALE} ORDER BY created_at DESC LIMIT ?1");
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Records a sale and takes its quantity out of stock.
    pub async fn create(&self, input: &SaleInput) -> DbResult<Sale> {
        let amounts = input.amounts()?;

        let mut tx = self.pool.begin().await?;
        on_hand(&mut tx, &input.product_id).await?;

        let movements = stock::sale_created(&input.product_id, input.quantity)?;

        let sale = Sale {
            id: generate_id(),
            product_id: input.product_id.clone(),
            customer_id: input.customer_id.clone(),
            quantity: input.quantity,
            rate_minor: input.rate.minor(),
            price_per_unit_minor: amounts.price_per_unit.minor(),
            discount_minor: input.discount.minor(),
            total_minor: amounts.total.minor(),
            net_minor: amounts.net.minor(),
            paid_minor: amounts.paid.minor(),
            credit_minor: amounts.credit.minor(),
            remarks: input.remarks.clone(),
            date: input.date,
            created_at: Utc::now(),
        };

        debug!(product_id = %sale.product_id, quantity = sale.quantity, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, product_id, customer_id, quantity, rate_minor, price_per_unit_minor,
                discount_minor, total_minor, net_minor, paid_minor, credit_minor,
                remarks, date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.product_id)
        .bind(&sale.customer_id)
        .bind(sale.quantity)
        .bind(sale.rate_minor)
        .bind(sale.price_per_unit_minor)
        .bind(sale.discount_minor)
        .bind(sale.total_minor)
        .bind(sale.net_minor)
        .bind(sale.paid_minor)
        .bind(sale.credit_minor)
        .bind(&sale.remarks)
        .bind(sale.date)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        apply_movements(&mut tx, &movements).await?;
        warn_if_negative(&mut tx, &movements).await?;
        tx.commit().await?;

        info!(id = %sale.id, product_id = %sale.product_id, quantity = sale.quantity, "Sale recorded");
        Ok(sale)
    }

    /// Edits a sale, moving only the net stock difference.
    pub async fn update(&self, id: &str, input: &SaleInput) -> DbResult<Sale> {
        let amounts = input.amounts()?;

        let mut tx = self.pool.begin().await?;

        let old = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;
        on_hand(&mut tx, &input.product_id).await?;

        let movements = stock::sale_updated(
            StockLine::new(&old.product_id, old.quantity),
            StockLine::new(&input.product_id, input.quantity),
        )?;

        debug!(id = %id, movements = movements.len(), "Updating sale");

        sqlx::query(
            r#"
            UPDATE sales SET
                product_id = ?2,
                customer_id = ?3,
                quantity = ?4,
                rate_minor = ?5,
                price_per_unit_minor = ?6,
                discount_minor = ?7,
                total_minor = ?8,
                net_minor = ?9,
                paid_minor = ?10,
                credit_minor = ?11,
                remarks = ?12,
                date = ?13
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.product_id)
        .bind(&input.customer_id)
        .bind(input.quantity)
        .bind(input.rate.minor())
        .bind(amounts.price_per_unit.minor())
        .bind(input.discount.minor())
        .bind(amounts.total.minor())
        .bind(amounts.net.minor())
        .bind(amounts.paid.minor())
        .bind(amounts.credit.minor())
        .bind(&input.remarks)
        .bind(input.date)
        .execute(&mut *tx)
        .await?;

        apply_movements(&mut tx, &movements).await?;
        warn_if_negative(&mut tx, &movements).await?;

        let sale = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;
        tx.commit().await?;

        info!(id = %id, "Sale updated");
        Ok(sale)
    }

    /// Deletes a sale and returns its quantity to stock.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let movements = stock::sale_deleted(StockLine::new(&sale.product_id, sale.quantity))?;

        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        apply_movements(&mut tx, &movements).await?;
        tx.commit().await?;

        info!(id = %id, product_id = %sale.product_id, "Sale deleted");
        Ok(())
    }
}

async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sql = format!("{SELECT_SALE} WHERE id = ?1");
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(sale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, day, quantity};
    use shopledger_core::{CoreError, Money, ProductChoice, PurchaseInput, ValidationError};

    fn sale_of(product_id: &str, qty: i64, rate_major: i64) -> SaleInput {
        SaleInput {
            product_id: product_id.to_string(),
            customer_id: None,
            quantity: qty,
            rate: Money::from_major(rate_major),
            price_per_unit: None,
            discount: Money::zero(),
            paid: Money::zero(),
            credit: None,
            remarks: None,
            date: day(2024, 1, 10),
        }
    }

    #[tokio::test]
    async fn test_purchase_sale_delete_scenario() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "P", 10, 50).await;

        db.purchases()
            .create(&PurchaseInput {
                product: ProductChoice::Existing(p.id.clone()),
                supplier_id: None,
                quantity: 5,
                price_per_unit: Money::from_major(50),
                date: day(2024, 1, 9),
            })
            .await
            .unwrap();
        assert_eq!(quantity(&db, &p.id).await, 15);

        let sale = db.sales().create(&sale_of(&p.id, 3, 80)).await.unwrap();
        assert_eq!(quantity(&db, &p.id).await, 12);
        assert_eq!(sale.total_minor, 24000);

        db.sales().delete(&sale.id).await.unwrap();
        assert_eq!(quantity(&db, &p.id).await, 15);
    }

    #[tokio::test]
    async fn test_amounts_are_derived() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "P", 10, 50).await;

        let mut input = sale_of(&p.id, 3, 80);
        input.discount = Money::from_major(10);
        input.paid = Money::from_major(200);

        let sale = db.sales().create(&input).await.unwrap();
        assert_eq!(sale.total_minor, 24000);
        assert_eq!(sale.net_minor, 23000);
        assert_eq!(sale.credit_minor, 3000);
        assert_eq!(sale.price_per_unit_minor, 8000);

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored, sale);
    }

    #[tokio::test]
    async fn test_sale_may_oversell() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "P", 1, 50).await;

        db.sales().create(&sale_of(&p.id, 3, 80)).await.unwrap();
        assert_eq!(quantity(&db, &p.id).await, -2);
    }

    #[tokio::test]
    async fn test_invalid_sale_writes_nothing() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "P", 10, 50).await;

        let mut input = sale_of(&p.id, 1, 80);
        input.discount = Money::from_major(81);
        let err = db.sales().create(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let err = db.sales().create(&sale_of(&p.id, 0, 80)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        assert_eq!(quantity(&db, &p.id).await, 10);
        assert!(db.sales().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_delta_and_product_change() {
        let db = test_support::db().await;
        let a = test_support::product(&db, "A", 20, 50).await;
        let b = test_support::product(&db, "B", 20, 50).await;
        let sale = db.sales().create(&sale_of(&a.id, 5, 80)).await.unwrap();
        assert_eq!(quantity(&db, &a.id).await, 15);

        db.sales().update(&sale.id, &sale_of(&a.id, 7, 80)).await.unwrap();
        assert_eq!(quantity(&db, &a.id).await, 13);

        let moved = db.sales().update(&sale.id, &sale_of(&b.id, 4, 90)).await.unwrap();
        assert_eq!(quantity(&db, &a.id).await, 20);
        assert_eq!(quantity(&db, &b.id).await, 16);
        assert_eq!(moved.total_minor, 36000);
    }

    #[tokio::test]
    async fn test_missing_sale() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "P", 1, 50).await;
        let missing = "0b7e4a44-1c5f-4f3e-9a53-2d1f6a1c0e11";

        assert!(matches!(
            db.sales().delete(missing).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.sales().update(missing, &sale_of(&p.id, 1, 80)).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
