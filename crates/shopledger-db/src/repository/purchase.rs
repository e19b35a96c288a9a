//! # Purchase Repository
//!
//! Purchases add stock. Every write here runs in one transaction together
//! with the product quantity change it causes.
//!
//! ## Purchase Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create   product += qty                                               │
//! │           (ProductChoice::New: the product is inserted first, same tx) │
//! │                                                                         │
//! │  update   same product    → product += new.qty - old.qty               │
//! │           product changed → old -= old.qty, new += new.qty             │
//! │                                                                         │
//! │  delete   product -= qty, refused with NegativeStock when the stock    │
//! │           has already been sold or written off                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use shopledger_core::stock::{self, StockLine};
use shopledger_core::{
    Money, NewProduct, ProductChoice, Purchase, PurchaseInput, PurchaseUpdate,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;
use crate::repository::product::insert_product;
use crate::stock::{apply_movements, on_hand};

const SELECT_PURCHASE: &str = r#"
    SELECT id, product_id, supplier_id, quantity, price_per_unit_minor,
           total_minor, date, created_at
    FROM purchases
"#;

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Lists purchases, newest first.
    pub async fn list(&self) -> DbResult<Vec<Purchase>> {
        let sql = format!("{SELECT_PURCHASE} ORDER BY date DESC, created_at DESC");
        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(purchases)
    }

    /// The most recently recorded purchases.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Purchase>> {
        let sql = format!("{SELECT_PURCHASE} ORDER BY created_at DESC LIMIT ?1");
        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(purchases)
    }

    /// Gets a purchase by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Purchase>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Records a purchase and adds its quantity to stock.
    ///
    /// With [`ProductChoice::New`] the product is created inside the same
    /// transaction with cost price = price per unit and quantity 0, then
    /// receives the purchased quantity like any other product.
    pub async fn create(&self, input: &PurchaseInput) -> DbResult<Purchase> {
        let mut tx = self.pool.begin().await?;

        let product_id = match &input.product {
            ProductChoice::Existing(id) => {
                on_hand(&mut tx, id).await?;
                id.clone()
            }
            ProductChoice::New(spec) => {
                let product = insert_product(
                    &mut tx,
                    &NewProduct {
                        name: spec.name.clone(),
                        sku: spec.sku.clone(),
                        description: None,
                        price: input.price_per_unit,
                        selling_price: None,
                        quantity: 0,
                        low_stock_threshold: None,
                        category_id: spec.category_id.clone(),
                    },
                )
                .await?;
                info!(product_id = %product.id, "Created product from purchase");
                product.id
            }
        };

        let movements = stock::purchase_created(&product_id, input.quantity)?;

        let purchase = Purchase {
            id: generate_id(),
            product_id,
            supplier_id: input.supplier_id.clone(),
            quantity: input.quantity,
            price_per_unit_minor: input.price_per_unit.minor(),
            total_minor: total(input.price_per_unit, input.quantity),
            date: input.date,
            created_at: Utc::now(),
        };

        debug!(product_id = %purchase.product_id, quantity = purchase.quantity, "Inserting purchase");

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, product_id, supplier_id, quantity, price_per_unit_minor,
                total_minor, date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.product_id)
        .bind(&purchase.supplier_id)
        .bind(purchase.quantity)
        .bind(purchase.price_per_unit_minor)
        .bind(purchase.total_minor)
        .bind(purchase.date)
        .bind(purchase.created_at)
        .execute(&mut *tx)
        .await?;

        apply_movements(&mut tx, &movements).await?;
        tx.commit().await?;

        info!(id = %purchase.id, product_id = %purchase.product_id, quantity = purchase.quantity, "Purchase recorded");
        Ok(purchase)
    }

    /// Edits a purchase, moving only the net stock difference.
    pub async fn update(&self, id: &str, update: &PurchaseUpdate) -> DbResult<Purchase> {
        let mut tx = self.pool.begin().await?;

        let old = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))?;
        on_hand(&mut tx, &update.product_id).await?;

        let movements = stock::purchase_updated(
            StockLine::new(&old.product_id, old.quantity),
            StockLine::new(&update.product_id, update.quantity),
        )?;

        debug!(id = %id, movements = movements.len(), "Updating purchase");

        sqlx::query(
            r#"
            UPDATE purchases SET
                product_id = ?2,
                supplier_id = ?3,
                quantity = ?4,
                price_per_unit_minor = ?5,
                total_minor = ?6,
                date = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.product_id)
        .bind(&update.supplier_id)
        .bind(update.quantity)
        .bind(update.price_per_unit.minor())
        .bind(total(update.price_per_unit, update.quantity))
        .bind(update.date)
        .execute(&mut *tx)
        .await?;

        apply_movements(&mut tx, &movements).await?;

        let purchase = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))?;
        tx.commit().await?;

        info!(id = %id, "Purchase updated");
        Ok(purchase)
    }

    /// Deletes a purchase and removes its quantity from stock.
    ///
    /// ## Errors
    /// * `DbError::Domain(CoreError::NegativeStock)` - the product no longer
    ///   holds enough stock; nothing is changed
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let purchase = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))?;
        let current = on_hand(&mut tx, &purchase.product_id).await?;

        let movements = stock::purchase_deleted(
            StockLine::new(&purchase.product_id, purchase.quantity),
            current,
        )?;

        sqlx::query("DELETE FROM purchases WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        apply_movements(&mut tx, &movements).await?;
        tx.commit().await?;

        info!(id = %id, product_id = %purchase.product_id, "Purchase deleted");
        Ok(())
    }
}

fn total(price_per_unit: Money, quantity: i64) -> i64 {
    price_per_unit.multiply_quantity(quantity).minor()
}

async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Purchase>> {
    let sql = format!("{SELECT_PURCHASE} WHERE id = ?1");
    let purchase = sqlx::query_as::<_, Purchase>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(purchase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, day, quantity};
    use shopledger_core::{CoreError, NewProductSpec, SaleInput};

    fn purchase_of(product_id: &str, qty: i64, ppu_major: i64) -> PurchaseInput {
        PurchaseInput {
            product: ProductChoice::Existing(product_id.to_string()),
            supplier_id: None,
            quantity: qty,
            price_per_unit: Money::from_major(ppu_major),
            date: day(2024, 1, 10),
        }
    }

    fn update_of(product_id: &str, qty: i64) -> PurchaseUpdate {
        PurchaseUpdate {
            product_id: product_id.to_string(),
            supplier_id: None,
            quantity: qty,
            price_per_unit: Money::from_major(50),
            date: day(2024, 1, 11),
        }
    }

    #[tokio::test]
    async fn test_create_adds_stock_and_total() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "P", 10, 50).await;

        let purchase = db.purchases().create(&purchase_of(&p.id, 5, 50)).await.unwrap();

        assert_eq!(purchase.total_minor, 25000);
        assert_eq!(quantity(&db, &p.id).await, 15);
        assert_eq!(db.purchases().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_with_new_product() {
        let db = test_support::db().await;

        let purchase = db
            .purchases()
            .create(&PurchaseInput {
                product: ProductChoice::New(NewProductSpec {
                    name: "Mustard Oil 1L".to_string(),
                    sku: Some("OIL-1".to_string()),
                    category_id: None,
                }),
                supplier_id: None,
                quantity: 24,
                price_per_unit: Money::from_major(150),
                date: day(2024, 2, 1),
            })
            .await
            .unwrap();

        let product = db.products().get(&purchase.product_id).await.unwrap();
        assert_eq!(product.name, "Mustard Oil 1L");
        assert_eq!(product.price_minor, 15000);
        assert_eq!(product.quantity, 24);
    }

    #[tokio::test]
    async fn test_create_for_missing_product_writes_nothing() {
        let db = test_support::db().await;
        let err = db
            .purchases()
            .create(&purchase_of("8f14e45f-ceea-467a-9af0-fd3d2ef1b2aa", 5, 50))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
        assert!(db.purchases().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_applies_delta_only() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "P", 10, 50).await;
        let purchase = db.purchases().create(&purchase_of(&p.id, 5, 50)).await.unwrap();

        db.purchases()
            .update(&purchase.id, &update_of(&p.id, 8))
            .await
            .unwrap();
        assert_eq!(quantity(&db, &p.id).await, 18);

        let updated = db
            .purchases()
            .update(&purchase.id, &update_of(&p.id, 2))
            .await
            .unwrap();
        assert_eq!(quantity(&db, &p.id).await, 12);
        assert_eq!(updated.total_minor, 10000);
        assert_eq!(updated.date, day(2024, 1, 11));
    }

    #[tokio::test]
    async fn test_update_moves_stock_between_products() {
        let db = test_support::db().await;
        let a = test_support::product(&db, "A", 10, 50).await;
        let b = test_support::product(&db, "B", 3, 50).await;
        let purchase = db.purchases().create(&purchase_of(&a.id, 5, 50)).await.unwrap();

        db.purchases()
            .update(&purchase.id, &update_of(&b.id, 7))
            .await
            .unwrap();

        assert_eq!(quantity(&db, &a.id).await, 10);
        assert_eq!(quantity(&db, &b.id).await, 10);
    }

    #[tokio::test]
    async fn test_delete_refused_when_stock_already_sold() {
        let db = test_support::db().await;
        let q = test_support::product(&db, "Q", 0, 50).await;
        let purchase = db.purchases().create(&purchase_of(&q.id, 5, 50)).await.unwrap();
        db.sales()
            .create(&SaleInput {
                product_id: q.id.clone(),
                customer_id: None,
                quantity: 3,
                rate: Money::from_major(80),
                price_per_unit: None,
                discount: Money::zero(),
                paid: Money::from_major(240),
                credit: None,
                remarks: None,
                date: day(2024, 1, 12),
            })
            .await
            .unwrap();
        assert_eq!(quantity(&db, &q.id).await, 2);

        let err = db.purchases().delete(&purchase.id).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::NegativeStock { on_hand: 2, change: -5, .. })
        ));
        assert_eq!(quantity(&db, &q.id).await, 2);
        assert!(db.purchases().get_by_id(&purchase.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_then_delete_restores_stock() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "P", 4, 50).await;
        let purchase = db.purchases().create(&purchase_of(&p.id, 9, 50)).await.unwrap();

        db.purchases().delete(&purchase.id).await.unwrap();

        assert_eq!(quantity(&db, &p.id).await, 4);
        assert!(matches!(
            db.purchases().delete(&purchase.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_product_with_purchases_cannot_be_deleted() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "P", 0, 50).await;
        db.purchases().create(&purchase_of(&p.id, 1, 50)).await.unwrap();

        assert!(matches!(
            db.products().delete(&p.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }
}
