//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD on product master data
//! - Name/SKU search
//! - Low-stock listing
//!
//! `quantity` is only written at insert time. Afterwards it moves through
//! purchases, sales and stock adjustments; [`ProductRepository::update`]
//! never touches it.

use chrono::Utc;
use shopledger_core::{NewProduct, Product, ProductUpdate};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;
use crate::repository::settings;

const PRODUCT_COLUMNS: &str = r#"
    id, name, sku, description, price_minor, selling_price_minor, quantity,
    low_stock_threshold, category_id, created_at, updated_at
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.insert(&new_product).await?;
/// let results = repo.search("rice", 10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name COLLATE NOCASE");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by ID, failing with `NotFound` when absent.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Searches products by name or SKU (case-insensitive substring).
    ///
    /// An empty query returns nothing.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE name LIKE '%' || ?1 || '%' OR sku LIKE '%' || ?1 || '%'
            ORDER BY name COLLATE NOCASE
            LIMIT ?2
            "#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Products at or below their low-stock threshold, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE quantity <= low_stock_threshold
            ORDER BY quantity ASC, name COLLATE NOCASE
            "#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// A missing `low_stock_threshold` takes the settings default.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        let inserted = insert_product(&mut conn, product).await?;

        info!(id = %inserted.id, name = %inserted.name, "Product created");
        Ok(inserted)
    }

    /// Updates a product's master data. Quantity is left alone.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated product
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: &str, update: &ProductUpdate) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                sku = ?3,
                description = ?4,
                price_minor = ?5,
                selling_price_minor = ?6,
                low_stock_threshold = ?7,
                category_id = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.sku)
        .bind(&update.description)
        .bind(update.price.minor())
        .bind(update.selling_price.map(|p| p.minor()))
        .bind(update.low_stock_threshold)
        .bind(&update.category_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(update.sku.clone().unwrap_or_default()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id).await
    }

    /// Deletes a product.
    ///
    /// Refused with `ForeignKeyViolation` while purchases, sales,
    /// adjustments or invoice items still reference it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Counts total products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts a product on an existing connection or transaction.
pub(crate) async fn insert_product(
    conn: &mut SqliteConnection,
    product: &NewProduct,
) -> DbResult<Product> {
    let threshold = match product.low_stock_threshold {
        Some(threshold) => threshold,
        None => settings::default_low_stock(conn).await?,
    };

    let now = Utc::now();
    let inserted = Product {
        id: generate_id(),
        name: product.name.clone(),
        sku: product.sku.clone(),
        description: product.description.clone(),
        price_minor: product.price.minor(),
        selling_price_minor: product.selling_price.map(|p| p.minor()),
        quantity: product.quantity,
        low_stock_threshold: threshold,
        category_id: product.category_id.clone(),
        created_at: now,
        updated_at: now,
    };

    debug!(name = %inserted.name, sku = ?inserted.sku, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, sku, description, price_minor, selling_price_minor,
            quantity, low_stock_threshold, category_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&inserted.id)
    .bind(&inserted.name)
    .bind(&inserted.sku)
    .bind(&inserted.description)
    .bind(inserted.price_minor)
    .bind(inserted.selling_price_minor)
    .bind(inserted.quantity)
    .bind(inserted.low_stock_threshold)
    .bind(&inserted.category_id)
    .bind(inserted.created_at)
    .bind(inserted.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).with_value(inserted.sku.clone().unwrap_or_default()))?;

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use shopledger_core::{Money, SettingsUpdate};

    fn new_product(name: &str, sku: Option<&str>) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            sku: sku.map(str::to_string),
            description: None,
            price: Money::from_major(50),
            selling_price: Some(Money::from_major(80)),
            quantity: 10,
            low_stock_threshold: None,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_uses_settings_threshold() {
        let db = test_support::db().await;
        db.settings()
            .update(&SettingsUpdate {
                default_low_stock: Some(8),
                ..Default::default()
            })
            .await
            .unwrap();

        let product = db.products().insert(&new_product("Rice 1kg", None)).await.unwrap();
        assert_eq!(product.low_stock_threshold, 8);

        let loaded = db.products().get(&product.id).await.unwrap();
        assert_eq!(loaded, product);
    }

    #[tokio::test]
    async fn test_duplicate_sku_names_field_and_value() {
        let db = test_support::db().await;
        db.products()
            .insert(&new_product("Rice", Some("RICE-1")))
            .await
            .unwrap();

        let err = db
            .products()
            .insert(&new_product("Rice again", Some("RICE-1")))
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "RICE-1");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_never_touches_quantity() {
        let db = test_support::db().await;
        let product = test_support::product(&db, "Sugar", 12, 40).await;

        let updated = db
            .products()
            .update(
                &product.id,
                &ProductUpdate {
                    name: "Sugar 1kg".to_string(),
                    sku: Some("SUG-1".to_string()),
                    description: None,
                    price: Money::from_major(42),
                    selling_price: None,
                    low_stock_threshold: 3,
                    category_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Sugar 1kg");
        assert_eq!(updated.price_minor, 4200);
        assert_eq!(updated.quantity, 12);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = test_support::db().await;
        let err = db
            .products()
            .update(
                "4b0f5c9e-0000-4000-8000-000000000000",
                &ProductUpdate {
                    name: "Ghost".to_string(),
                    sku: None,
                    description: None,
                    price: Money::zero(),
                    selling_price: None,
                    low_stock_threshold: 5,
                    category_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_search_and_low_stock() {
        let db = test_support::db().await;
        test_support::product(&db, "Basmati Rice", 2, 90).await;
        test_support::product(&db, "Brown Rice", 0, 70).await;
        test_support::product(&db, "Toor Dal", 40, 110).await;

        let found = db.products().search("rice", 10).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(db.products().search("   ", 10).await.unwrap().is_empty());

        let low = db.products().low_stock().await.unwrap();
        let names: Vec<_> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Brown Rice", "Basmati Rice"]);
        assert_eq!(db.products().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_support::db().await;
        let product = test_support::product(&db, "Salt", 1, 20).await;

        db.products().delete(&product.id).await.unwrap();
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_none());
        assert!(matches!(
            db.products().delete(&product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
