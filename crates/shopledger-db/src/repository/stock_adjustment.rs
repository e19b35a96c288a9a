//! # Stock Adjustment Repository
//!
//! Records stock written off as damaged, expired, lost or corrected by hand.
//! An adjustment always removes stock and is refused when the product does
//! not hold that much.

use chrono::Utc;
use shopledger_core::stock;
use shopledger_core::{StockAdjustment, StockAdjustmentInput};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::generate_id;
use crate::stock::{apply_movements, on_hand};

const SELECT_ADJUSTMENT: &str = r#"
    SELECT id, product_id, quantity, adjustment_type, note, created_at
    FROM stock_adjustments
"#;

/// Repository for stock adjustments.
#[derive(Debug, Clone)]
pub struct StockAdjustmentRepository {
    pool: SqlitePool,
}

impl StockAdjustmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockAdjustmentRepository { pool }
    }

    /// Lists adjustments, newest first.
    pub async fn list(&self) -> DbResult<Vec<StockAdjustment>> {
        let sql = format!("{SELECT_ADJUSTMENT} ORDER BY created_at DESC");
        let adjustments = sqlx::query_as::<_, StockAdjustment>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(adjustments)
    }

    /// Adjustments for one product, newest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<StockAdjustment>> {
        let sql = format!("{SELECT_ADJUSTMENT} WHERE product_id = ?1 ORDER BY created_at DESC");
        let adjustments = sqlx::query_as::<_, StockAdjustment>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(adjustments)
    }

    /// Records an adjustment and removes its quantity from stock.
    pub async fn create(&self, input: &StockAdjustmentInput) -> DbResult<StockAdjustment> {
        let mut tx = self.pool.begin().await?;

        let current = on_hand(&mut tx, &input.product_id).await?;
        let movements = stock::adjustment_created(&input.product_id, input.quantity, current)?;

        let adjustment = StockAdjustment {
            id: generate_id(),
            product_id: input.product_id.clone(),
            quantity: input.quantity,
            adjustment_type: input.adjustment_type,
            note: input.note.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO stock_adjustments (id, product_id, quantity, adjustment_type, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&adjustment.id)
        .bind(&adjustment.product_id)
        .bind(adjustment.quantity)
        .bind(adjustment.adjustment_type)
        .bind(&adjustment.note)
        .bind(adjustment.created_at)
        .execute(&mut *tx)
        .await?;

        apply_movements(&mut tx, &movements).await?;
        tx.commit().await?;

        info!(
            id = %adjustment.id,
            product_id = %adjustment.product_id,
            quantity = adjustment.quantity,
            adjustment_type = adjustment.adjustment_type.as_str(),
            "Stock adjusted"
        );
        Ok(adjustment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::test_support::{self, quantity};
    use shopledger_core::{CoreError, StockAdjustmentType};

    fn adjust(product_id: &str, qty: i64, kind: StockAdjustmentType) -> StockAdjustmentInput {
        StockAdjustmentInput {
            product_id: product_id.to_string(),
            quantity: qty,
            adjustment_type: kind,
            note: Some("stock count".to_string()),
        }
    }

    #[tokio::test]
    async fn test_adjustment_removes_stock() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "Milk", 10, 30).await;

        let adjustment = db
            .adjustments()
            .create(&adjust(&p.id, 4, StockAdjustmentType::Expired))
            .await
            .unwrap();

        assert_eq!(quantity(&db, &p.id).await, 6);
        let listed = db.adjustments().list_for_product(&p.id).await.unwrap();
        assert_eq!(listed, vec![adjustment]);
        assert_eq!(listed[0].adjustment_type, StockAdjustmentType::Expired);
    }

    #[tokio::test]
    async fn test_adjustment_larger_than_stock_is_refused() {
        let db = test_support::db().await;
        let p = test_support::product(&db, "Eggs", 3, 6).await;

        let err = db
            .adjustments()
            .create(&adjust(&p.id, 5, StockAdjustmentType::Damaged))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::NegativeStock { .. })));
        assert_eq!(quantity(&db, &p.id).await, 3);
        assert!(db.adjustments().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_adjustment_for_missing_product() {
        let db = test_support::db().await;
        let err = db
            .adjustments()
            .create(&adjust(
                "c4ca4238-a0b9-4382-8dcc-509a6f75849b",
                1,
                StockAdjustmentType::Lost,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
