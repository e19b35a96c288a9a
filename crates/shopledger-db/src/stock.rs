//! Applies stock movements inside an open transaction.
//!
//! The movements themselves come from `shopledger_core::stock`; this module
//! only reads current quantities and writes the deltas.

use chrono::Utc;
use shopledger_core::stock::StockMovement;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Current on-hand quantity of a product.
pub(crate) async fn on_hand(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT quantity FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))
}

/// Applies each movement as a delta update, never an absolute write.
///
/// ```text
/// UPDATE products SET quantity = quantity + delta
/// ```
pub(crate) async fn apply_movements(
    conn: &mut SqliteConnection,
    movements: &[StockMovement],
) -> DbResult<()> {
    let now = Utc::now();

    for movement in movements {
        let result = sqlx::query(
            "UPDATE products SET quantity = quantity + ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(movement.delta)
        .bind(now)
        .bind(&movement.product_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &movement.product_id));
        }

        debug!(
            product_id = %movement.product_id,
            delta = movement.delta,
            "Applied stock movement"
        );
    }

    Ok(())
}

/// Logs a warning for every product a sale left below zero.
///
/// Sales are not refused on insufficient stock; the shortfall is recorded.
pub(crate) async fn warn_if_negative(
    conn: &mut SqliteConnection,
    movements: &[StockMovement],
) -> DbResult<()> {
    for movement in movements.iter().filter(|m| m.delta < 0) {
        let quantity = on_hand(conn, &movement.product_id).await?;
        if quantity < 0 {
            warn!(
                product_id = %movement.product_id,
                quantity,
                "Sale left stock negative"
            );
        }
    }
    Ok(())
}
