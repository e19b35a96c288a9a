//! # Settings Repository
//!
//! The business profile is a single row with `id = 1`. Reading it creates
//! the row on first use, so callers never see "no settings".

use chrono::Utc;
use shopledger_core::{Settings, SettingsUpdate, DEFAULT_LOW_STOCK_THRESHOLD};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;

const SETTINGS_ID: i64 = 1;

const SELECT_SETTINGS: &str = r#"
    SELECT id, business_name, phone, address_line1, address_line2,
           gstin, invoice_footer, default_low_stock, updated_at
    FROM settings
    WHERE id = ?1
"#;

/// Repository for the settings singleton.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Returns the settings row, creating it with defaults if absent.
    pub async fn get(&self) -> DbResult<Settings> {
        let mut conn = self.pool.acquire().await?;
        ensure_row(&mut conn).await?;

        let settings = sqlx::query_as::<_, Settings>(SELECT_SETTINGS)
            .bind(SETTINGS_ID)
            .fetch_one(&mut *conn)
            .await?;

        Ok(settings)
    }

    /// Upserts the settings row.
    ///
    /// Fields left as `None` keep their stored value.
    pub async fn update(&self, update: &SettingsUpdate) -> DbResult<Settings> {
        debug!("Updating settings");

        let mut tx = self.pool.begin().await?;
        ensure_row(&mut *tx).await?;

        sqlx::query(
            r#"
            UPDATE settings SET
                business_name = COALESCE(?1, business_name),
                phone = COALESCE(?2, phone),
                address_line1 = COALESCE(?3, address_line1),
                address_line2 = COALESCE(?4, address_line2),
                gstin = COALESCE(?5, gstin),
                invoice_footer = COALESCE(?6, invoice_footer),
                default_low_stock = COALESCE(?7, default_low_stock),
                updated_at = ?8
            WHERE id = ?9
            "#,
        )
        .bind(&update.business_name)
        .bind(&update.phone)
        .bind(&update.address_line1)
        .bind(&update.address_line2)
        .bind(&update.gstin)
        .bind(&update.invoice_footer)
        .bind(update.default_low_stock)
        .bind(Utc::now())
        .bind(SETTINGS_ID)
        .execute(&mut *tx)
        .await?;

        let settings = sqlx::query_as::<_, Settings>(SELECT_SETTINGS)
            .bind(SETTINGS_ID)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Settings updated");
        Ok(settings)
    }

    /// The default low-stock threshold applied to new products.
    pub async fn default_low_stock(&self) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        default_low_stock(&mut conn).await
    }
}

async fn ensure_row(conn: &mut SqliteConnection) -> DbResult<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO settings (id, default_low_stock, updated_at) VALUES (?1, ?2, ?3)",
    )
    .bind(SETTINGS_ID)
    .bind(DEFAULT_LOW_STOCK_THRESHOLD)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Reads the configured default threshold without creating the row.
pub(crate) async fn default_low_stock(conn: &mut SqliteConnection) -> DbResult<i64> {
    let stored: Option<i64> =
        sqlx::query_scalar("SELECT default_low_stock FROM settings WHERE id = ?1")
            .bind(SETTINGS_ID)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(stored.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD))
}

#[cfg(test)]
mod tests {
    use crate::test_support;
    use shopledger_core::SettingsUpdate;

    #[tokio::test]
    async fn test_get_creates_single_row() {
        let db = test_support::db().await;

        let first = db.settings().get().await.unwrap();
        let second = db.settings().get().await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 1);
        assert_eq!(first.default_low_stock, 5);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_fields() {
        let db = test_support::db().await;

        db.settings()
            .update(&SettingsUpdate {
                business_name: Some("Sharma Traders".to_string()),
                gstin: Some("27AAPFU0939F1ZV".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let settings = db
            .settings()
            .update(&SettingsUpdate {
                default_low_stock: Some(12),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(settings.business_name.as_deref(), Some("Sharma Traders"));
        assert_eq!(settings.gstin.as_deref(), Some("27AAPFU0939F1ZV"));
        assert_eq!(settings.default_low_stock, 12);
        assert_eq!(db.settings().default_low_stock().await.unwrap(), 12);
    }
}
