//! # Customer & Supplier Repositories
//!
//! Customers and suppliers share one shape (name, phone, email, address),
//! so one generic repository serves both tables.
//!
//! Customer email is unique; a duplicate surfaces as
//! `UniqueViolation { field: "email", value }`.

use std::marker::PhantomData;

use chrono::Utc;
use shopledger_core::{Customer, PartyInput, Supplier};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;

/// A row type stored in one of the party tables.
pub trait PartyRecord: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: &'static str;
    const ENTITY: &'static str;
}

impl PartyRecord for Customer {
    const TABLE: &'static str = "customers";
    const ENTITY: &'static str = "Customer";
}

impl PartyRecord for Supplier {
    const TABLE: &'static str = "suppliers";
    const ENTITY: &'static str = "Supplier";
}

pub type CustomerRepository = PartyRepository<Customer>;
pub type SupplierRepository = PartyRepository<Supplier>;

/// Repository for customers or suppliers.
#[derive(Debug)]
pub struct PartyRepository<T> {
    pool: SqlitePool,
    _record: PhantomData<T>,
}

impl<T> Clone for PartyRepository<T> {
    fn clone(&self) -> Self {
        PartyRepository {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: PartyRecord> PartyRepository<T> {
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository {
            pool,
            _record: PhantomData,
        }
    }

    /// Lists all records, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<T>> {
        let sql = format!(
            "SELECT id, name, phone, email, address, created_at FROM {} ORDER BY name COLLATE NOCASE",
            T::TABLE
        );
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<T>> {
        let sql = format!(
            "SELECT id, name, phone, email, address, created_at FROM {} WHERE id = ?1",
            T::TABLE
        );
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Name, phone or email containing `query`.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<T>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT id, name, phone, email, address, created_at FROM {}
            WHERE name LIKE '%' || ?1 || '%'
               OR phone LIKE '%' || ?1 || '%'
               OR email LIKE '%' || ?1 || '%'
            ORDER BY name COLLATE NOCASE
            LIMIT ?2
            "#,
            T::TABLE
        );
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create(&self, input: &PartyInput) -> DbResult<T> {
        let id = generate_id();
        debug!(table = T::TABLE, name = %input.name, "Inserting party");

        let sql = format!(
            "INSERT INTO {} (id, name, phone, email, address, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            T::TABLE
        );
        sqlx::query(&sql)
            .bind(&id)
            .bind(&input.name)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(&input.address)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_value(input.email.clone().unwrap_or_default()))?;

        info!(id = %id, entity = T::ENTITY, "Created");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found(T::ENTITY, &id))
    }

    pub async fn update(&self, id: &str, input: &PartyInput) -> DbResult<T> {
        let sql = format!(
            "UPDATE {} SET name = ?2, phone = ?3, email = ?4, address = ?5 WHERE id = ?1",
            T::TABLE
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(&input.address)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_value(input.email.clone().unwrap_or_default()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(T::ENTITY, id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(T::ENTITY, id))
    }

    /// Deletes a record. Purchases, sales and invoices pointing at it keep
    /// their rows with the reference cleared.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(T::ENTITY, id));
        }

        info!(id = %id, entity = T::ENTITY, "Deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn party(name: &str, email: Option<&str>) -> PartyInput {
        PartyInput {
            name: name.to_string(),
            phone: Some("9876543210".to_string()),
            email: email.map(str::to_string),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_customer_email_conflict() {
        let db = test_support::db().await;
        db.customers()
            .create(&party("Asha", Some("asha@example.in")))
            .await
            .unwrap();

        let err = db
            .customers()
            .create(&party("Asha K", Some("asha@example.in")))
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "email");
                assert_eq!(value, "asha@example.in");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_customers_without_email_do_not_conflict() {
        let db = test_support::db().await;
        db.customers().create(&party("Walk-in", None)).await.unwrap();
        db.customers().create(&party("Walk-in 2", None)).await.unwrap();
        assert_eq!(db.customers().list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_supplier_crud_and_search() {
        let db = test_support::db().await;
        let supplier = db
            .suppliers()
            .create(&party("Gupta Wholesale", None))
            .await
            .unwrap();

        let updated = db
            .suppliers()
            .update(&supplier.id, &party("Gupta Wholesale Pvt", None))
            .await
            .unwrap();
        assert_eq!(updated.name, "Gupta Wholesale Pvt");

        assert_eq!(db.suppliers().search("gupta", 10).await.unwrap().len(), 1);
        assert_eq!(db.suppliers().search("98765", 10).await.unwrap().len(), 1);
        assert!(db.suppliers().search("", 10).await.unwrap().is_empty());

        db.suppliers().delete(&supplier.id).await.unwrap();
        assert!(matches!(
            db.suppliers().delete(&supplier.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
