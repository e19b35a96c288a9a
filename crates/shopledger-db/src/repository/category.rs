//! # Category Repositories
//!
//! Product categories and expense categories: a name and nothing else.
//! Deleting a category clears the reference on products or expenses.

use std::marker::PhantomData;

use chrono::Utc;
use shopledger_core::{Category, ExpenseCategory};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::generate_id;

/// A row type stored in one of the category tables.
pub trait NamedRecord: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: &'static str;
    const ENTITY: &'static str;
}

impl NamedRecord for Category {
    const TABLE: &'static str = "categories";
    const ENTITY: &'static str = "Category";
}

impl NamedRecord for ExpenseCategory {
    const TABLE: &'static str = "expense_categories";
    const ENTITY: &'static str = "ExpenseCategory";
}

pub type CategoryRepository = NamedRepository<Category>;
pub type ExpenseCategoryRepository = NamedRepository<ExpenseCategory>;

#[derive(Debug)]
pub struct NamedRepository<T> {
    pool: SqlitePool,
    _record: PhantomData<T>,
}

impl<T> Clone for NamedRepository<T> {
    fn clone(&self) -> Self {
        NamedRepository {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: NamedRecord> NamedRepository<T> {
    pub fn new(pool: SqlitePool) -> Self {
        NamedRepository {
            pool,
            _record: PhantomData,
        }
    }

    pub async fn list(&self) -> DbResult<Vec<T>> {
        let sql = format!(
            "SELECT id, name, created_at FROM {} ORDER BY name COLLATE NOCASE",
            T::TABLE
        );
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<T>> {
        let sql = format!("SELECT id, name, created_at FROM {} WHERE id = ?1", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<T>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, name, created_at FROM {} WHERE name LIKE '%' || ?1 || '%' ORDER BY name COLLATE NOCASE LIMIT ?2",
            T::TABLE
        );
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create(&self, name: &str) -> DbResult<T> {
        let id = generate_id();
        let sql = format!(
            "INSERT INTO {} (id, name, created_at) VALUES (?1, ?2, ?3)",
            T::TABLE
        );
        sqlx::query(&sql)
            .bind(&id)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        info!(id = %id, entity = T::ENTITY, name = %name, "Created");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found(T::ENTITY, &id))
    }

    pub async fn rename(&self, id: &str, name: &str) -> DbResult<T> {
        let sql = format!("UPDATE {} SET name = ?2 WHERE id = ?1", T::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(T::ENTITY, id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(T::ENTITY, id))
    }

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
