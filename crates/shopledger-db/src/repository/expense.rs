//! # Expense Repository
//!
//! Expenses feed the P&L and the ledger. They never touch stock.

use chrono::Utc;
use shopledger_core::{Expense, ExpenseInput};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;

const SELECT_EXPENSE: &str = r#"
    SELECT id, category_id, title, amount_minor, date, notes, created_at
    FROM expenses
"#;

/// Repository for expenses.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Lists expenses, newest first.
    pub async fn list(&self) -> DbResult<Vec<Expense>> {
        let sql = format!("{SELECT_EXPENSE} ORDER BY date DESC, created_at DESC");
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Expense>> {
        let sql = format!("{SELECT_EXPENSE} WHERE id = ?1");
        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(expense)
    }

    pub async fn create(&self, input: &ExpenseInput) -> DbResult<Expense> {
        let expense = Expense {
            id: generate_id(),
            category_id: input.category_id.clone(),
            title: input.title.clone(),
            amount_minor: input.amount.minor(),
            date: input.date,
            notes: input.notes.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO expenses (id, category_id, title, amount_minor, date, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.category_id)
        .bind(&expense.title)
        .bind(expense.amount_minor)
        .bind(expense.date)
        .bind(&expense.notes)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        info!(id = %expense.id, amount = expense.amount_minor, "Expense recorded");
        Ok(expense)
    }

    pub async fn update(&self, id: &str, input: &ExpenseInput) -> DbResult<Expense> {
        debug!(id = %id, "Updating expense");

        let result = sqlx::query(
            r#"
            UPDATE expenses SET
                category_id = ?2,
                title = ?3,
                amount_minor = ?4,
                date = ?5,
                notes = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.category_id)
        .bind(&input.title)
        .bind(input.amount.minor())
        .bind(input.date)
        .bind(&input.notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Expense", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        info!(id = %id, "Expense deleted");
        Ok(())
    }
}
