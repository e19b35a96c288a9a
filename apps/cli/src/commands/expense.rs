//! # Expense Commands

use clap::{Args, Subcommand};
use shopledger_core::form::ExpenseForm;
use shopledger_db::Database;

use super::{deleted, json, CommandResult};

#[derive(Debug, Subcommand)]
pub enum ExpenseCommand {
    Add(ExpenseArgs),
    List,
    Update {
        id: String,
        #[command(flatten)]
        fields: ExpenseArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ExpenseArgs {
    #[arg(long)]
    pub category_id: Option<String>,
    #[arg(long, default_value = "")]
    pub title: String,
    #[arg(long, default_value = "")]
    pub amount: String,
    /// YYYY-MM-DD
    #[arg(long, default_value = "")]
    pub date: String,
    #[arg(long)]
    pub notes: Option<String>,
}

impl From<ExpenseArgs> for ExpenseForm {
    fn from(args: ExpenseArgs) -> Self {
        ExpenseForm {
            category_id: args.category_id,
            title: args.title,
            amount: args.amount,
            date: args.date,
            notes: args.notes,
        }
    }
}

pub async fn run(db: &Database, cmd: ExpenseCommand) -> CommandResult {
    match cmd {
        ExpenseCommand::Add(args) => {
            let input = ExpenseForm::from(args).parse()?;
            json(&db.expenses().create(&input).await?)
        }
        ExpenseCommand::List => json(&db.expenses().list().await?),
        ExpenseCommand::Update { id, fields } => {
            let input = ExpenseForm::from(fields).parse()?;
            json(&db.expenses().update(&id, &input).await?)
        }
        ExpenseCommand::Delete { id } => {
            db.expenses().delete(&id).await?;
            deleted(&id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, value};
    use crate::error::ErrorCode;

    fn args(title: &str, amount: &str) -> ExpenseArgs {
        ExpenseArgs {
            category_id: None,
            title: title.to_string(),
            amount: amount.to_string(),
            date: "2024-01-12".to_string(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_add_update_delete() {
        let db = db().await;

        let added = value(
            run(&db, ExpenseCommand::Add(args("Electricity", "1850.50")))
                .await
                .unwrap(),
        );
        assert_eq!(added["amount_minor"], 185050);
        let id = added["id"].as_str().unwrap().to_string();

        let updated = value(
            run(
                &db,
                ExpenseCommand::Update {
                    id: id.clone(),
                    fields: args("Electricity (Jan)", "1900"),
                },
            )
            .await
            .unwrap(),
        );
        assert_eq!(updated["title"], "Electricity (Jan)");

        run(&db, ExpenseCommand::Delete { id: id.clone() }).await.unwrap();
        let err = run(&db, ExpenseCommand::Delete { id }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
