//! # Master Data Commands
//!
//! Customers and suppliers share [`PartyCommand`]; product and expense
//! categories share [`CategoryCommand`].

use clap::{Args, Subcommand};
use serde::Serialize;
use shopledger_core::form::PartyForm;
use shopledger_core::validation::{validate_name, validate_search_query};
use shopledger_db::repository::category::{NamedRecord, NamedRepository};
use shopledger_db::repository::party::{PartyRecord, PartyRepository};

use super::{deleted, json, CommandResult};

/// Rows returned by `list --search`.
const SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Subcommand)]
pub enum PartyCommand {
    Add(PartyArgs),
    List {
        /// Substring of name, phone or email
        #[arg(long)]
        search: Option<String>,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: PartyArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PartyArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
}

impl From<PartyArgs> for PartyForm {
    fn from(args: PartyArgs) -> Self {
        PartyForm {
            name: args.name,
            phone: args.phone,
            email: args.email,
            address: args.address,
        }
    }
}

pub async fn run_party<T>(repo: PartyRepository<T>, cmd: PartyCommand) -> CommandResult
where
    T: PartyRecord + Serialize,
{
    match cmd {
        PartyCommand::Add(args) => {
            let input = PartyForm::from(args).parse()?;
            json(&repo.create(&input).await?)
        }
        PartyCommand::List { search: Some(query) } => {
            let query = validate_search_query(&query)?;
            json(&repo.search(&query, SEARCH_LIMIT).await?)
        }
        PartyCommand::List { search: None } => json(&repo.list().await?),
        PartyCommand::Update { id, fields } => {
            let input = PartyForm::from(fields).parse()?;
            json(&repo.update(&id, &input).await?)
        }
        PartyCommand::Delete { id } => {
            repo.delete(&id).await?;
            deleted(&id)
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    Add {
        name: String,
    },
    List,
    Rename {
        id: String,
        name: String,
    },
    /// Delete a category; rows that used it keep existing without one
    Delete {
        id: String,
    },
}

pub async fn run_named<T>(repo: NamedRepository<T>, cmd: CategoryCommand) -> CommandResult
where
    T: NamedRecord + Serialize,
{
    match cmd {
        CategoryCommand::Add { name } => {
            let name = validate_name("name", &name)?;
            json(&repo.create(&name).await?)
        }
        CategoryCommand::List => json(&repo.list().await?),
        CategoryCommand::Rename { id, name } => {
            let name = validate_name("name", &name)?;
            json(&repo.rename(&id, &name).await?)
        }
        CategoryCommand::Delete { id } => {
            repo.delete(&id).await?;
            deleted(&id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, value};
    use crate::error::ErrorCode;

    fn customer(name: &str, email: Option<&str>) -> PartyArgs {
        PartyArgs {
            name: name.to_string(),
            phone: None,
            email: email.map(str::to_string),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_customer_email_is_conflict() {
        let db = db().await;
        run_party(
            db.customers(),
            PartyCommand::Add(customer("Ravi", Some("ravi@example.in"))),
        )
        .await
        .unwrap();

        let err = run_party(
            db.customers(),
            PartyCommand::Add(customer("Ravi K", Some("ravi@example.in"))),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.field.as_deref(), Some("email"));
        assert!(err.message.contains("ravi@example.in"));
    }

    #[tokio::test]
    async fn test_supplier_search() {
        let db = db().await;
        run_party(db.suppliers(), PartyCommand::Add(customer("Gupta Traders", None)))
            .await
            .unwrap();

        let found = value(
            run_party(
                db.suppliers(),
                PartyCommand::List {
                    search: Some("gupta".to_string()),
                },
            )
            .await
            .unwrap(),
        );
        assert_eq!(found.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_category_blank_name_rejected() {
        let db = db().await;
        let err = run_named(
            db.categories(),
            CategoryCommand::Add {
                name: "   ".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let added = value(
            run_named(
                db.expense_categories(),
                CategoryCommand::Add {
                    name: "Rent".to_string(),
                },
            )
            .await
            .unwrap(),
        );
        assert_eq!(added["name"], "Rent");
    }
}
