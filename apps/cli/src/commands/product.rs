//! # Product Commands

use clap::{Args, Subcommand};
use shopledger_core::form::ProductForm;
use shopledger_core::validation::validate_search_query;
use shopledger_db::Database;
use tracing::debug;

use super::{deleted, json, CommandResult};

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// Add a product with optional opening stock
    Add(ProductArgs),

    /// List products, optionally filtered
    List {
        /// Substring of name or SKU
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    Show { id: String },

    /// Edit product details. Stock is changed through purchases, sales and adjustments.
    Update {
        id: String,
        #[command(flatten)]
        fields: ProductArgs,
    },

    Delete { id: String },
}

#[derive(Debug, Clone, Args)]
pub struct ProductArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long)]
    pub sku: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Cost price, e.g. 12.50
    #[arg(long, default_value = "")]
    pub price: String,
    #[arg(long)]
    pub selling_price: Option<String>,
    /// Opening stock (add only)
    #[arg(long)]
    pub quantity: Option<String>,
    #[arg(long)]
    pub low_stock_threshold: Option<String>,
    #[arg(long)]
    pub category_id: Option<String>,
}

impl From<ProductArgs> for ProductForm {
    fn from(args: ProductArgs) -> Self {
        ProductForm {
            name: args.name,
            sku: args.sku,
            description: args.description,
            price: args.price,
            selling_price: args.selling_price,
            quantity: args.quantity,
            low_stock_threshold: args.low_stock_threshold,
            category_id: args.category_id,
        }
    }
}

pub async fn run(db: &Database, cmd: ProductCommand) -> CommandResult {
    match cmd {
        ProductCommand::Add(args) => {
            let product = ProductForm::from(args).parse()?;
            json(&db.products().insert(&product).await?)
        }
        ProductCommand::List { search, limit } => match search {
            Some(query) => {
                let query = validate_search_query(&query)?;
                debug!(query = %query, "Searching products");
                json(&db.products().search(&query, limit).await?)
            }
            None => json(&db.products().list().await?),
        },
        ProductCommand::Show { id } => json(&db.products().get(&id).await?),
        ProductCommand::Update { id, fields } => {
            let default_threshold = db.settings().default_low_stock().await?;
            let update = ProductForm::from(fields).parse_update(default_threshold)?;
            json(&db.products().update(&id, &update).await?)
        }
        ProductCommand::Delete { id } => {
            db.products().delete(&id).await?;
            deleted(&id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, value};
    use crate::error::ErrorCode;

    fn args(name: &str, price: &str, quantity: Option<&str>) -> ProductArgs {
        ProductArgs {
            name: name.to_string(),
            sku: None,
            description: None,
            price: price.to_string(),
            selling_price: None,
            quantity: quantity.map(str::to_string),
            low_stock_threshold: None,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_show() {
        let db = db().await;

        let added = value(
            run(&db, ProductCommand::Add(args("Tea", "230", Some("12"))))
                .await
                .unwrap(),
        );
        let id = added["id"].as_str().unwrap().to_string();
        assert_eq!(added["quantity"], 12);
        assert_eq!(added["price_minor"], 23000);
        assert_eq!(added["low_stock_threshold"], 5);

        let shown = value(run(&db, ProductCommand::Show { id }).await.unwrap());
        assert_eq!(shown["name"], "Tea");
    }

    #[tokio::test]
    async fn test_invalid_price_writes_nothing() {
        let db = db().await;

        let err = run(&db, ProductCommand::Add(args("Tea", "abc", None)))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.field.as_deref(), Some("price"));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_ignores_quantity() {
        let db = db().await;
        let added = value(
            run(&db, ProductCommand::Add(args("Tea", "230", Some("12"))))
                .await
                .unwrap(),
        );
        let id = added["id"].as_str().unwrap().to_string();

        let updated = value(
            run(
                &db,
                ProductCommand::Update {
                    id,
                    fields: args("Tea Gold", "250", Some("999")),
                },
            )
            .await
            .unwrap(),
        );

        assert_eq!(updated["name"], "Tea Gold");
        assert_eq!(updated["quantity"], 12);
    }

    #[tokio::test]
    async fn test_show_missing_is_not_found() {
        let db = db().await;
        let err = run(
            &db,
            ProductCommand::Show {
                id: "00000000-0000-4000-8000-000000000000".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
