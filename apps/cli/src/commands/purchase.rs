//! # Purchase Commands
//!
//! `--product-id none` together with `--new-product-name` creates the
//! product in the same transaction as the purchase.

use clap::{Args, Subcommand};
use shopledger_core::form::PurchaseForm;
use shopledger_db::Database;

use super::{deleted, json, CommandResult};

#[derive(Debug, Subcommand)]
pub enum PurchaseCommand {
    /// Record a purchase and add its quantity to stock
    Add(PurchaseArgs),

    List,

    /// Edit a purchase; stock moves by the difference
    Update {
        id: String,
        #[command(flatten)]
        fields: PurchaseArgs,
    },

    /// Delete a purchase; refused if its stock has already been sold
    Delete { id: String },
}

#[derive(Debug, Clone, Args)]
pub struct PurchaseArgs {
    /// Product id, or "none" for a new product
    #[arg(long, default_value = "")]
    pub product_id: String,
    #[arg(long)]
    pub supplier_id: Option<String>,
    #[arg(long, default_value = "")]
    pub quantity: String,
    #[arg(long, default_value = "")]
    pub price_per_unit: String,
    /// YYYY-MM-DD
    #[arg(long, default_value = "")]
    pub date: String,
    #[arg(long)]
    pub new_product_name: Option<String>,
    #[arg(long)]
    pub new_product_sku: Option<String>,
    #[arg(long)]
    pub new_product_category_id: Option<String>,
}

impl From<PurchaseArgs> for PurchaseForm {
    fn from(args: PurchaseArgs) -> Self {
        PurchaseForm {
            product_id: args.product_id,
            supplier_id: args.supplier_id,
            quantity: args.quantity,
            price_per_unit: args.price_per_unit,
            date: args.date,
            new_product_name: args.new_product_name,
            new_product_sku: args.new_product_sku,
            new_product_category_id: args.new_product_category_id,
        }
    }
}

pub async fn run(db: &Database, cmd: PurchaseCommand) -> CommandResult {
    match cmd {
        PurchaseCommand::Add(args) => {
            let input = PurchaseForm::from(args).parse()?;
            json(&db.purchases().create(&input).await?)
        }
        PurchaseCommand::List => json(&db.purchases().list().await?),
        PurchaseCommand::Update { id, fields } => {
            let update = PurchaseForm::from(fields).parse_update()?;
            json(&db.purchases().update(&id, &update).await?)
        }
        PurchaseCommand::Delete { id } => {
            db.purchases().delete(&id).await?;
            deleted(&id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, value};
    use crate::error::ErrorCode;
    use shopledger_core::{Money, NewProduct, StockAdjustmentInput, StockAdjustmentType};

    fn args(product_id: &str, quantity: &str) -> PurchaseArgs {
        PurchaseArgs {
            product_id: product_id.to_string(),
            supplier_id: None,
            quantity: quantity.to_string(),
            price_per_unit: "50".to_string(),
            date: "2024-01-05".to_string(),
            new_product_name: None,
            new_product_sku: None,
            new_product_category_id: None,
        }
    }

    #[tokio::test]
    async fn test_new_product_purchase() {
        let db = db().await;
        let mut new = args("none", "5");
        new.new_product_name = Some("Jaggery 1kg".to_string());

        let purchase = value(run(&db, PurchaseCommand::Add(new)).await.unwrap());
        let product_id = purchase["product_id"].as_str().unwrap();

        let product = db.products().get(product_id).await.unwrap();
        assert_eq!(product.name, "Jaggery 1kg");
        assert_eq!(product.quantity, 5);
        assert_eq!(product.price_minor, 5000);
    }

    #[tokio::test]
    async fn test_missing_date_is_rejected_before_write() {
        let db = db().await;
        let mut bad = args("none", "5");
        bad.new_product_name = Some("Jaggery 1kg".to_string());
        bad.date = String::new();

        let err = run(&db, PurchaseCommand::Add(bad)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.field.as_deref(), Some("date"));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_sold_stock_is_negative_stock() {
        let db = db().await;
        let product = db
            .products()
            .insert(&NewProduct {
                name: "Q".to_string(),
                sku: None,
                description: None,
                price: Money::from_major(50),
                selling_price: None,
                quantity: 0,
                low_stock_threshold: None,
                category_id: None,
            })
            .await
            .unwrap();
        let purchase = value(
            run(&db, PurchaseCommand::Add(args(&product.id, "5")))
                .await
                .unwrap(),
        );
        db.adjustments()
            .create(&StockAdjustmentInput {
                product_id: product.id.clone(),
                quantity: 3,
                adjustment_type: StockAdjustmentType::Damaged,
                note: None,
            })
            .await
            .unwrap();

        let err = run(
            &db,
            PurchaseCommand::Delete {
                id: purchase["id"].as_str().unwrap().to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::NegativeStock);
        assert_eq!(err.code.status(), 400);
        assert_eq!(db.products().get(&product.id).await.unwrap().quantity, 2);
    }
}
