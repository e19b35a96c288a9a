//! # Stock Adjustment Commands
//!
//! Write-offs for damaged, expired or lost stock. An adjustment larger
//! than the stock on hand is refused.

use clap::{Args, Subcommand};
use shopledger_core::form::StockAdjustmentForm;
use shopledger_db::Database;

use super::{json, CommandResult};

#[derive(Debug, Subcommand)]
pub enum AdjustCommand {
    Add(AdjustArgs),

    /// List adjustments, newest first
    List {
        #[arg(long)]
        product_id: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct AdjustArgs {
    #[arg(long, default_value = "")]
    pub product_id: String,
    /// Units removed from stock
    #[arg(long, default_value = "")]
    pub quantity: String,
    /// damaged, expired, lost or manual
    #[arg(long = "type", default_value = "manual")]
    pub adjustment_type: String,
    #[arg(long)]
    pub note: Option<String>,
}

impl From<AdjustArgs> for StockAdjustmentForm {
    fn from(args: AdjustArgs) -> Self {
        StockAdjustmentForm {
            product_id: args.product_id,
            quantity: args.quantity,
            adjustment_type: args.adjustment_type,
            note: args.note,
        }
    }
}

pub async fn run(db: &Database, cmd: AdjustCommand) -> CommandResult {
    match cmd {
        AdjustCommand::Add(args) => {
            let input = StockAdjustmentForm::from(args).parse()?;
            json(&db.adjustments().create(&input).await?)
        }
        AdjustCommand::List { product_id: Some(id) } => {
            json(&db.adjustments().list_for_product(&id).await?)
        }
        AdjustCommand::List { product_id: None } => json(&db.adjustments().list().await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, value};
    use crate::error::ErrorCode;
    use shopledger_core::{Money, NewProduct};

    #[tokio::test]
    async fn test_adjustment_guarded_and_listed() {
        let db = db().await;
        let product = db
            .products()
            .insert(&NewProduct {
                name: "Curd".to_string(),
                sku: None,
                description: None,
                price: Money::from_major(35),
                selling_price: None,
                quantity: 4,
                low_stock_threshold: None,
                category_id: None,
            })
            .await
            .unwrap();

        let add = |quantity: &str| AdjustArgs {
            product_id: product.id.clone(),
            quantity: quantity.to_string(),
            adjustment_type: "expired".to_string(),
            note: None,
        };

        run(&db, AdjustCommand::Add(add("3"))).await.unwrap();
        let err = run(&db, AdjustCommand::Add(add("2"))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NegativeStock);

        let listed = value(
            run(
                &db,
                AdjustCommand::List {
                    product_id: Some(product.id.clone()),
                },
            )
            .await
            .unwrap(),
        );
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        assert_eq!(listed[0]["adjustment_type"], "expired");
        assert_eq!(db.products().get(&product.id).await.unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_unknown_type_is_rejected() {
        let db = db().await;
        let err = run(
            &db,
            AdjustCommand::Add(AdjustArgs {
                product_id: "00000000-0000-4000-8000-000000000000".to_string(),
                quantity: "1".to_string(),
                adjustment_type: "stolen".to_string(),
                note: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.field.as_deref(), Some("type"));
    }
}
