//! # Sale Commands
//!
//! `total = quantity × rate`, `net = total − discount` and, unless given,
//! `credit = net − paid`. Selling more than is on hand is allowed and
//! logged.

use clap::{Args, Subcommand};
use shopledger_core::form::SaleForm;
use shopledger_db::Database;

use super::{deleted, json, CommandResult};

#[derive(Debug, Subcommand)]
pub enum SaleCommand {
    /// Record a sale and take its quantity out of stock
    Add(SaleArgs),

    List,

    /// Edit a sale; stock moves by the difference
    Update {
        id: String,
        #[command(flatten)]
        fields: SaleArgs,
    },

    /// Delete a sale and return its quantity to stock
    Delete { id: String },
}

#[derive(Debug, Clone, Args)]
pub struct SaleArgs {
    #[arg(long, default_value = "")]
    pub product_id: String,
    #[arg(long)]
    pub customer_id: Option<String>,
    #[arg(long, default_value = "")]
    pub quantity: String,
    /// Selling price per unit; defaults to --price-per-unit
    #[arg(long)]
    pub rate: Option<String>,
    #[arg(long)]
    pub price_per_unit: Option<String>,
    #[arg(long)]
    pub discount: Option<String>,
    #[arg(long)]
    pub paid: Option<String>,
    #[arg(long)]
    pub credit: Option<String>,
    #[arg(long)]
    pub remarks: Option<String>,
    /// YYYY-MM-DD
    #[arg(long, default_value = "")]
    pub date: String,
}

impl From<SaleArgs> for SaleForm {
    fn from(args: SaleArgs) -> Self {
        SaleForm {
            product_id: args.product_id,
            customer_id: args.customer_id,
            quantity: args.quantity,
            rate: args.rate,
            price_per_unit: args.price_per_unit,
            discount: args.discount,
            paid: args.paid,
            credit: args.credit,
            remarks: args.remarks,
            date: args.date,
        }
    }
}

pub async fn run(db: &Database, cmd: SaleCommand) -> CommandResult {
    match cmd {
        SaleCommand::Add(args) => {
            let input = SaleForm::from(args).parse()?;
            json(&db.sales().create(&input).await?)
        }
        SaleCommand::List => json(&db.sales().list().await?),
        SaleCommand::Update { id, fields } => {
            let input = SaleForm::from(fields).parse()?;
            json(&db.sales().update(&id, &input).await?)
        }
        SaleCommand::Delete { id } => {
            db.sales().delete(&id).await?;
            deleted(&id)
        }
    }
}
