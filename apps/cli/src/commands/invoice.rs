//! # Invoice Commands
//!
//! Items are passed as a JSON array:
//!
//! ```text
//! shopledger invoice add --invoice-number INV-001 --date 2024-03-01 \
//!     --gst-mode cgst_sgst --cgst-percent 9 --sgst-percent 9 \
//!     --items '[{"product_id": "…", "quantity": 2, "price_per_unit": "500"}]'
//! ```
//!
//! Totals are always recomputed from the items. Invoices do not move stock.

use clap::{Args, Subcommand};
use shopledger_core::form::{InvoiceForm, InvoiceItemForm};
use shopledger_core::validation::validate_search_query;
use shopledger_db::Database;

use super::{deleted, json, CommandResult};
use crate::error::ApiError;

/// Rows returned by `list --search`.
const SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Subcommand)]
pub enum InvoiceCommand {
    Add(InvoiceArgs),

    List {
        /// Substring of the invoice number
        #[arg(long)]
        search: Option<String>,
    },

    /// Show an invoice with its items
    Show { id: String },

    /// Replace an invoice's header and items
    Update {
        id: String,
        #[command(flatten)]
        fields: InvoiceArgs,
    },

    Delete { id: String },
}

#[derive(Debug, Clone, Args)]
pub struct InvoiceArgs {
    #[arg(long, default_value = "")]
    pub invoice_number: String,
    #[arg(long)]
    pub customer_id: Option<String>,
    /// YYYY-MM-DD
    #[arg(long, default_value = "")]
    pub date: String,
    #[arg(long)]
    pub discount: Option<String>,
    /// cgst_sgst (default) or igst
    #[arg(long)]
    pub gst_mode: Option<String>,
    #[arg(long)]
    pub cgst_percent: Option<String>,
    #[arg(long)]
    pub sgst_percent: Option<String>,
    #[arg(long)]
    pub igst_percent: Option<String>,
    #[arg(long)]
    pub remarks: Option<String>,
    /// JSON array of {product_id, quantity, price_per_unit}
    #[arg(long, default_value = "[]")]
    pub items: String,
}

impl InvoiceArgs {
    fn into_form(self) -> Result<InvoiceForm, ApiError> {
        let items: Vec<InvoiceItemForm> = serde_json::from_str(&self.items)?;
        Ok(InvoiceForm {
            invoice_number: self.invoice_number,
            customer_id: self.customer_id,
            date: self.date,
            discount: self.discount,
            gst_mode: self.gst_mode,
            cgst_percent: self.cgst_percent,
            sgst_percent: self.sgst_percent,
            igst_percent: self.igst_percent,
            remarks: self.remarks,
            items,
        })
    }
}

pub async fn run(db: &Database, cmd: InvoiceCommand) -> CommandResult {
    match cmd {
        InvoiceCommand::Add(args) => {
            let input = args.into_form()?.parse()?;
            json(&db.invoices().create(&input).await?)
        }
        InvoiceCommand::List { search: Some(query) } => {
            let query = validate_search_query(&query)?;
            json(&db.invoices().search(&query, SEARCH_LIMIT).await?)
        }
        InvoiceCommand::List { search: None } => json(&db.invoices().list().await?),
        InvoiceCommand::Show { id } => match db.invoices().get_by_id(&id).await? {
            Some(invoice) => json(&invoice),
            None => Err(ApiError::not_found("Invoice", &id)),
        },
        InvoiceCommand::Update { id, fields } => {
            let input = fields.into_form()?.parse()?;
            json(&db.invoices().update(&id, &input).await?)
        }
        InvoiceCommand::Delete { id } => {
            db.invoices().delete(&id).await?;
            deleted(&id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, value};
    use crate::error::ErrorCode;
    use shopledger_core::{Money, NewProduct};

    async fn product(db: &Database) -> String {
        db.products()
            .insert(&NewProduct {
                name: "Ceiling Fan".to_string(),
                sku: None,
                description: None,
                price: Money::from_major(300),
                selling_price: None,
                quantity: 4,
                low_stock_threshold: None,
                category_id: None,
            })
            .await
            .unwrap()
            .id
    }

    fn args(number: &str, items: String) -> InvoiceArgs {
        InvoiceArgs {
            invoice_number: number.to_string(),
            customer_id: None,
            date: "2024-03-01".to_string(),
            discount: Some("100".to_string()),
            gst_mode: None,
            cgst_percent: Some("9".to_string()),
            sgst_percent: Some("9".to_string()),
            igst_percent: None,
            remarks: None,
            items,
        }
    }

    #[tokio::test]
    async fn test_add_show_and_stock_untouched() {
        let db = db().await;
        let id = product(&db).await;
        let items = format!(r#"[{{"product_id": "{id}", "quantity": 2, "price_per_unit": "500"}}]"#);

        let created = value(
            run(&db, InvoiceCommand::Add(args("INV-001", items)))
                .await
                .unwrap(),
        );
        // 1000 - 100 = 900 taxable, 9% + 9% = 162
        assert_eq!(created["total_minor"], 106200);

        let shown = value(
            run(
                &db,
                InvoiceCommand::Show {
                    id: created["id"].as_str().unwrap().to_string(),
                },
            )
            .await
            .unwrap(),
        );
        assert_eq!(shown["items"][0]["product_name"], "Ceiling Fan");
        assert_eq!(db.products().get(&id).await.unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn test_duplicate_number_is_conflict() {
        let db = db().await;
        let id = product(&db).await;
        let items = format!(r#"[{{"product_id": "{id}", "quantity": 1, "price_per_unit": 500}}]"#);

        run(&db, InvoiceCommand::Add(args("INV-001", items.clone())))
            .await
            .unwrap();
        let err = run(&db, InvoiceCommand::Add(args("INV-001", items)))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.field.as_deref(), Some("invoice_number"));
    }

    #[tokio::test]
    async fn test_bad_items_json_and_empty_items() {
        let db = db().await;

        let err = run(&db, InvoiceCommand::Add(args("INV-002", "not json".to_string())))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = run(&db, InvoiceCommand::Add(args("INV-002", "[]".to_string())))
            .await
            .unwrap_err();
        assert_eq!(err.field.as_deref(), Some("items"));
    }
}
