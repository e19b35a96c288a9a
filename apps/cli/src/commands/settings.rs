//! # Settings Commands

use clap::{Args, Subcommand};
use shopledger_core::form::SettingsForm;
use shopledger_db::Database;

use super::{json, CommandResult};

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Show,
    /// Update the given fields; others are left as they are
    Update(SettingsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SettingsArgs {
    #[arg(long)]
    pub business_name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address_line1: Option<String>,
    #[arg(long)]
    pub address_line2: Option<String>,
    #[arg(long)]
    pub gstin: Option<String>,
    #[arg(long)]
    pub invoice_footer: Option<String>,
    /// Threshold for products created without one
    #[arg(long)]
    pub default_low_stock: Option<String>,
}

impl From<SettingsArgs> for SettingsForm {
    fn from(args: SettingsArgs) -> Self {
        SettingsForm {
            business_name: args.business_name,
            phone: args.phone,
            address_line1: args.address_line1,
            address_line2: args.address_line2,
            gstin: args.gstin,
            invoice_footer: args.invoice_footer,
            default_low_stock: args.default_low_stock,
        }
    }
}

pub async fn run(db: &Database, cmd: SettingsCommand) -> CommandResult {
    match cmd {
        SettingsCommand::Show => json(&db.settings().get().await?),
        SettingsCommand::Update(args) => {
            let update = SettingsForm::from(args).parse()?;
            json(&db.settings().update(&update).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, value};

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let db = db().await;
        let first = SettingsArgs {
            business_name: Some("Sharma Store".to_string()),
            phone: None,
            address_line1: None,
            address_line2: None,
            gstin: None,
            invoice_footer: None,
            default_low_stock: Some("8".to_string()),
        };
        run(&db, SettingsCommand::Update(first)).await.unwrap();

        let second = SettingsArgs {
            business_name: None,
            phone: Some("9811122233".to_string()),
            address_line1: None,
            address_line2: None,
            gstin: None,
            invoice_footer: None,
            default_low_stock: None,
        };
        run(&db, SettingsCommand::Update(second)).await.unwrap();

        let shown = value(run(&db, SettingsCommand::Show).await.unwrap());
        assert_eq!(shown["business_name"], "Sharma Store");
        assert_eq!(shown["phone"], "9811122233");
        assert_eq!(shown["default_low_stock"], 8);
    }
}
