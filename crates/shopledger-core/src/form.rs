//! # Raw Forms
//!
//! Untyped input as a form or command line delivers it: every field a string,
//! optional fields possibly blank. Each form's `parse` turns it into the
//! validated input type the database layer accepts, or a `ValidationError`
//! naming the first field at fault. Nothing is written before this succeeds.
//!
//! ```text
//! PurchaseForm { product_id: "none", new_product_name: "Tea", quantity: "5", ... }
//!        │ parse()
//!        ▼
//! PurchaseInput { product: ProductChoice::New(..), quantity: 5, ... }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{
    ExpenseInput, GstMode, GstRates, InvoiceInput, InvoiceItemInput, NewProduct,
    NewProductSpec, PartyInput, ProductChoice, ProductUpdate, PurchaseInput, PurchaseUpdate,
    SaleInput, SettingsUpdate, StockAdjustmentInput, StockAdjustmentType,
};
use crate::validation::{
    optional_id, optional_text, parse_business_date, parse_count, parse_money,
    parse_money_or_zero, parse_optional_money, parse_percent, parse_quantity, validate_email,
    validate_id, validate_name, validate_sku, ValidationResult,
};
use crate::NEW_PRODUCT_SENTINEL;

fn text(raw: &Option<String>) -> Option<&str> {
    raw.as_deref()
}

/// A JSON scalar that may arrive as a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl RawValue {
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Text(s) => s.clone(),
            RawValue::Int(n) => n.to_string(),
            RawValue::Float(f) => f.to_string(),
        }
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: String,
    pub selling_price: Option<String>,
    /// Opening stock; blank means zero.
    pub quantity: Option<String>,
    pub low_stock_threshold: Option<String>,
    pub category_id: Option<String>,
}

impl ProductForm {
    pub fn parse(&self) -> ValidationResult<NewProduct> {
        let quantity = match text(&self.quantity).map(str::trim) {
            None | Some("") => 0,
            Some(q) => parse_count("quantity", q)?,
        };
        let low_stock_threshold = match text(&self.low_stock_threshold).map(str::trim) {
            None | Some("") => None,
            Some(t) => Some(parse_count("low_stock_threshold", t)?),
        };

        Ok(NewProduct {
            name: validate_name("name", &self.name)?,
            sku: validate_sku(text(&self.sku))?,
            description: optional_text("description", text(&self.description))?,
            price: parse_money("price", &self.price)?,
            selling_price: parse_optional_money("selling_price", text(&self.selling_price))?,
            quantity,
            low_stock_threshold,
            category_id: optional_id("category_id", text(&self.category_id))?,
        })
    }

    /// Parses the editable fields. Stock is not editable here; a quantity on
    /// the form is ignored.
    pub fn parse_update(&self, default_threshold: i64) -> ValidationResult<ProductUpdate> {
        let product = self.parse()?;
        Ok(ProductUpdate {
            name: product.name,
            sku: product.sku,
            description: product.description,
            price: product.price,
            selling_price: product.selling_price,
            low_stock_threshold: product.low_stock_threshold.unwrap_or(default_threshold),
            category_id: product.category_id,
        })
    }
}

// =============================================================================
// Purchases
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseForm {
    /// A product id, or `"none"` to create the product with the purchase.
    pub product_id: String,
    pub supplier_id: Option<String>,
    pub quantity: String,
    pub price_per_unit: String,
    pub date: String,
    /// Only read when `product_id` is the new-product sentinel.
    pub new_product_name: Option<String>,
    pub new_product_sku: Option<String>,
    pub new_product_category_id: Option<String>,
}

impl PurchaseForm {
    pub fn parse(&self) -> ValidationResult<PurchaseInput> {
        let date = parse_business_date("date", &self.date)?;
        let quantity = parse_quantity("quantity", &self.quantity)?;
        let price_per_unit = parse_money("price_per_unit", &self.price_per_unit)?;

        let product = if self.product_id.trim() == NEW_PRODUCT_SENTINEL {
            ProductChoice::New(NewProductSpec {
                name: validate_name(
                    "new_product_name",
                    text(&self.new_product_name).unwrap_or(""),
                )?,
                sku: validate_sku(text(&self.new_product_sku))?,
                category_id: optional_id(
                    "new_product_category_id",
                    text(&self.new_product_category_id),
                )?,
            })
        } else {
            ProductChoice::Existing(validate_id("product_id", &self.product_id)?)
        };

        Ok(PurchaseInput {
            product,
            supplier_id: optional_id("supplier_id", text(&self.supplier_id))?,
            quantity,
            price_per_unit,
            date,
        })
    }

    /// Parses an edit. Edits always reference an existing product.
    pub fn parse_update(&self) -> ValidationResult<PurchaseUpdate> {
        Ok(PurchaseUpdate {
            date: parse_business_date("date", &self.date)?,
            product_id: validate_id("product_id", &self.product_id)?,
            supplier_id: optional_id("supplier_id", text(&self.supplier_id))?,
            quantity: parse_quantity("quantity", &self.quantity)?,
            price_per_unit: parse_money("price_per_unit", &self.price_per_unit)?,
        })
    }
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleForm {
    pub product_id: String,
    pub customer_id: Option<String>,
    pub quantity: String,
    /// Falls back to `price_per_unit` when blank.
    pub rate: Option<String>,
    pub price_per_unit: Option<String>,
    pub discount: Option<String>,
    pub paid: Option<String>,
    pub credit: Option<String>,
    pub remarks: Option<String>,
    pub date: String,
}

impl SaleForm {
    pub fn parse(&self) -> ValidationResult<SaleInput> {
        let date = parse_business_date("date", &self.date)?;
        let quantity = parse_quantity("quantity", &self.quantity)?;
        let price_per_unit = parse_optional_money("price_per_unit", text(&self.price_per_unit))?;
        let rate = match (parse_optional_money("rate", text(&self.rate))?, price_per_unit) {
            (Some(rate), _) => rate,
            (None, Some(ppu)) => ppu,
            (None, None) => {
                return Err(ValidationError::Required {
                    field: "rate".to_string(),
                })
            }
        };

        let input = SaleInput {
            product_id: validate_id("product_id", &self.product_id)?,
            customer_id: optional_id("customer_id", text(&self.customer_id))?,
            quantity,
            rate,
            price_per_unit,
            discount: parse_money_or_zero("discount", text(&self.discount))?,
            paid: parse_money_or_zero("paid", text(&self.paid))?,
            credit: parse_optional_money("credit", text(&self.credit))?,
            remarks: optional_text("remarks", text(&self.remarks))?,
            date,
        };
        // Surface amount errors (discount over total) at parse time.
        input.amounts()?;
        Ok(input)
    }
}

// =============================================================================
// Stock Adjustments
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockAdjustmentForm {
    pub product_id: String,
    pub quantity: String,
    pub adjustment_type: String,
    pub note: Option<String>,
}

impl StockAdjustmentForm {
    pub fn parse(&self) -> ValidationResult<StockAdjustmentInput> {
        let adjustment_type = StockAdjustmentType::parse(&self.adjustment_type).ok_or_else(|| {
            ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: StockAdjustmentType::ALL
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            }
        })?;

        Ok(StockAdjustmentInput {
            product_id: validate_id("product_id", &self.product_id)?,
            quantity: parse_quantity("quantity", &self.quantity)?,
            adjustment_type,
            note: optional_text("note", text(&self.note))?,
        })
    }
}

// =============================================================================
// Invoices
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItemForm {
    pub product_id: String,
    pub quantity: RawValue,
    pub price_per_unit: RawValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceForm {
    pub invoice_number: String,
    pub customer_id: Option<String>,
    pub date: String,
    pub discount: Option<String>,
    /// `cgst_sgst` (default) or `igst`.
    pub gst_mode: Option<String>,
    pub cgst_percent: Option<String>,
    pub sgst_percent: Option<String>,
    pub igst_percent: Option<String>,
    pub remarks: Option<String>,
    pub items: Vec<InvoiceItemForm>,
}

impl InvoiceForm {
    pub fn parse(&self) -> ValidationResult<InvoiceInput> {
        let invoice_number = validate_name("invoice_number", &self.invoice_number)?;
        let date = parse_business_date("date", &self.date)?;

        let mode = match text(&self.gst_mode).map(str::trim) {
            None | Some("") => GstMode::default(),
            Some(m) => GstMode::parse(m).ok_or_else(|| ValidationError::NotAllowed {
                field: "gst_mode".to_string(),
                allowed: vec!["cgst_sgst".to_string(), "igst".to_string()],
            })?,
        };
        let gst = GstRates {
            mode,
            cgst: parse_percent("cgst_percent", text(&self.cgst_percent).unwrap_or(""))?,
            sgst: parse_percent("sgst_percent", text(&self.sgst_percent).unwrap_or(""))?,
            igst: parse_percent("igst_percent", text(&self.igst_percent).unwrap_or(""))?,
        }
        .effective();

        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                Ok(InvoiceItemInput {
                    product_id: validate_id("items.product_id", &item.product_id)?,
                    quantity: parse_quantity("items.quantity", &item.quantity.as_text())?,
                    price_per_unit: parse_money(
                        "items.price_per_unit",
                        &item.price_per_unit.as_text(),
                    )?,
                })
            })
            .collect::<ValidationResult<Vec<_>>>()?;

        Ok(InvoiceInput {
            invoice_number,
            customer_id: optional_id("customer_id", text(&self.customer_id))?,
            date,
            discount: parse_money_or_zero("discount", text(&self.discount))?,
            gst,
            remarks: optional_text("remarks", text(&self.remarks))?,
            items,
        })
    }
}

// =============================================================================
// Expenses
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseForm {
    pub category_id: Option<String>,
    pub title: String,
    pub amount: String,
    pub date: String,
    pub notes: Option<String>,
}

impl ExpenseForm {
    pub fn parse(&self) -> ValidationResult<ExpenseInput> {
        Ok(ExpenseInput {
            category_id: optional_id("category_id", text(&self.category_id))?,
            title: validate_name("title", &self.title)?,
            amount: parse_money("amount", &self.amount)?,
            date: parse_business_date("date", &self.date)?,
            notes: optional_text("notes", text(&self.notes))?,
        })
    }
}

// =============================================================================
// Parties & Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyForm {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl PartyForm {
    pub fn parse(&self) -> ValidationResult<PartyInput> {
        Ok(PartyInput {
            name: validate_name("name", &self.name)?,
            phone: optional_text("phone", text(&self.phone))?,
            email: validate_email(text(&self.email))?,
            address: optional_text("address", text(&self.address))?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsForm {
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub gstin: Option<String>,
    pub invoice_footer: Option<String>,
    pub default_low_stock: Option<String>,
}

impl SettingsForm {
    pub fn parse(&self) -> ValidationResult<SettingsUpdate> {
        let default_low_stock = match text(&self.default_low_stock).map(str::trim) {
            None | Some("") => None,
            Some(n) => Some(parse_count("default_low_stock", n)?),
        };
        Ok(SettingsUpdate {
            business_name: optional_text("business_name", text(&self.business_name))?,
            phone: optional_text("phone", text(&self.phone))?,
            address_line1: optional_text("address_line1", text(&self.address_line1))?,
            address_line2: optional_text("address_line2", text(&self.address_line2))?,
            gstin: optional_text("gstin", text(&self.gstin))?.map(|g| g.to_uppercase()),
            invoice_footer: optional_text("invoice_footer", text(&self.invoice_footer))?,
            default_low_stock,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    const PRODUCT: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn purchase_form() -> PurchaseForm {
        PurchaseForm {
            product_id: PRODUCT.to_string(),
            quantity: "5".to_string(),
            price_per_unit: "50".to_string(),
            date: "2024-01-10".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_purchase_form_existing_product() {
        let input = purchase_form().parse().unwrap();
        assert_eq!(input.product, ProductChoice::Existing(PRODUCT.to_string()));
        assert_eq!(input.quantity, 5);
        assert_eq!(input.price_per_unit, Money::from_major(50));
        assert_eq!(input.supplier_id, None);
    }

    #[test]
    fn test_purchase_form_new_product_sentinel() {
        let form = PurchaseForm {
            product_id: "none".to_string(),
            new_product_name: Some("Green Tea 250g".to_string()),
            ..purchase_form()
        };
        match form.parse().unwrap().product {
            ProductChoice::New(spec) => assert_eq!(spec.name, "Green Tea 250g"),
            other => panic!("expected new product, got {other:?}"),
        }

        let nameless = PurchaseForm {
            product_id: "none".to_string(),
            ..purchase_form()
        };
        assert_eq!(nameless.parse().unwrap_err().field(), "new_product_name");
    }

    #[test]
    fn test_purchase_form_requires_date() {
        let form = PurchaseForm {
            date: " ".to_string(),
            ..purchase_form()
        };
        assert_eq!(
            form.parse().unwrap_err(),
            ValidationError::Required {
                field: "date".to_string()
            }
        );
    }

    #[test]
    fn test_purchase_update_rejects_sentinel() {
        let form = PurchaseForm {
            product_id: "none".to_string(),
            ..purchase_form()
        };
        assert_eq!(form.parse_update().unwrap_err().field(), "product_id");
    }

    #[test]
    fn test_sale_form_rate_falls_back_to_price_per_unit() {
        let form = SaleForm {
            product_id: PRODUCT.to_string(),
            quantity: "3".to_string(),
            price_per_unit: Some("80".to_string()),
            date: "2024-01-10".to_string(),
            ..Default::default()
        };
        let input = form.parse().unwrap();
        assert_eq!(input.rate, Money::from_major(80));
        assert_eq!(input.amounts().unwrap().total, Money::from_major(240));

        let no_price = SaleForm {
            price_per_unit: None,
            ..form
        };
        assert_eq!(no_price.parse().unwrap_err().field(), "rate");
    }

    #[test]
    fn test_sale_form_rejects_non_numeric_quantity() {
        let form = SaleForm {
            product_id: PRODUCT.to_string(),
            quantity: "three".to_string(),
            rate: Some("80".to_string()),
            date: "2024-01-10".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            form.parse(),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_sale_form_rejects_amount_too_large_to_total() {
        let form = SaleForm {
            product_id: PRODUCT.to_string(),
            quantity: "1000".to_string(),
            rate: Some("100000000000000".to_string()),
            date: "2024-01-10".to_string(),
            ..Default::default()
        };
        let err = form.parse().unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
        assert_eq!(err.field(), "rate");

        // The largest accepted rate at the largest quantity still totals.
        let largest = SaleForm {
            quantity: crate::MAX_ITEM_QUANTITY.to_string(),
            rate: Some("100000000".to_string()),
            ..form
        };
        let amounts = largest.parse().unwrap().amounts().unwrap();
        assert_eq!(
            amounts.total.minor(),
            crate::MAX_AMOUNT_MINOR * crate::MAX_ITEM_QUANTITY
        );
    }

    #[test]
    fn test_adjustment_form_type() {
        let form = StockAdjustmentForm {
            product_id: PRODUCT.to_string(),
            quantity: "2".to_string(),
            adjustment_type: "expired".to_string(),
            note: Some("  ".to_string()),
        };
        let input = form.parse().unwrap();
        assert_eq!(input.adjustment_type, StockAdjustmentType::Expired);
        assert_eq!(input.note, None);

        let bad = StockAdjustmentForm {
            adjustment_type: "gift".to_string(),
            ..form
        };
        assert!(matches!(bad.parse(), Err(ValidationError::NotAllowed { .. })));
    }

    #[test]
    fn test_invoice_form_items_accept_numbers_and_strings() {
        let json = format!(
            r#"{{
                "invoice_number": "INV-001",
                "date": "2024-01-10",
                "gst_mode": "IGST",
                "cgst_percent": "9",
                "igst_percent": "18",
                "items": [
                    {{"product_id": "{PRODUCT}", "quantity": 2, "price_per_unit": "10.50"}},
                    {{"product_id": "{PRODUCT}", "quantity": "1", "price_per_unit": 99.5}}
                ]
            }}"#
        );
        let form: InvoiceForm = serde_json::from_str(&json).unwrap();
        let input = form.parse().unwrap();
        assert_eq!(input.items.len(), 2);
        assert_eq!(input.items[0].price_per_unit.minor(), 1050);
        assert_eq!(input.items[1].price_per_unit.minor(), 9950);
        assert_eq!(input.gst.mode, GstMode::Igst);
        assert!(input.gst.cgst.is_zero());
        assert_eq!(input.gst.igst.bps(), 1800);
    }

    #[test]
    fn test_invoice_form_requires_items() {
        let form = InvoiceForm {
            invoice_number: "INV-2".to_string(),
            date: "2024-01-10".to_string(),
            ..Default::default()
        };
        assert_eq!(form.parse().unwrap_err().field(), "items");
    }

    #[test]
    fn test_party_form_email() {
        let form = PartyForm {
            name: "Asha Traders".to_string(),
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert_eq!(form.parse().unwrap_err().field(), "email");
    }

    #[test]
    fn test_product_form_defaults() {
        let form = ProductForm {
            name: "Rice 1kg".to_string(),
            price: "50".to_string(),
            ..Default::default()
        };
        let product = form.parse().unwrap();
        assert_eq!(product.quantity, 0);
        assert_eq!(product.low_stock_threshold, None);
        assert_eq!(form.parse_update(5).unwrap().low_stock_threshold, 5);
    }

    #[test]
    fn test_settings_form() {
        let form = SettingsForm {
            gstin: Some("29abcde1234f1z5".to_string()),
            default_low_stock: Some("10".to_string()),
            ..Default::default()
        };
        let update = form.parse().unwrap();
        assert_eq!(update.gstin.as_deref(), Some("29ABCDE1234F1Z5"));
        assert_eq!(update.default_low_stock, Some(10));
    }
}
