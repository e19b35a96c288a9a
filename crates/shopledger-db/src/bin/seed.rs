//! # Seed Data Generator
//!
//! Populates a development ledger with a small shop's worth of activity.
//!
//! ## Usage
//! ```bash
//! # Seed ./shopledger_dev.db, 30 days of sales (default)
//! cargo run -p shopledger-db --bin seed
//!
//! # Fewer days of history
//! cargo run -p shopledger-db --bin seed -- --days 7
//!
//! # Specify database path
//! cargo run -p shopledger-db --bin seed -- --db ./data/shopledger.db
//! ```
//!
//! Every purchase and sale goes through the repositories, so product
//! quantities end up exactly as the reconciliation rules leave them.

use std::env;

use chrono::{Duration, Local, NaiveDateTime};
use shopledger_core::{
    ExpenseInput, Money, NewProductSpec, PartyInput, ProductChoice, PurchaseInput, SaleInput,
    SettingsUpdate, StockAdjustmentInput, StockAdjustmentType,
};
use shopledger_db::{Database, DbConfig};

/// (category, [(product, cost price in rupees, selling rate in rupees)])
const CATALOGUE: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Grocery",
        &[
            ("Basmati Rice 1kg", 95, 120),
            ("Toor Dal 1kg", 140, 165),
            ("Sugar 1kg", 42, 48),
            ("Atta 5kg", 210, 245),
            ("Salt 1kg", 18, 24),
        ],
    ),
    (
        "Dairy",
        &[
            ("Amul Butter 500g", 245, 275),
            ("Paneer 200g", 80, 95),
            ("Curd 400g", 35, 45),
        ],
    ),
    (
        "Beverages",
        &[
            ("Tata Tea 500g", 230, 270),
            ("Bru Coffee 100g", 165, 195),
            ("Frooti 1L", 55, 70),
        ],
    ),
    (
        "Household",
        &[
            ("Surf Excel 1kg", 125, 150),
            ("Vim Bar", 9, 12),
            ("Harpic 500ml", 88, 105),
        ],
    ),
];

const SUPPLIERS: &[(&str, &str)] = &[
    ("Sharma Wholesale", "9810012345"),
    ("Gupta Traders", "9820054321"),
    ("Metro Cash & Carry", "1800123456"),
];

const CUSTOMERS: &[(&str, Option<&str>)] = &[
    ("Walk-in", None),
    ("Ravi Kumar", Some("ravi@example.in")),
    ("Anita Desai", Some("anita@example.in")),
    ("Hotel Saffron", Some("orders@saffron.example.in")),
];

const EXPENSES: &[(&str, &str, i64)] = &[
    ("Utilities", "Electricity bill", 1850),
    ("Rent", "Shop rent", 12000),
    ("Salaries", "Helper wages", 6000),
    ("Utilities", "Internet", 699),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 30;
    let mut db_path = String::from("./shopledger_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(30);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("shopledger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of sales history to generate (default: 30)");
                println!("  -d, --db <PATH>    Database file path (default: ./shopledger_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }
    let days = days.max(1);

    println!("🌱 shopledger Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!("History:  {} days", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    db.settings()
        .update(&SettingsUpdate {
            business_name: Some("Sharma General Store".to_string()),
            phone: Some("9811122233".to_string()),
            address_line1: Some("12 Main Bazaar".to_string()),
            address_line2: Some("New Delhi 110001".to_string()),
            gstin: Some("07AAAAA0000A1Z5".to_string()),
            invoice_footer: Some("Thank you for shopping with us".to_string()),
            default_low_stock: Some(5),
        })
        .await?;
    println!("✓ Settings saved");

    let start_day = Local::now().date_naive() - Duration::days(days - 1);
    let at = |day: i64, hour: u32| -> NaiveDateTime {
        (start_day + Duration::days(day))
            .and_hms_opt(hour, 0, 0)
            .unwrap_or_default()
    };

    let mut supplier_ids = Vec::new();
    for (name, phone) in SUPPLIERS {
        let supplier = db
            .suppliers()
            .create(&PartyInput {
                name: name.to_string(),
                phone: Some(phone.to_string()),
                email: None,
                address: None,
            })
            .await?;
        supplier_ids.push(supplier.id);
    }

    let mut customer_ids = Vec::new();
    for (name, email) in CUSTOMERS {
        let customer = db
            .customers()
            .create(&PartyInput {
                name: name.to_string(),
                phone: None,
                email: email.map(str::to_string),
                address: None,
            })
            .await?;
        customer_ids.push(customer.id);
    }
    println!(
        "✓ {} suppliers, {} customers",
        supplier_ids.len(),
        customer_ids.len()
    );

    // Every product arrives through an opening purchase of a new product.
    let mut products = Vec::new();
    let mut seed: usize = 0;
    for (category_name, items) in CATALOGUE {
        let category = db.categories().create(category_name).await?;

        for (name, cost, rate) in items.iter() {
            let purchase = db
                .purchases()
                .create(&PurchaseInput {
                    product: ProductChoice::New(NewProductSpec {
                        name: name.to_string(),
                        sku: Some(format!("SKU-{:04}", seed + 1)),
                        category_id: Some(category.id.clone()),
                    }),
                    supplier_id: Some(supplier_ids[seed % supplier_ids.len()].clone()),
                    quantity: 20 + (seed % 4) as i64 * 10,
                    price_per_unit: Money::from_major(*cost),
                    date: at(0, 9),
                })
                .await?;
            products.push((purchase.product_id, *cost, *rate));
            seed += 1;
        }
    }
    println!("✓ {} products received", products.len());

    let mut sales = 0;
    let mut restocks = 0;
    for day in 0..days {
        for (idx, (product_id, cost, rate)) in products.iter().enumerate() {
            let slot = seed + idx + day as usize * 7;
            if slot % 3 != 0 {
                continue;
            }

            let quantity = 1 + (slot % 3) as i64 + (slot % 2) as i64;
            let total = Money::from_major(*rate).multiply_quantity(quantity);
            let paid = if slot % 5 == 0 { Money::zero() } else { total };

            db.sales()
                .create(&SaleInput {
                    product_id: product_id.clone(),
                    customer_id: Some(customer_ids[slot % customer_ids.len()].clone()),
                    quantity,
                    rate: Money::from_major(*rate),
                    price_per_unit: None,
                    discount: Money::zero(),
                    paid,
                    credit: None,
                    remarks: None,
                    date: at(day, 10 + (slot % 8) as u32),
                })
                .await?;
            sales += 1;

            if db.products().get(product_id).await?.quantity < 5 {
                db.purchases()
                    .create(&PurchaseInput {
                        product: ProductChoice::Existing(product_id.clone()),
                        supplier_id: Some(supplier_ids[slot % supplier_ids.len()].clone()),
                        quantity: 20,
                        price_per_unit: Money::from_major(*cost),
                        date: at(day, 19),
                    })
                    .await?;
                restocks += 1;
            }
        }
    }
    println!("✓ {} sales, {} restocking purchases", sales, restocks);

    if let Some((product_id, _, _)) = products.get(6) {
        db.adjustments()
            .create(&StockAdjustmentInput {
                product_id: product_id.clone(),
                quantity: -2,
                adjustment_type: StockAdjustmentType::Expired,
                note: Some("Past best-before date".to_string()),
            })
            .await?;
        println!("✓ 1 stock adjustment");
    }

    let mut expense_categories: Vec<(&str, String)> = Vec::new();
    for (idx, (category_name, title, amount)) in EXPENSES.iter().enumerate() {
        let category_id = match expense_categories
            .iter()
            .find(|(name, _)| name == category_name)
        {
            Some((_, id)) => String::clone(id),
            None => {
                let category = db.expense_categories().create(category_name).await?;
                expense_categories.push((*category_name, category.id.clone()));
                category.id
            }
        };

        db.expenses()
            .create(&ExpenseInput {
                category_id: Some(category_id),
                title: title.to_string(),
                amount: Money::from_major(*amount),
                date: at((idx as i64 * 7).min(days - 1), 18),
                notes: None,
            })
            .await?;
    }
    println!("✓ {} expenses", EXPENSES.len());

    let summary = db.reports().dashboard_summary().await?;
    println!();
    println!("Stock value: {}", summary.stock_value);
    println!("Low stock:   {} products", summary.low_stock_count);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
