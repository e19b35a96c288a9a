//! # Validation Module
//!
//! Input validation and raw-value parsing for shopledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command layer                                                │
//! │  ├── Collects raw strings (form fields, CLI args, JSON items)          │
//! │  └── Hands them to the `form` module                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Dates, quantities, amounts, percents, names, ids                  │
//! │  └── Every failure names the field at fault                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (sku, email, invoice number)                   │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Nothing is written until layers 1 and 2 have passed.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopledger_core::validation::{parse_business_date, parse_money, parse_quantity};
//!
//! let date = parse_business_date("date", "2024-01-15").unwrap();
//! assert_eq!(date.to_string(), "2024-01-15 00:00:00");
//!
//! assert_eq!(parse_quantity("quantity", "5").unwrap(), 5);
//! assert_eq!(parse_money("price", "12.5").unwrap().minor(), 1250);
//! ```

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::ValidationError;
use crate::money::{Money, MINOR_PER_MAJOR};
use crate::types::TaxRate;
use crate::{MAX_AMOUNT_MINOR, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Date format accepted from forms.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maximum length for names (products, parties, categories).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length for free text (notes, remarks, addresses).
pub const MAX_TEXT_LEN: usize = 1000;

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

fn invalid(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a required `YYYY-MM-DD` business date to local midnight.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - Must be a real calendar date
///
/// ## Example
/// ```rust
/// use shopledger_core::validation::parse_business_date;
///
/// assert!(parse_business_date("date", "2024-02-29").is_ok());
/// assert!(parse_business_date("date", "2023-02-29").is_err());
/// assert!(parse_business_date("date", "  ").is_err());
/// ```
pub fn parse_business_date(field: &str, raw: &str) -> ValidationResult<NaiveDateTime> {
    Ok(parse_date(field, raw)?.and_time(NaiveTime::MIN))
}

/// Parses a required `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(required(field));
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| invalid(field, "expected a date in YYYY-MM-DD form"))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a required quantity.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Purchase form: quantity field                                         │
/// │                                                                         │
/// │  "12"   → 12                                                           │
/// │  ""     → Error: "quantity is required"                               │
/// │  "1.5"  → Error: "quantity has invalid format"                        │
/// │  "0"    → Error: "quantity must be positive"                          │
/// │  "-3"   → Error: "quantity must be positive"                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn parse_quantity(field: &str, raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(required(field));
    }

    let qty: i64 = raw
        .parse()
        .map_err(|_| invalid(field, "must be a whole number"))?;
    validate_quantity(field, qty)?;
    Ok(qty)
}

/// Validates a quantity on a stock event.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Parses a non-negative whole number that may be zero (opening stock,
/// thresholds).
pub fn parse_count(field: &str, raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(required(field));
    }

    let n: i64 = raw
        .parse()
        .map_err(|_| invalid(field, "must be a whole number"))?;
    if n < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if n > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(n)
}

/// Parses a decimal string with at most two fractional digits into
/// hundredths. Sign handling is left to callers.
fn parse_hundredths(field: &str, raw: &str) -> ValidationResult<i64> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid(field, "must be a number"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(field, "must be a number"));
    }
    if frac.len() > 2 {
        return Err(invalid(field, "at most two decimal places"));
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| invalid(field, "number is too large"))?
    };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().unwrap_or(0) * 10,
        _ => frac.parse::<i64>().unwrap_or(0),
    };

    let value = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| invalid(field, "number is too large"))?;

    Ok(if negative { -value } else { value })
}

/// Parses a required, non-negative monetary amount.
///
/// ## Example
/// ```rust
/// use shopledger_core::validation::parse_money;
///
/// assert_eq!(parse_money("rate", "80").unwrap().minor(), 8000);
/// assert_eq!(parse_money("rate", "0.5").unwrap().minor(), 50);
/// assert!(parse_money("rate", "-1").is_err());
/// assert!(parse_money("rate", "abc").is_err());
/// assert!(parse_money("rate", "1.234").is_err());
/// assert!(parse_money("rate", "100000000000000").is_err());
/// ```
pub fn parse_money(field: &str, raw: &str) -> ValidationResult<Money> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(required(field));
    }

    let minor = parse_hundredths(field, raw)?;
    if minor < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if minor > MAX_AMOUNT_MINOR {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_MINOR / MINOR_PER_MAJOR,
        });
    }
    Ok(Money::from_minor(minor))
}

/// Parses an optional amount; empty or absent input is `None`.
pub fn parse_optional_money(field: &str, raw: Option<&str>) -> ValidationResult<Option<Money>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_money(field, s).map(Some),
    }
}

/// Parses an optional amount that defaults to zero (discount, paid).
pub fn parse_money_or_zero(field: &str, raw: Option<&str>) -> ValidationResult<Money> {
    Ok(parse_optional_money(field, raw)?.unwrap_or_default())
}

/// Parses a percentage such as `"9"` or `"2.5"` into a tax rate.
///
/// Empty input is a zero rate.
///
/// ## Rules
/// - Between 0 and 100
/// - At most two decimal places
pub fn parse_percent(field: &str, raw: &str) -> ValidationResult<TaxRate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(TaxRate::zero());
    }

    let bps = parse_hundredths(field, raw)?;
    if !(0..=10_000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(TaxRate::from_bps(bps as u32))
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use shopledger_core::validation::validate_name;
///
/// assert_eq!(validate_name("name", "  Rice 1kg ").unwrap(), "Rice 1kg");
/// assert!(validate_name("name", "").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(required(field));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Trims optional free text; blank becomes `None`.
pub fn optional_text(field: &str, raw: Option<&str>) -> ValidationResult<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.chars().count() > MAX_TEXT_LEN => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        }),
        Some(s) => Ok(Some(s.to_string())),
    }
}

/// Validates an optional SKU.
///
/// ## Rules
/// - Blank means no SKU
/// - At most 50 characters
/// - Letters, numbers, hyphens and underscores only
pub fn validate_sku(raw: Option<&str>) -> ValidationResult<Option<String>> {
    let sku = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(Some(sku.to_string()))
}

/// Validates an optional email address; blank means none.
pub fn validate_email(raw: Option<&str>) -> ValidationResult<Option<String>> {
    let email = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            Ok(Some(email.to_lowercase()))
        }
        _ => Err(invalid("email", "must be an email address")),
    }
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (search returns nothing)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a required entity id (UUID v4 string) and returns it trimmed.
///
/// ## Example
/// ```rust
/// use shopledger_core::validation::validate_id;
///
/// assert!(validate_id("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_id(field: &str, raw: &str) -> ValidationResult<String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(required(field));
    }

    uuid::Uuid::parse_str(id).map_err(|_| invalid(field, "must be a valid id"))?;

    Ok(id.to_string())
}

/// Validates an optional reference; blank means none.
pub fn optional_id(field: &str, raw: Option<&str>) -> ValidationResult<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => validate_id(field, s).map(Some),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
