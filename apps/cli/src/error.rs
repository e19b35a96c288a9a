//! # API Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in shopledger                             │
//! │                                                                         │
//! │  Command Function  Result<Output, ApiError>                             │
//! │         │                                                               │
//! │         ├── ValidationError (form parse) ───────────► 400              │
//! │         ├── CoreError::NegativeStock ───────────────► 400              │
//! │         ├── DbError::NotFound ──────────────────────► 404              │
//! │         ├── DbError::UniqueViolation ───────────────► 409              │
//! │         ├── DbError::ForeignKeyViolation ───────────► 400              │
//! │         └── anything else (logged) ─────────────────► 500              │
//! │                                                                         │
//! │  main prints {"code": "...", "message": "..."} and exits non-zero      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Server errors carry a generic message; the detail goes to the log.

use serde::Serialize;
use shopledger_core::{CoreError, ValidationError};
use shopledger_db::{AggregationFailure, DbError};
use tracing::error;

/// Error printed when a command fails.
///
/// ```json
/// {
///   "code": "NEGATIVE_STOCK",
///   "message": "Stock for product p-1 would become negative: on hand 2, change -5"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// The offending field, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Operation would drive stock below zero (400)
    NegativeStock,

    /// Reference to a missing row, or a row still referenced (400)
    InvalidReference,

    /// Resource not found (404)
    NotFound,

    /// Uniqueness violation (409)
    Conflict,

    /// A report read failed (500)
    AggregationFailed,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP-equivalent status.
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError | ErrorCode::NegativeStock | ErrorCode::InvalidReference => {
                400
            }
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::AggregationFailed | ErrorCode::DatabaseError | ErrorCode::Internal => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let field = err.field().to_string();
        ApiError::validation(err.to_string()).with_field(field)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NegativeStock { .. } => ApiError::new(ErrorCode::NegativeStock, err.to_string()),
            CoreError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            CoreError::Conflict { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            )
            .with_field(field),
            CoreError::Validation(e) => e.into(),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            )
            .with_field(field),
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::new(
                    ErrorCode::InvalidReference,
                    "Invalid reference: the row is missing or still in use",
                )
            }
            DbError::Domain(e) => e.into(),
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Export(e) => {
                error!("Export failed: {}", e);
                ApiError::internal("Export failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<AggregationFailure> for ApiError {
    fn from(err: AggregationFailure) -> Self {
        error!(report = err.report, error = %err.source, "Report failed");
        ApiError::new(
            ErrorCode::AggregationFailed,
            format!("{} could not be computed", err.report),
        )
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation(format!("Invalid JSON: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_stock_is_client_error() {
        let err: ApiError = DbError::Domain(CoreError::NegativeStock {
            product_id: "p-1".to_string(),
            on_hand: 2,
            change: -5,
        })
        .into();

        assert_eq!(err.code, ErrorCode::NegativeStock);
        assert_eq!(err.code.status(), 400);
        assert!(err.message.contains("on hand 2"));
    }

    #[test]
    fn test_unique_violation_names_field() {
        let err: ApiError = DbError::duplicate("invoice_number", "INV-1").into();

        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.code.status(), 409);
        assert_eq!(err.field.as_deref(), Some("invoice_number"));
    }

    #[test]
    fn test_validation_carries_field() {
        let err: ApiError = ValidationError::Required {
            field: "date".to_string(),
        }
        .into();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.field.as_deref(), Some("date"));
        assert_eq!(err.message, "date is required");
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err: ApiError = DbError::QueryFailed("no such column: secret".to_string()).into();

        assert_eq!(err.code.status(), 500);
        assert!(!err.code.is_client_error());
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_serializes_code_and_message() {
        let json = serde_json::to_value(ApiError::not_found("Sale", "s-9")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Sale not found: s-9");
        assert!(json.get("field").is_none());
    }
}
