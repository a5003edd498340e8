//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core errors (this file)                                       │
//! │  ├── ValidationError  - One field failed a structural check            │
//! │  ├── ValidationErrors - Every field failure of one payload             │
//! │  └── CoreError        - Business rule violations                       │
//! │                                                                         │
//! │  comanda-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (in apps/api)                                              │
//! │  └── ApiError         - What the HTTP client sees                      │
//! │                                                                         │
//! │  Flow: ValidationErrors → CoreError → ApiError → JSON error envelope   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, entity, id)
//! 3. Errors are enum variants, never String
//! 4. Validation collects every failing field before reporting

use serde::Serialize;
use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Validation Error
// =============================================================================

/// A single field that failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid email, invalid URL).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A collection needs more entries.
    #[error("{field} must contain at least {min} item(s)")]
    TooFewItems { field: String, min: usize },

    /// Two fields of the same payload are in the wrong order.
    #[error("{field} must be {relation} {other}")]
    Ordering {
        field: String,
        relation: String,
        other: String,
    },
}

impl ValidationError {
    /// Returns the (dotted) path of the field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::TooFewItems { field, .. }
            | ValidationError::Ordering { field, .. } => field,
        }
    }
}

/// Wire shape of one field failure: `{ "field": "items.0.quantity", "message": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        FieldError {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// All structural failures found in one payload.
///
/// ## Why Collect?
/// The dashboard highlights every bad input at once, so validation keeps
/// going after the first failure and reports the whole list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Invalid data")]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure.
    pub fn push(&mut self, err: ValidationError) {
        self.errors.push(err);
    }

    /// Records the error of a validator result, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(err) = result {
            self.push(err);
        }
    }

    /// Records the error of a validator result, returning its value on success.
    pub fn capture<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    /// Records every failure of a list validator.
    pub fn capture_all<T>(&mut self, result: Result<T, Vec<ValidationError>>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(errs) => {
                self.errors.extend(errs);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Returns true when any failure is about `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field() == field)
    }

    /// Converts into the wire representation.
    pub fn field_errors(&self) -> Vec<FieldError> {
        self.errors.iter().map(FieldError::from).collect()
    }

    /// `Ok(value)` when nothing failed, otherwise `Err(self)`.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors { errors: vec![err] }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations that only make sense
/// once a payload is structurally valid.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    /// Unique name (or email) already taken.
    ///
    /// ## User Workflow
    /// ```text
    /// PATCH /categories/:id { name: "Burgers" }
    ///      │
    ///      ▼
    /// Another category named "burgers" exists (any case)
    ///      │
    ///      ▼
    /// Conflict { entity: "category", field: "name" } → 409
    /// ```
    #[error("A {entity} with this {field} already exists")]
    Conflict { entity: &'static str, field: &'static str },

    /// Combo price must undercut the price of its parts.
    #[error("Combo price must be lower than the original price")]
    ComboPriceNotBelowOriginal { price: Money, original_price: Money },

    /// Product sale price must undercut the regular price.
    #[error("Sale price must be lower than the regular price")]
    SalePriceNotBelowPrice { sale_price: Money, price: Money },

    /// Combo availability window ends before it starts.
    #[error("activeUntil must be after activeFrom")]
    InvalidValidityWindow,

    /// Some combo item references a product that does not exist.
    #[error("One or more of the given products do not exist")]
    MissingProducts { requested: usize, found: usize },

    /// Σ price × quantity of a combo does not fit in the money range.
    #[error("Combo items total is too large")]
    ItemsTotalOverflow,

    /// Entity is still referenced and cannot be removed.
    #[error("Cannot remove a {entity} that still has associated {dependents}")]
    HasDependents {
        entity: &'static str,
        dependents: &'static str,
        count: i64,
    },

    /// Payload failed structural validation.
    #[error("Invalid data")]
    Validation(#[from] ValidationErrors),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(err.into())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
