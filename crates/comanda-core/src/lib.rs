//! # comanda-core: Pure Business Logic for Comanda
//!
//! This crate holds the catalog domain: products, categories, combos and
//! users, the payloads that create and patch them, and the rules that keep
//! prices and validity windows consistent. Nothing in here touches a
//! database or a socket.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Admin Dashboard / Ticket View (external)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apps/api (axum routes + services)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ comanda-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  payload  │  │ pricing + │  │   │
//! │  │   │  Product  │  │   Money   │  │  Create*  │  │   combo   │  │   │
//! │  │   │   Combo   │  │           │  │  Update*  │  │ item diff │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 comanda-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, Combo, User, Role)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validators and the error accumulator
//! - [`payload`] - Create/update/query payloads and their structural checks
//! - [`pricing`] - Price and validity-window ordering rules
//! - [`combo`] - Combo item-set diffing and totals
//!
//! ## Example Usage
//!
//! ```rust
//! use comanda_core::pricing::check_combo_pricing;
//! use comanda_core::money::Money;
//!
//! // 50.00 is not cheaper than 40.00, so the combo is rejected
//! let result = check_combo_pricing(Money::from_cents(5000), Some(Money::from_cents(4000)));
//! assert!(result.is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod combo;
pub mod error;
pub mod money;
pub mod payload;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, FieldError, ValidationError, ValidationErrors};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Quantity used for a combo item when the payload omits it.
pub const DEFAULT_ITEM_QUANTITY: i64 = 1;

/// Largest quantity a single combo item may carry.
pub const MAX_ITEM_QUANTITY: i64 = 999;
