//! # Repository Module
//!
//! Database repository implementations for Comanda.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Entity service                                                        │
//! │       │                                                                 │
//! │       │  db.combos().update(&combo, Some(&changes))                    │
//! │       ▼                                                                 │
//! │  ComboRepository                                                       │
//! │  ├── get_by_id / find_by_name                                          │
//! │  ├── create (combo + items, one transaction)                           │
//! │  ├── update (row + item diff, one transaction)                         │
//! │  └── delete (items + combo, one transaction)                           │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Repositories know SQL. They do not know business rules: the service   │
//! │  decides WHAT to write, the repository decides HOW.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Row Types
//! SQLite stores lists and nutritional info as JSON text, so each repository
//! decodes into a private `*Row` struct (`sqlx::FromRow`) and converts it
//! into the comanda-core type.
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`](category::CategoryRepository) - Categories and product counts
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and filtered listing
//! - [`ComboRepository`](combo::ComboRepository) - Combos and their items
//! - [`UserRepository`](user::UserRepository) - Accounts and password hashes

use uuid::Uuid;

pub mod category;
pub mod combo;
pub mod product;
pub mod user;

/// Generates a new primary key (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
