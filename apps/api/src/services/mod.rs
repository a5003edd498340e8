//! Entity services.
//!
//! Each service layers business rules (uniqueness, referential checks,
//! price ordering) on top of payload validation and one or more
//! repositories. Handlers in `routes` stay thin: extract, call a service,
//! wrap the result in a message envelope.
//!
//! ```text
//! route ──► payload.validate() ──► Service rules ──► Repository ──► SQLite
//! ```

pub mod auth_service;
pub mod category_service;
pub mod combo_service;
pub mod product_service;
pub mod user_service;

pub use auth_service::{AuthService, AuthSession};
pub use category_service::CategoryService;
pub use combo_service::ComboService;
pub use product_service::ProductService;
pub use user_service::UserService;
