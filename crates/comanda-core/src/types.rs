//! # Domain Types
//!
//! Core domain types used throughout Comanda.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│    Product      │◄──│   ComboItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  combo_id (FK)  │       │
//! │  │  name (unique)  │   │  name (unique)  │   │  product_id(FK) │       │
//! │  │  description    │   │  price          │   │  quantity ≥ 1   │       │
//! │  └────────▲────────┘   │  sale_price     │   └────────┬────────┘       │
//! │           │            └─────────────────┘            │                │
//! │           │            ┌─────────────────┐            │                │
//! │           └────────────│     Combo       │◄───────────┘                │
//! │                        │  ─────────────  │                              │
//! │                        │  price          │   ┌─────────────────┐       │
//! │                        │  original_price │   │      User       │       │
//! │                        │  active window  │   │  email, role    │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Every type serializes with camelCase keys. Timestamps are RFC 3339 UTC,
//! money is integer cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// Access role of a user account.
///
/// Only `ADMIN` passes the admin gate. `VIP_CLIENT` is a marketing tier
/// and behaves like `CLIENT` for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Client,
    Admin,
    Staff,
    VipClient,
}

impl Role {
    /// The stored and serialized name of the role.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
            Role::VipClient => "VIP_CLIENT",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Client
    }
}

// =============================================================================
// Category
// =============================================================================

/// A menu section ("Burgers", "Drinks").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Category row of the listing, with how many products it owns.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

/// A single category with its available products, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<Product>,
    pub product_count: i64,
}

// =============================================================================
// Product
// =============================================================================

/// A menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique regardless of case.
    pub name: String,

    pub description: Option<String>,

    /// Regular price.
    pub price: Money,

    /// Promotional price. Always lower than `price` when set.
    pub sale_price: Option<Money>,

    pub category_id: Option<String>,

    pub image_url: Option<String>,

    /// Hidden from category pages when false.
    pub is_available: bool,

    pub ingredients: Vec<String>,

    /// Number of people one portion serves.
    pub serving: Option<i64>,

    pub tags: Vec<String>,

    /// Free-form nutrition facts (`{"calories": 540, ...}`).
    #[ts(type = "Record<string, unknown> | null")]
    pub nutritional_info: Option<serde_json::Value>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Product with its category expanded.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
}

// =============================================================================
// Combo
// =============================================================================

/// A priced bundle of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Combo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    /// What the parts would cost separately. Higher than `price` when set.
    pub original_price: Option<Money>,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub is_featured: bool,
    #[ts(as = "Option<String>")]
    pub active_from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub active_until: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Combo {
    /// Whether `now` falls inside the validity window. Open ends are unbounded.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.active_from.map_or(true, |from| from <= now);
        let not_ended = self.active_until.map_or(true, |until| now < until);
        started && not_ended
    }

    /// How much the customer saves against `original_price`, if known.
    pub fn savings(&self) -> Option<Money> {
        self.original_price.map(|original| original - self.price)
    }
}

/// One line of a combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ComboItem {
    pub id: String,
    pub combo_id: String,
    pub product_id: String,
    pub quantity: i64,
}

/// Combo line with its product expanded.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ComboItemDetail {
    #[serde(flatten)]
    pub item: ComboItem,
    pub product: Product,
}

impl ComboItemDetail {
    /// Regular price of this line (`product.price × quantity`). `None` on
    /// overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.product.price.checked_multiply_quantity(self.item.quantity)
    }
}

/// Combo with category, expanded items and the regular price of its parts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ComboDetail {
    #[serde(flatten)]
    pub combo: Combo,
    pub category: Option<Category>,
    pub items: Vec<ComboItemDetail>,
    /// Σ product.price × quantity over `items`.
    pub items_total: Money,
    /// `originalPrice - price` when an original price is set.
    pub savings: Option<Money>,
    /// Whether the validity window covers the moment of the read.
    pub is_active: bool,
}

impl ComboDetail {
    /// Assembles the read model, deriving totals and the active flag at `now`.
    ///
    /// ## Returns
    /// * `Err(CoreError::ItemsTotalOverflow)` - items total out of range
    pub fn new(
        combo: Combo,
        category: Option<Category>,
        items: Vec<ComboItemDetail>,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let items_total = crate::combo::items_total(&items)?;
        Ok(ComboDetail {
            savings: combo.savings(),
            is_active: combo.is_active_at(now),
            combo,
            category,
            items,
            items_total,
        })
    }
}

// =============================================================================
// User
// =============================================================================

/// A user account. The password hash never leaves comanda-db.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Pagination
// =============================================================================

/// Page metadata returned next to a paged listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// Builds page metadata; `total_pages` rounds up.
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i = i64::from(limit.max(1));
        Pagination {
            page,
            limit,
            total,
            total_pages: (total + limit_i - 1) / limit_i,
        }
    }

    /// Rows to skip before this page.
    #[inline]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_combo() -> Combo {
        let now = Utc::now();
        Combo {
            id: "c1".into(),
            name: "Family Night".into(),
            description: None,
            price: Money::from_cents(8990),
            original_price: Some(Money::from_cents(10470)),
            category_id: None,
            image_url: None,
            is_available: true,
            is_featured: false,
            active_from: None,
            active_until: None,
            tags: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::VipClient).unwrap(), "\"VIP_CLIENT\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert!(role.is_admin());
        assert_eq!(Role::default(), Role::Client);
    }

    #[test]
    fn test_combo_window() {
        let now = Utc::now();
        let mut combo = sample_combo();
        assert!(combo.is_active_at(now));

        combo.active_from = Some(now + Duration::hours(1));
        assert!(!combo.is_active_at(now));

        combo.active_from = Some(now - Duration::hours(2));
        combo.active_until = Some(now - Duration::hours(1));
        assert!(!combo.is_active_at(now));
    }

    #[test]
    fn test_combo_savings() {
        assert_eq!(sample_combo().savings(), Some(Money::from_cents(1480)));
    }

    #[test]
    fn test_combo_detail_flattens_combo_fields() {
        let detail = ComboDetail::new(sample_combo(), None, vec![], Utc::now()).unwrap();
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Family Night");
        assert_eq!(json["originalPrice"], 10470);
        assert_eq!(json["itemsTotal"], 0);
        assert_eq!(json["savings"], 1480);
        assert_eq!(json["isActive"], true);
        assert!(json["category"].is_null());
    }

    #[test]
    fn test_combo_detail_inactive_outside_window() {
        let now = Utc::now();
        let mut combo = sample_combo();
        combo.original_price = None;
        combo.active_until = Some(now - Duration::days(1));

        let detail = ComboDetail::new(combo, None, vec![], now).unwrap();
        assert!(!detail.is_active);
        assert_eq!(detail.savings, None);
    }

    #[test]
    fn test_pagination() {
        let p = Pagination::new(2, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset(), 10);

        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
    }
}
