//! # Payloads
//!
//! Inbound request bodies and query strings, and their structural checks.
//!
//! ## Sparse Patches
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PATCH /products/:id                                                   │
//! │                                                                         │
//! │  JSON                         Rust field (Option<Option<T>>)           │
//! │  ────────────────────────     ─────────────────────────────────         │
//! │  key absent               →   None            leave stored value       │
//! │  "salePrice": null        →   Some(None)      clear the column         │
//! │  "salePrice": 1490        →   Some(Some(..))  overwrite                │
//! │                                                                         │
//! │  Non-nullable columns use Option<T>: absent or a new value.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `validate()` consumes the payload and returns it normalized
//! (trimmed strings, lowercased email, defaulted quantities) or the full
//! list of failing fields.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{ValidationError, ValidationErrors};
use crate::money::Money;
use crate::types::Role;
use crate::validation::{
    parse_flag, parse_limit, parse_page, validate_assignable_role, validate_email,
    validate_json_object, validate_password, validate_positive_count, validate_positive_money,
    validate_quantity, validate_string_list, validate_text, validate_url,
};
use crate::{DEFAULT_ITEM_QUANTITY, MAX_ITEM_QUANTITY};

pub const PRODUCT_NAME_MAX: usize = 100;
pub const PRODUCT_DESCRIPTION_MAX: usize = 500;
pub const CATEGORY_NAME_MAX: usize = 50;
pub const CATEGORY_DESCRIPTION_MAX: usize = 200;
pub const COMBO_NAME_MIN: usize = 3;
pub const USER_NAME_MAX: usize = 100;
pub const REGISTER_PASSWORD_MIN: usize = 6;
pub const UPDATE_PASSWORD_MIN: usize = 8;

fn default_true() -> bool {
    true
}

fn default_quantity() -> i64 {
    DEFAULT_ITEM_QUANTITY
}

/// Trims an optional free-text field bounded by `max`.
fn check_optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    max: Option<usize>,
) -> Option<String> {
    value.and_then(|v| errors.capture(validate_text(field, &v, 0, max)))
}

/// Same as [`check_optional_text`] for a nullable patch field.
fn check_patch_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Option<String>>,
    max: Option<usize>,
) -> Option<Option<String>> {
    match value {
        Some(Some(v)) => errors
            .capture(validate_text(field, &v, 0, max))
            .map(Some),
        other => other,
    }
}

fn check_sale_price_order(
    errors: &mut ValidationErrors,
    sale_price: Option<Money>,
    price: Option<Money>,
) {
    if let (Some(sale), Some(price)) = (sale_price, price) {
        if sale >= price {
            errors.push(ValidationError::Ordering {
                field: "salePrice".to_string(),
                relation: "lower than".to_string(),
                other: "price".to_string(),
            });
        }
    }
}

fn check_window_order(
    errors: &mut ValidationErrors,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) {
    if let (Some(from), Some(until)) = (from, until) {
        if until <= from {
            errors.push(ValidationError::Ordering {
                field: "activeUntil".to_string(),
                relation: "after".to_string(),
                other: "activeFrom".to_string(),
            });
        }
    }
}

// =============================================================================
// Category Payloads
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateCategory {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(name) =
            errors.capture(validate_text("name", &self.name, 1, Some(CATEGORY_NAME_MAX)))
        {
            self.name = name;
        }
        self.description = check_optional_text(
            &mut errors,
            "description",
            self.description.take(),
            Some(CATEGORY_DESCRIPTION_MAX),
        );

        errors.finish(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
}

impl UpdateCategory {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        self.name = self
            .name
            .take()
            .and_then(|n| errors.capture(validate_text("name", &n, 1, Some(CATEGORY_NAME_MAX))));
        self.description = check_patch_text(
            &mut errors,
            "description",
            self.description.take(),
            Some(CATEGORY_DESCRIPTION_MAX),
        );

        errors.finish(self)
    }
}

// =============================================================================
// Product Payloads
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub serving: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nutritional_info: Option<serde_json::Value>,
}

impl CreateProduct {
    /// ## Example
    /// ```rust
    /// use comanda_core::payload::CreateProduct;
    ///
    /// let payload: CreateProduct =
    ///     serde_json::from_str(r#"{"name":"X","price":1000,"salePrice":1200}"#).unwrap();
    /// let errors = payload.validate().unwrap_err();
    /// assert!(errors.has_field("salePrice"));
    /// ```
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(name) =
            errors.capture(validate_text("name", &self.name, 1, Some(PRODUCT_NAME_MAX)))
        {
            self.name = name;
        }
        self.description = check_optional_text(
            &mut errors,
            "description",
            self.description.take(),
            Some(PRODUCT_DESCRIPTION_MAX),
        );
        errors.check(validate_positive_money("price", self.price));
        if let Some(sale) = self.sale_price {
            errors.check(validate_positive_money("salePrice", sale));
        }
        self.image_url = self
            .image_url
            .take()
            .and_then(|url| errors.capture(validate_url("imageUrl", &url)));
        if let Some(ingredients) = self.ingredients.take() {
            self.ingredients =
                errors.capture_all(validate_string_list("ingredients", &ingredients));
        }
        if let Some(tags) = errors.capture_all(validate_string_list("tags", &self.tags)) {
            self.tags = tags;
        }
        if let Some(serving) = self.serving {
            errors.check(validate_positive_count("serving", serving));
        }
        if let Some(info) = &self.nutritional_info {
            errors.check(validate_json_object("nutritionalInfo", info));
        }
        check_sale_price_order(&mut errors, self.sale_price, Some(self.price));

        errors.finish(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub sale_price: Option<Option<Money>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub ingredients: Option<Option<Vec<String>>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub serving: Option<Option<i64>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub nutritional_info: Option<Option<serde_json::Value>>,
}

impl UpdateProduct {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        self.name = self
            .name
            .take()
            .and_then(|n| errors.capture(validate_text("name", &n, 1, Some(PRODUCT_NAME_MAX))));
        self.description = check_patch_text(
            &mut errors,
            "description",
            self.description.take(),
            Some(PRODUCT_DESCRIPTION_MAX),
        );
        if let Some(price) = self.price {
            errors.check(validate_positive_money("price", price));
        }
        if let Some(Some(sale)) = self.sale_price {
            errors.check(validate_positive_money("salePrice", sale));
        }
        if let Some(Some(url)) = &mut self.image_url {
            *url = url.trim().to_string();
        }
        self.ingredients = match self.ingredients.take() {
            Some(Some(list)) => errors
                .capture_all(validate_string_list("ingredients", &list))
                .map(Some),
            other => other,
        };
        self.tags = self
            .tags
            .take()
            .and_then(|list| errors.capture_all(validate_string_list("tags", &list)));
        if let Some(Some(serving)) = self.serving {
            errors.check(validate_positive_count("serving", serving));
        }
        if let Some(Some(info)) = &self.nutritional_info {
            errors.check(validate_json_object("nutritionalInfo", info));
        }
        check_sale_price_order(&mut errors, self.sale_price.flatten(), self.price);

        errors.finish(self)
    }

    /// True when the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.sale_price.is_none()
            && self.category_id.is_none()
            && self.image_url.is_none()
            && self.is_available.is_none()
            && self.ingredients.is_none()
            && self.serving.is_none()
            && self.tags.is_none()
            && self.nutritional_info.is_none()
    }
}

/// Raw `GET /products` query string. Values stay text until validated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQueryParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category_id: Option<String>,
    pub is_available: Option<String>,
    pub search: Option<String>,
    pub tags: Option<String>,
    pub on_sale: Option<String>,
}

/// Parsed product listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub page: u32,
    pub limit: u32,
    pub category_id: Option<String>,
    pub is_available: Option<bool>,
    pub search: Option<String>,
    /// Any-match tag filter; empty means no tag filter.
    pub tags: Vec<String>,
    pub on_sale: Option<bool>,
}

impl Default for ProductFilter {
    fn default() -> Self {
        ProductFilter {
            page: 1,
            limit: crate::DEFAULT_PAGE_SIZE,
            category_id: None,
            is_available: None,
            search: None,
            tags: Vec::new(),
            on_sale: None,
        }
    }
}

impl ProductQueryParams {
    /// ## Example
    /// ```rust
    /// use comanda_core::payload::ProductQueryParams;
    ///
    /// let params = ProductQueryParams {
    ///     tags: Some("vegan, spicy".into()),
    ///     on_sale: Some("true".into()),
    ///     ..Default::default()
    /// };
    /// let filter = params.validate().unwrap();
    /// assert_eq!(filter.tags, vec!["vegan", "spicy"]);
    /// assert_eq!(filter.on_sale, Some(true));
    /// assert_eq!(filter.limit, 10);
    /// ```
    pub fn validate(self) -> Result<ProductFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let page = errors.capture(parse_page(self.page.as_deref()));
        let limit = errors.capture(parse_limit(self.limit.as_deref()));

        let tags = self
            .tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let filter = ProductFilter {
            page: page.unwrap_or(1),
            limit: limit.unwrap_or(crate::DEFAULT_PAGE_SIZE),
            category_id: self.category_id.filter(|c| !c.is_empty()),
            is_available: parse_flag(self.is_available.as_deref()),
            search,
            tags,
            on_sale: parse_flag(self.on_sale.as_deref()),
        };

        errors.finish(filter)
    }
}

// =============================================================================
// Combo Payloads
// =============================================================================

/// One requested combo line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboItemInput {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn check_items(errors: &mut ValidationErrors, items: &[ComboItemInput]) {
    for (index, item) in items.iter().enumerate() {
        if item.product_id.trim().is_empty() {
            errors.push(ValidationError::Required {
                field: format!("items.{index}.productId"),
            });
        }
        errors.check(validate_quantity(
            &format!("items.{index}.quantity"),
            item.quantity,
            MAX_ITEM_QUANTITY,
        ));
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCombo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub original_price: Option<Money>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub active_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<ComboItemInput>,
}

impl CreateCombo {
    /// ## Example
    /// ```rust
    /// use comanda_core::payload::CreateCombo;
    ///
    /// let payload: CreateCombo =
    ///     serde_json::from_str(r#"{"name":"Combo A","price":5000,"items":[]}"#).unwrap();
    /// assert!(payload.validate().unwrap_err().has_field("items"));
    /// ```
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(name) = errors.capture(validate_text("name", &self.name, COMBO_NAME_MIN, None))
        {
            self.name = name;
        }
        self.description =
            check_optional_text(&mut errors, "description", self.description.take(), None);
        errors.check(validate_positive_money("price", self.price));
        // Zero carries no comparison value.
        self.original_price = self.original_price.filter(|p| !p.is_zero());
        self.image_url = self.image_url.take().map(|u| u.trim().to_string());
        if let Some(tags) = errors.capture_all(validate_string_list("tags", &self.tags)) {
            self.tags = tags;
        }
        if self.items.is_empty() {
            errors.push(ValidationError::TooFewItems {
                field: "items".to_string(),
                min: 1,
            });
        }
        check_items(&mut errors, &self.items);
        check_window_order(&mut errors, self.active_from, self.active_until);

        errors.finish(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCombo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub original_price: Option<Option<Money>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub active_from: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub active_until: Option<Option<DateTime<Utc>>>,
    /// `Some(vec![])` leaves the item set untouched.
    #[serde(default)]
    pub items: Option<Vec<ComboItemInput>>,
}

impl UpdateCombo {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        self.name = self
            .name
            .take()
            .and_then(|n| errors.capture(validate_text("name", &n, COMBO_NAME_MIN, None)));
        self.description =
            check_patch_text(&mut errors, "description", self.description.take(), None);
        if let Some(price) = self.price {
            errors.check(validate_positive_money("price", price));
        }
        if let Some(Some(original)) = self.original_price {
            if original.is_zero() {
                self.original_price = Some(None);
            }
        }
        self.tags = self
            .tags
            .take()
            .and_then(|list| errors.capture_all(validate_string_list("tags", &list)));
        if let Some(items) = &self.items {
            check_items(&mut errors, items);
        }
        check_window_order(
            &mut errors,
            self.active_from.flatten(),
            self.active_until.flatten(),
        );

        errors.finish(self)
    }

    /// Items to write, if the patch replaces the set. An empty list does not.
    pub fn item_changes(&self) -> Option<&[ComboItemInput]> {
        self.items.as_deref().filter(|items| !items.is_empty())
    }
}

// =============================================================================
// Auth & User Payloads
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl RegisterRequest {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(email) = errors.capture(validate_email("email", &self.email)) {
            self.email = email;
        }
        errors.check(validate_password("password", &self.password, REGISTER_PASSWORD_MIN));
        self.name = self
            .name
            .take()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        errors.finish(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(email) = errors.capture(validate_email("email", &self.email)) {
            self.email = email;
        }
        errors.check(validate_password("password", &self.password, REGISTER_PASSWORD_MIN));

        errors.finish(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub name: Option<Option<String>>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Validated user patch with a parsed role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Option<String>,
    /// Plain text; hashed by the auth layer before it reaches storage.
    pub password: Option<String>,
    pub name: Option<Option<String>>,
    pub role: Option<Role>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = self
            .email
            .and_then(|e| errors.capture(validate_email("email", &e)));
        if let Some(password) = &self.password {
            errors.check(validate_password("password", password, UPDATE_PASSWORD_MIN));
        }
        let name = match self.name {
            Some(Some(n)) => errors
                .capture(validate_text("name", &n, 1, Some(USER_NAME_MAX)))
                .map(Some),
            other => other,
        };
        let role = self
            .role
            .and_then(|r| errors.capture(validate_assignable_role("role", &r)));

        errors.finish(UserPatch {
            email,
            password: self.password,
            name,
            role,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
