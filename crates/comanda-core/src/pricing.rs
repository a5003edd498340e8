//! # Pricing Rules
//!
//! Ordering checks between prices and dates that only make sense once the
//! stored row and the incoming patch are merged.
//!
//! ```text
//!   stored row          patch              merged           rule
//!   ───────────         ─────────          ──────────       ─────────────────────
//!   price 3000          originalPrice 2500 3000 / 2500  →   price < originalPrice ✗
//!   salePrice 900       price 800          900 / 800    →   salePrice < price     ✗
//!   activeUntil Jan 10  activeFrom Jan 20  20 / 10      →   from < until          ✗
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Merges a nullable patch field over the stored value.
///
/// ```rust
/// use comanda_core::pricing::merge_nullable;
///
/// assert_eq!(merge_nullable(None, Some(5)), Some(5));       // absent: keep
/// assert_eq!(merge_nullable(Some(None), Some(5)), None);    // null: clear
/// assert_eq!(merge_nullable(Some(Some(7)), Some(5)), Some(7));
/// ```
#[inline]
pub fn merge_nullable<T>(patch: Option<Option<T>>, stored: Option<T>) -> Option<T> {
    match patch {
        Some(value) => value,
        None => stored,
    }
}

/// A combo must be cheaper than buying its parts.
///
/// A missing or zero original price imposes nothing.
///
/// ## Example
/// ```rust
/// use comanda_core::money::Money;
/// use comanda_core::pricing::check_combo_pricing;
///
/// assert!(check_combo_pricing(Money::from_cents(3990), Some(Money::from_cents(4970))).is_ok());
/// assert!(check_combo_pricing(Money::from_cents(5000), Some(Money::from_cents(4000))).is_err());
/// assert!(check_combo_pricing(Money::from_cents(5000), None).is_ok());
/// ```
pub fn check_combo_pricing(price: Money, original_price: Option<Money>) -> CoreResult<()> {
    match original_price {
        Some(original) if !original.is_zero() && price >= original => {
            Err(CoreError::ComboPriceNotBelowOriginal {
                price,
                original_price: original,
            })
        }
        _ => Ok(()),
    }
}

/// A product's sale price must undercut its regular price.
pub fn check_sale_price(sale_price: Option<Money>, price: Money) -> CoreResult<()> {
    match sale_price {
        Some(sale) if sale >= price => Err(CoreError::SalePriceNotBelowPrice {
            sale_price: sale,
            price,
        }),
        _ => Ok(()),
    }
}

/// A validity window must end after it starts. Open ends always pass.
pub fn check_validity_window(
    active_from: Option<DateTime<Utc>>,
    active_until: Option<DateTime<Utc>>,
) -> CoreResult<()> {
    match (active_from, active_until) {
        (Some(from), Some(until)) if until <= from => Err(CoreError::InvalidValidityWindow),
        _ => Ok(()),
    }
}
