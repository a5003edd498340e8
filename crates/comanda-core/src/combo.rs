//! # Combo Composition
//!
//! Turns a requested item list into the minimal set of row changes against
//! what is stored.
//!
//! ## Item Set Diff
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stored:   burger ×1   fries ×1   soda ×1                              │
//! │  desired:  burger ×1   fries ×2              shake ×1                  │
//! │                                                                         │
//! │  burger  same quantity   → untouched (row id kept)                     │
//! │  fries   quantity 1 → 2  → update                                      │
//! │  soda    not desired     → remove                                      │
//! │  shake   not stored      → insert                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items are keyed by product id: a product appears at most once per combo.

use std::collections::{HashMap, HashSet};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::payload::ComboItemInput;
use crate::types::{ComboItem, ComboItemDetail};

/// Row changes needed to turn the stored item set into the desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    /// Row ids to delete.
    pub remove: Vec<String>,
    /// `(row id, new quantity)`.
    pub update: Vec<(String, i64)>,
    /// New lines.
    pub insert: Vec<ComboItemInput>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.update.is_empty() && self.insert.is_empty()
    }
}

/// Diffs `desired` against `current`.
///
/// Callers reject repeated product ids before this point; if one slips
/// through, the last occurrence wins.
///
/// ## Example
/// ```rust
/// use comanda_core::combo::plan_item_changes;
/// use comanda_core::payload::ComboItemInput;
/// use comanda_core::types::ComboItem;
///
/// let current = vec![ComboItem {
///     id: "row-1".into(),
///     combo_id: "c1".into(),
///     product_id: "fries".into(),
///     quantity: 1,
/// }];
/// let desired = vec![ComboItemInput { product_id: "fries".into(), quantity: 2 }];
///
/// let changes = plan_item_changes(&current, &desired);
/// assert_eq!(changes.update, vec![("row-1".to_string(), 2)]);
/// assert!(changes.remove.is_empty() && changes.insert.is_empty());
/// ```
pub fn plan_item_changes(current: &[ComboItem], desired: &[ComboItemInput]) -> ItemChanges {
    let mut wanted: HashMap<&str, i64> = HashMap::with_capacity(desired.len());
    for item in desired {
        wanted.insert(item.product_id.as_str(), item.quantity);
    }

    let mut changes = ItemChanges::default();
    let mut stored: HashSet<&str> = HashSet::with_capacity(current.len());

    for row in current {
        stored.insert(row.product_id.as_str());
        match wanted.get(row.product_id.as_str()) {
            None => changes.remove.push(row.id.clone()),
            Some(&qty) if qty != row.quantity => changes.update.push((row.id.clone(), qty)),
            Some(_) => {}
        }
    }

    // Keep request order for inserts, one per product
    let mut queued: HashSet<&str> = HashSet::new();
    for item in desired.iter().rev() {
        let pid = item.product_id.as_str();
        if stored.contains(pid) || !queued.insert(pid) {
            continue;
        }
        changes.insert.push(ComboItemInput {
            product_id: item.product_id.clone(),
            quantity: wanted[pid],
        });
    }
    changes.insert.reverse();

    changes
}

/// Distinct product ids of a request, in first-seen order.
pub fn distinct_product_ids(items: &[ComboItemInput]) -> Vec<&str> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(items.len());
    items
        .iter()
        .map(|item| item.product_id.as_str())
        .filter(|pid| seen.insert(*pid))
        .collect()
}

/// Σ price × quantity over `(price, quantity)` lines.
///
/// ## Returns
/// * `Err(CoreError::ItemsTotalOverflow)` - a line or the sum leaves the
///   `i64` cent range
pub fn checked_total<I>(lines: I) -> CoreResult<Money>
where
    I: IntoIterator<Item = (Money, i64)>,
{
    lines
        .into_iter()
        .try_fold(Money::zero(), |total, (price, quantity)| {
            total.checked_add(price.checked_multiply_quantity(quantity)?)
        })
        .ok_or(CoreError::ItemsTotalOverflow)
}

/// Regular price of the parts (Σ product.price × quantity).
pub fn items_total(items: &[ComboItemDetail]) -> CoreResult<Money> {
    items
        .iter()
        .try_fold(Money::zero(), |total, detail| total.checked_add(detail.line_total()?))
        .ok_or(CoreError::ItemsTotalOverflow)
}
