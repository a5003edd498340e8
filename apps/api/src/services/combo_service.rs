//! Combo service.
//!
//! Combo composition and price validation.
//!
//! ## Create
//! ```text
//! POST /combos
//!      │
//!      ├─ payload.validate()                   (400 + field errors:
//!      │                                         name ≥ 3, price > 0,
//!      │                                         items ≥ 1, quantity ≥ 1,
//!      │                                         activeFrom < activeUntil)
//!      ├─ price < originalPrice?               (400)
//!      ├─ categoryId exists?                   (404)
//!      ├─ name free (ignoring case)?           (409)
//!      ├─ every productId exists? one SELECT   (400)
//!      ├─ Σ price × quantity fits in cents?    (400)
//!      ▼
//! INSERT combo + items (one transaction)
//! ```
//!
//! ## Update
//! ```text
//! PATCH /combos/:id
//!      │
//!      ├─ combo exists?                                    (404)
//!      ├─ patch.validate()                                 (400)
//!      ├─ merged price < merged originalPrice?             (400)
//!      ├─ merged activeFrom < merged activeUntil?          (400)
//!      ├─ new categoryId exists?                           (404)
//!      ├─ new name free, excluding self?                   (409)
//!      ├─ items present AND non-empty?
//!      │     yes → products exist, total fits? (400)
//!      │           → diff against stored rows
//!      │     no  → item set untouched (`items: []` included)
//!      ▼
//! UPDATE combo + apply item diff (one transaction)
//! ```

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info};

use comanda_core::combo::{checked_total, distinct_product_ids, plan_item_changes};
use comanda_core::payload::{ComboItemInput, CreateCombo, UpdateCombo};
use comanda_core::pricing::{check_combo_pricing, check_validity_window, merge_nullable};
use comanda_core::validation::name_key;
use comanda_core::{Combo, ComboDetail, CoreError, Money};
use comanda_db::{generate_id, Database};

use crate::error::ApiResult;

pub struct ComboService {
    db: Database,
}

impl ComboService {
    pub fn new(db: Database) -> Self {
        ComboService { db }
    }

    pub async fn create(&self, payload: CreateCombo) -> ApiResult<ComboDetail> {
        let payload = payload.validate()?;

        check_combo_pricing(payload.price, payload.original_price)?;
        if let Some(category_id) = &payload.category_id {
            self.ensure_category(category_id).await?;
        }
        self.ensure_name_free(&payload.name, None).await?;
        self.check_item_products(&payload.items).await?;

        let now = Utc::now();
        let combo = Combo {
            id: generate_id(),
            name: payload.name,
            description: payload.description,
            price: payload.price,
            original_price: payload.original_price,
            category_id: payload.category_id,
            image_url: payload.image_url,
            is_available: payload.is_available,
            is_featured: payload.is_featured,
            active_from: payload.active_from,
            active_until: payload.active_until,
            tags: payload.tags,
            created_at: now,
            updated_at: now,
        };
        self.db.combos().create(&combo, &payload.items).await?;

        info!(
            id = %combo.id,
            name = %combo.name,
            price = %combo.price,
            items = payload.items.len(),
            "Combo created"
        );
        self.detail(combo).await
    }

    /// All combos, newest first, without expansion.
    pub async fn find_all(&self) -> ApiResult<Vec<Combo>> {
        Ok(self.db.combos().list().await?)
    }

    pub async fn find_one(&self, id: &str) -> ApiResult<ComboDetail> {
        let combo = self.get(id).await?;
        self.detail(combo).await
    }

    pub async fn update(&self, id: &str, patch: UpdateCombo) -> ApiResult<ComboDetail> {
        let mut combo = self.get(id).await?;
        let patch = patch.validate()?;

        let price = patch.price.unwrap_or(combo.price);
        let original_price = merge_nullable(patch.original_price, combo.original_price);
        check_combo_pricing(price, original_price)?;

        let active_from = merge_nullable(patch.active_from, combo.active_from);
        let active_until = merge_nullable(patch.active_until, combo.active_until);
        check_validity_window(active_from, active_until)?;

        if let Some(Some(category_id)) = &patch.category_id {
            self.ensure_category(category_id).await?;
        }
        if let Some(name) = &patch.name {
            if name_key(name) != name_key(&combo.name) {
                self.ensure_name_free(name, Some(id)).await?;
            }
        }

        let changes = match patch.item_changes() {
            Some(items) => {
                self.check_item_products(items).await?;
                let current = self.db.combos().items(id).await?;
                let changes = plan_item_changes(&current, items);
                debug!(
                    id = %id,
                    remove = changes.remove.len(),
                    update = changes.update.len(),
                    insert = changes.insert.len(),
                    "Planned item changes"
                );
                Some(changes)
            }
            None => None,
        };

        if let Some(name) = patch.name {
            combo.name = name;
        }
        combo.description = merge_nullable(patch.description, combo.description);
        combo.price = price;
        combo.original_price = original_price;
        combo.category_id = merge_nullable(patch.category_id, combo.category_id);
        combo.image_url = merge_nullable(patch.image_url, combo.image_url);
        if let Some(is_available) = patch.is_available {
            combo.is_available = is_available;
        }
        if let Some(is_featured) = patch.is_featured {
            combo.is_featured = is_featured;
        }
        combo.active_from = active_from;
        combo.active_until = active_until;
        if let Some(tags) = patch.tags {
            combo.tags = tags;
        }
        combo.updated_at = Utc::now();

        self.db.combos().update(&combo, changes.as_ref()).await?;

        info!(id = %combo.id, "Combo updated");
        self.detail(combo).await
    }

    /// Deletes the combo's items, then the combo.
    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        self.get(id).await?;
        self.db.combos().delete(id).await?;

        info!(id = %id, "Combo removed");
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// 404 unless the combo exists.
    pub async fn ensure_exists(&self, id: &str) -> ApiResult<()> {
        self.get(id).await.map(drop)
    }

    async fn get(&self, id: &str) -> ApiResult<Combo> {
        self.db
            .combos()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Combo", id).into())
    }

    async fn detail(&self, combo: Combo) -> ApiResult<ComboDetail> {
        let category = match &combo.category_id {
            Some(id) => self.db.categories().get_by_id(id).await?,
            None => None,
        };
        let items = self.db.combos().item_details(&combo.id).await?;

        Ok(ComboDetail::new(combo, category, items, Utc::now())?)
    }

    async fn ensure_category(&self, category_id: &str) -> ApiResult<()> {
        if self.db.categories().exists(category_id).await? {
            Ok(())
        } else {
            Err(CoreError::not_found("Category", category_id).into())
        }
    }

    async fn ensure_name_free(&self, name: &str, except_id: Option<&str>) -> ApiResult<()> {
        match self.db.combos().find_by_name(name).await? {
            Some(existing) if Some(existing.id.as_str()) != except_id => Err(CoreError::Conflict {
                entity: "combo",
                field: "name",
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// Loads the requested products in one query. Repeated ids fail the same
    /// way unknown ids do. The regular price of the set must fit in `Money`.
    async fn check_item_products(&self, items: &[ComboItemInput]) -> ApiResult<()> {
        let ids = distinct_product_ids(items);
        let products = self.db.products().get_many(&ids).await?;

        if ids.len() != items.len() || products.len() != items.len() {
            return Err(CoreError::MissingProducts {
                requested: items.len(),
                found: products.len(),
            }
            .into());
        }

        let prices: HashMap<&str, Money> = products
            .iter()
            .map(|product| (product.id.as_str(), product.price))
            .collect();
        checked_total(items.iter().filter_map(|item| {
            prices
                .get(item.product_id.as_str())
                .map(|&price| (price, item.quantity))
        }))?;

        Ok(())
    }
}
