//! # Combo Repository
//!
//! Database operations for combos and their items.
//!
//! ## Write Transactions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(combo, items)          update(combo, changes)                  │
//! │       │                              │                                  │
//! │       ▼                              ▼                                  │
//! │  BEGIN                          BEGIN                                  │
//! │  INSERT combos                  UPDATE combos                          │
//! │  INSERT combo_items × n         DELETE combo_items (removed rows)      │
//! │  COMMIT                         UPDATE combo_items (new quantities)    │
//! │                                 INSERT combo_items (new products)      │
//! │                                 COMMIT                                 │
//! │                                                                         │
//! │  Any failure rolls everything back: a combo never ends up half-written │
//! │  or without items.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use crate::repository::product::ProductRepository;
use comanda_core::combo::ItemChanges;
use comanda_core::payload::ComboItemInput;
use comanda_core::validation::name_key;
use comanda_core::{Combo, ComboItem, ComboItemDetail, Money};

const COMBO_COLUMNS: &str = "id, name, description, price, original_price, category_id, \
    image_url, is_available, is_featured, active_from, active_until, tags, created_at, updated_at";

/// Raw `combos` row; tags still JSON-wrapped.
#[derive(Debug, FromRow)]
struct ComboRow {
    id: String,
    name: String,
    description: Option<String>,
    price: Money,
    original_price: Option<Money>,
    category_id: Option<String>,
    image_url: Option<String>,
    is_available: bool,
    is_featured: bool,
    active_from: Option<DateTime<Utc>>,
    active_until: Option<DateTime<Utc>>,
    tags: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ComboRow> for Combo {
    fn from(row: ComboRow) -> Self {
        Combo {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            original_price: row.original_price,
            category_id: row.category_id,
            image_url: row.image_url,
            is_available: row.is_available,
            is_featured: row.is_featured,
            active_from: row.active_from,
            active_until: row.active_until,
            tags: row.tags.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for combo database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.combos();
///
/// repo.create(&combo, &items).await?;
/// let lines = repo.item_details(&combo.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ComboRepository {
    pool: SqlitePool,
}

impl ComboRepository {
    /// Creates a new ComboRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ComboRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists every combo, newest first.
    pub async fn list(&self) -> DbResult<Vec<Combo>> {
        let rows: Vec<ComboRow> = sqlx::query_as(&format!(
            "SELECT {COMBO_COLUMNS} FROM combos ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Combo::from).collect())
    }

    /// Gets a combo by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Combo>> {
        let row: Option<ComboRow> =
            sqlx::query_as(&format!("SELECT {COMBO_COLUMNS} FROM combos WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Combo::from))
    }

    /// Finds a combo by name, ignoring case (Unicode folding).
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Combo>> {
        let row: Option<ComboRow> = sqlx::query_as(&format!(
            "SELECT {COMBO_COLUMNS} FROM combos WHERE name_key = ?1"
        ))
        .bind(name_key(name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Combo::from))
    }

    /// Item rows of a combo, in insertion order.
    pub async fn items(&self, combo_id: &str) -> DbResult<Vec<ComboItem>> {
        let items = sqlx::query_as::<_, ComboItem>(
            r#"
            SELECT id, combo_id, product_id, quantity
            FROM combo_items
            WHERE combo_id = ?1
            ORDER BY rowid ASC
            "#,
        )
        .bind(combo_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Item rows with their products expanded.
    pub async fn item_details(&self, combo_id: &str) -> DbResult<Vec<ComboItemDetail>> {
        let items = self.items(combo_id).await?;
        let ids: Vec<&str> = items.iter().map(|item| item.product_id.as_str()).collect();
        let products = ProductRepository::new(self.pool.clone())
            .get_many(&ids)
            .await?;

        let mut details = Vec::with_capacity(items.len());
        for item in items {
            // RESTRICT on product_id keeps every referenced product alive
            let product = products
                .iter()
                .find(|p| p.id == item.product_id)
                .cloned()
                .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;
            details.push(ComboItemDetail { item, product });
        }

        Ok(details)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a combo and its items in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name taken, or a product repeated
    /// * `Err(DbError::ForeignKeyViolation)` - unknown category or product
    pub async fn create(&self, combo: &Combo, items: &[ComboItemInput]) -> DbResult<()> {
        debug!(id = %combo.id, name = %combo.name, items = items.len(), "Creating combo");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO combos (
                id, name, description, price, original_price,
                category_id, image_url, is_available, is_featured,
                active_from, active_until, tags, created_at, updated_at,
                name_key
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14,
                ?15
            )
            "#,
        )
        .bind(&combo.id)
        .bind(&combo.name)
        .bind(&combo.description)
        .bind(combo.price)
        .bind(combo.original_price)
        .bind(&combo.category_id)
        .bind(&combo.image_url)
        .bind(combo.is_available)
        .bind(combo.is_featured)
        .bind(combo.active_from)
        .bind(combo.active_until)
        .bind(Json(&combo.tags))
        .bind(combo.created_at)
        .bind(combo.updated_at)
        .bind(name_key(&combo.name))
        .execute(&mut *tx)
        .await?;

        for item in items {
            insert_item(&mut tx, &combo.id, item).await?;
        }

        tx.commit().await?;

        info!(id = %combo.id, "Combo created");
        Ok(())
    }

    /// Writes every mutable column of a combo and applies `changes` to its
    /// items, in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - combo doesn't exist
    pub async fn update(&self, combo: &Combo, changes: Option<&ItemChanges>) -> DbResult<()> {
        debug!(
            id = %combo.id,
            item_changes = changes.is_some_and(|c| !c.is_empty()),
            "Updating combo"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE combos SET
                name = ?2,
                description = ?3,
                price = ?4,
                original_price = ?5,
                category_id = ?6,
                image_url = ?7,
                is_available = ?8,
                is_featured = ?9,
                active_from = ?10,
                active_until = ?11,
                tags = ?12,
                updated_at = ?13,
                name_key = ?14
            WHERE id = ?1
            "#,
        )
        .bind(&combo.id)
        .bind(&combo.name)
        .bind(&combo.description)
        .bind(combo.price)
        .bind(combo.original_price)
        .bind(&combo.category_id)
        .bind(&combo.image_url)
        .bind(combo.is_available)
        .bind(combo.is_featured)
        .bind(combo.active_from)
        .bind(combo.active_until)
        .bind(Json(&combo.tags))
        .bind(combo.updated_at)
        .bind(name_key(&combo.name))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Combo", &combo.id));
        }

        if let Some(changes) = changes {
            for row_id in &changes.remove {
                sqlx::query("DELETE FROM combo_items WHERE id = ?1 AND combo_id = ?2")
                    .bind(row_id)
                    .bind(&combo.id)
                    .execute(&mut *tx)
                    .await?;
            }

            for (row_id, quantity) in &changes.update {
                sqlx::query("UPDATE combo_items SET quantity = ?2 WHERE id = ?1 AND combo_id = ?3")
                    .bind(row_id)
                    .bind(quantity)
                    .bind(&combo.id)
                    .execute(&mut *tx)
                    .await?;
            }

            for item in &changes.insert {
                insert_item(&mut tx, &combo.id, item).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a combo's items, then the combo, in one transaction.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting combo");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM combo_items WHERE combo_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM combos WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Combo", id));
        }

        tx.commit().await?;

        info!(id = %id, "Combo deleted");
        Ok(())
    }
}

async fn insert_item(
    tx: &mut Transaction<'_, Sqlite>,
    combo_id: &str,
    item: &ComboItemInput,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO combo_items (id, combo_id, product_id, quantity)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(generate_id())
    .bind(combo_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
