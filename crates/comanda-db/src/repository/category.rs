//! # Category Repository
//!
//! Database operations for categories.
//!
//! ## Deletion Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DELETE FROM categories WHERE id = ?                                   │
//! │                                                                         │
//! │  products.category_id ── ON DELETE RESTRICT ──► blocked while any      │
//! │                                                  product references it │
//! │  combos.category_id   ── ON DELETE SET NULL ──► combo survives,        │
//! │                                                  category cleared      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::validation::name_key;
use comanda_core::{Category, CategorySummary};

/// Category plus its product count, as selected by the listing query.
#[derive(Debug, FromRow)]
struct CategoryCountRow {
    #[sqlx(flatten)]
    category: Category,
    product_count: i64,
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists every category sorted by name, with product counts.
    pub async fn list_with_counts(&self) -> DbResult<Vec<CategorySummary>> {
        let rows: Vec<CategoryCountRow> = sqlx::query_as(
            r#"
            SELECT
                c.id,
                c.name,
                c.description,
                c.created_at,
                c.updated_at,
                (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS product_count
            FROM categories c
            ORDER BY c.name_key ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CategorySummary {
                category: row.category,
                product_count: row.product_count,
            })
            .collect())
    }

    /// Gets a category by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Finds a category by name, ignoring case (Unicode folding).
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            WHERE name_key = ?1
            "#,
        )
        .bind(name_key(name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Checks whether a category exists.
    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Number of products referencing a category.
    pub async fn count_products(&self, id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already taken (any case)
    pub async fn insert(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, name_key, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(name_key(&category.name))
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes every mutable column of a category.
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, "Updating category");

        let result = sqlx::query(
            r#"
            UPDATE categories SET
                name = ?2,
                name_key = ?3,
                description = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(name_key(&category.name))
        .bind(&category.description)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(())
    }

    /// Deletes a category.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - products still reference it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
