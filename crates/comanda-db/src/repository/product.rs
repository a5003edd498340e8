//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Filtered, paged listing
//! - CRUD operations
//! - Batch loads for combo items
//!
//! ## Listing Filters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /products?search=bacon&tags=spicy,vegan&onSale=true&page=2        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE 1 = 1                                                           │
//! │    AND sale_price IS NOT NULL                         (onSale)         │
//! │    AND (search_key LIKE '%bacon%'                                      │
//! │         OR 'bacon' ∈ tags)                            (search)         │
//! │    AND tags ∩ {spicy, vegan} ≠ ∅                      (tags)           │
//! │  ORDER BY created_at DESC, rowid DESC                                  │
//! │  LIMIT 10 OFFSET 10                                                    │
//! │                                                                         │
//! │  The same WHERE feeds a COUNT(*) for the pagination block.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::payload::ProductFilter;
use comanda_core::validation::{name_key, search_key};
use comanda_core::{Money, Product};

/// Columns selected for a [`Product`], in [`ProductRow`] order.
pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, price, sale_price, \
    category_id, image_url, is_available, ingredients, serving, tags, nutritional_info, \
    created_at, updated_at";

/// Raw `products` row; JSON columns still wrapped.
#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    price: Money,
    sale_price: Option<Money>,
    category_id: Option<String>,
    image_url: Option<String>,
    is_available: bool,
    ingredients: Json<Vec<String>>,
    serving: Option<i64>,
    tags: Json<Vec<String>>,
    nutritional_info: Option<Json<Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            sale_price: row.sale_price,
            category_id: row.category_id,
            image_url: row.image_url,
            is_available: row.is_available,
            ingredients: row.ingredients.0,
            serving: row.serving,
            tags: row.tags.0,
            nutritional_info: row.nutritional_info.map(|json| json.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Escapes `%`, `_` and `\` for a LIKE pattern using `ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Appends the WHERE clause shared by the page query and its count.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(category_id) = &filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id.clone());
    }

    if let Some(is_available) = filter.is_available {
        qb.push(" AND is_available = ").push_bind(is_available);
    }

    match filter.on_sale {
        Some(true) => {
            qb.push(" AND sale_price IS NOT NULL");
        }
        Some(false) => {
            qb.push(" AND sale_price IS NULL");
        }
        None => {}
    }

    if let Some(search) = &filter.search {
        // search_key is name + description, already case-folded
        let pattern = format!("%{}%", escape_like(&name_key(search)));
        qb.push(" AND (search_key LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\' OR EXISTS (SELECT 1 FROM json_each(products.tags) WHERE json_each.value = ")
            .push_bind(search.clone())
            .push("))");
    }

    if !filter.tags.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM json_each(products.tags) WHERE json_each.value IN (");
        let mut values = qb.separated(", ");
        for tag in &filter.tags {
            values.push_bind(tag.clone());
        }
        qb.push("))");
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let (page, total) = repo.list(&filter).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists one page of products matching `filter`, newest first.
    ///
    /// ## Returns
    /// `(page, total)` where `total` counts every match across pages.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<(Vec<Product>, i64)> {
        debug!(
            page = filter.page,
            limit = filter.limit,
            search = ?filter.search,
            "Listing products"
        );

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let offset = i64::from(filter.page.saturating_sub(1)) * i64::from(filter.limit);

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        debug!(count = rows.len(), total, "Listing returned products");
        Ok((rows.into_iter().map(Product::from).collect(), total))
    }

    /// Lists the available products of one category, newest first.
    pub async fn list_available_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE category_id = ?1 AND is_available = 1 \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    /// Finds a product by name, ignoring case (Unicode folding).
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name_key = ?1"
        ))
        .bind(name_key(name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Loads several products at once. Unknown IDs are skipped.
    pub async fn get_many(&self, ids: &[&str]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb =
            QueryBuilder::<Sqlite>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
        let mut values = qb.separated(", ");
        for id in ids {
            values.push_bind(id.to_string());
        }
        qb.push(")");

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Number of combos listing a product.
    pub async fn count_combo_usages(&self, id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT combo_id) FROM combo_items WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already taken (any case)
    /// * `Err(DbError::ForeignKeyViolation)` - category vanished
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price, sale_price,
                category_id, image_url, is_available, ingredients, serving,
                tags, nutritional_info, created_at, updated_at,
                name_key, search_key
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14,
                ?15, ?16
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.sale_price)
        .bind(&product.category_id)
        .bind(&product.image_url)
        .bind(product.is_available)
        .bind(Json(&product.ingredients))
        .bind(product.serving)
        .bind(Json(&product.tags))
        .bind(product.nutritional_info.as_ref().map(Json))
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(name_key(&product.name))
        .bind(search_key(&product.name, product.description.as_deref()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes every mutable column of a product.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price = ?4,
                sale_price = ?5,
                category_id = ?6,
                image_url = ?7,
                is_available = ?8,
                ingredients = ?9,
                serving = ?10,
                tags = ?11,
                nutritional_info = ?12,
                updated_at = ?13,
                name_key = ?14,
                search_key = ?15
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.sale_price)
        .bind(&product.category_id)
        .bind(&product.image_url)
        .bind(product.is_available)
        .bind(Json(&product.ingredients))
        .bind(product.serving)
        .bind(Json(&product.tags))
        .bind(product.nutritional_info.as_ref().map(Json))
        .bind(product.updated_at)
        .bind(name_key(&product.name))
        .bind(search_key(&product.name, product.description.as_deref()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - a combo still lists it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{category, product, test_db};
    use serde_json::json;

    fn filter() -> ProductFilter {
        ProductFilter::default()
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[tokio::test]
    async fn test_json_columns_round_trip() {
        let db = test_db().await;
        let repo = db.products();

        let mut burger = product("X-Bacon", 2990, None);
        burger.tags = vec!["burger".into(), "bacon".into()];
        burger.ingredients = vec!["bun".into()];
        burger.nutritional_info = Some(json!({"calories": 780}));
        burger.sale_price = Some(Money::from_cents(2490));
        repo.insert(&burger).await.unwrap();

        let stored = repo.get_by_id(&burger.id).await.unwrap().unwrap();
        assert_eq!(stored.tags, burger.tags);
        assert_eq!(stored.ingredients, burger.ingredients);
        assert_eq!(stored.nutritional_info, burger.nutritional_info);
        assert_eq!(stored.sale_price, Some(Money::from_cents(2490)));
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let db = test_db().await;
        let repo = db.products();

        let mut a = product("Veggie Burger", 2500, None);
        a.tags = vec!["vegan".into()];
        let mut b = product("Spicy Wings", 1800, None);
        b.tags = vec!["spicy".into()];
        b.sale_price = Some(Money::from_cents(1500));
        let mut c = product("Lemonade", 700, None);
        c.is_available = false;
        c.description = Some("Fresh squeezed, no burger".into());
        for p in [&a, &b, &c] {
            repo.insert(p).await.unwrap();
        }

        let (all, total) = repo.list(&filter()).await.unwrap();
        assert_eq!(total, 3);
        // Newest first
        assert_eq!(all[0].name, "Lemonade");

        let (on_sale, _) = repo
            .list(&ProductFilter { on_sale: Some(true), ..filter() })
            .await
            .unwrap();
        assert_eq!(on_sale.len(), 1);
        assert_eq!(on_sale[0].id, b.id);

        let (search, total) = repo
            .list(&ProductFilter { search: Some("BURGER".into()), ..filter() })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert!(search.iter().all(|p| p.id == a.id || p.id == c.id));

        let (by_tag, _) = repo
            .list(&ProductFilter {
                tags: vec!["spicy".into(), "keto".into()],
                ..filter()
            })
            .await
            .unwrap();
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].id, b.id);

        let (page, total) = repo
            .list(&ProductFilter { page: 2, limit: 2, ..filter() })
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Veggie Burger");

        let (available, _) = repo
            .list(&ProductFilter { is_available: Some(false), ..filter() })
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
    }

    #[tokio::test]
    async fn test_by_category_and_existence_checks() {
        let db = test_db().await;
        let drinks = category("Drinks");
        db.categories().insert(&drinks).await.unwrap();

        let repo = db.products();
        let cola = product("Cola", 600, Some(&drinks.id));
        let mut tea = product("Iced Tea", 650, Some(&drinks.id));
        tea.is_available = false;
        repo.insert(&cola).await.unwrap();
        repo.insert(&tea).await.unwrap();

        let listed = repo.list_available_by_category(&drinks.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, cola.id);

        assert_eq!(repo.get_many(&[&cola.id, &tea.id]).await.unwrap().len(), 2);
        assert_eq!(repo.get_many(&[&cola.id, "ghost"]).await.unwrap().len(), 1);
        assert!(repo.get_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_name_unique_ignoring_case() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("Fries", 900, None)).await.unwrap();
        assert!(repo.find_by_name("FRIES").await.unwrap().is_some());

        let err = repo.insert(&product("fries", 900, None)).await.unwrap_err();
        assert!(err.is_unique_violation_on("products"));
    }

    #[tokio::test]
    async fn test_name_and_search_fold_non_ascii() {
        let db = test_db().await;
        let repo = db.products();

        let mut snack = product("Pão de Queijo", 800, None);
        snack.description = Some("Queijo MINEIRO curado".into());
        repo.insert(&snack).await.unwrap();

        assert!(repo.find_by_name("PÃO DE QUEIJO").await.unwrap().is_some());
        let err = repo.insert(&product("PÃO DE QUEIJO", 800, None)).await.unwrap_err();
        assert!(err.is_unique_violation_on("products"));

        for term in ["PÃO", "mineiro", "DE QUEIJO"] {
            let (found, total) = repo
                .list(&ProductFilter { search: Some(term.into()), ..filter() })
                .await
                .unwrap();
            assert_eq!(total, 1, "search {term}");
            assert_eq!(found[0].id, snack.id);
        }

        // Description edits are searchable after an update
        snack.description = Some("Com GOIABADA".into());
        repo.update(&snack).await.unwrap();
        let (found, _) = repo
            .list(&ProductFilter { search: Some("goiabada".into()), ..filter() })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let repo = db.products();

        let mut fries = product("Fries", 900, None);
        repo.insert(&fries).await.unwrap();

        fries.price = Money::from_cents(1100);
        fries.tags = vec!["side".into()];
        repo.update(&fries).await.unwrap();
        let stored = repo.get_by_id(&fries.id).await.unwrap().unwrap();
        assert_eq!(stored.price.cents(), 1100);
        assert_eq!(stored.tags, vec!["side"]);

        repo.delete(&fries.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(matches!(
            repo.update(&fries).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
