//! Category service.
//!
//! Unique names (ignoring case) and the "no products left" rule on delete.

use chrono::Utc;
use tracing::info;

use comanda_core::payload::{CreateCategory, UpdateCategory};
use comanda_core::pricing::merge_nullable;
use comanda_core::validation::name_key;
use comanda_core::{Category, CategoryDetail, CategorySummary, CoreError};
use comanda_db::{generate_id, Database};

use crate::error::ApiResult;

pub struct CategoryService {
    db: Database,
}

impl CategoryService {
    pub fn new(db: Database) -> Self {
        CategoryService { db }
    }

    pub async fn create(&self, payload: CreateCategory) -> ApiResult<Category> {
        let payload = payload.validate()?;

        self.ensure_name_free(&payload.name, None).await?;

        let now = Utc::now();
        let category = Category {
            id: generate_id(),
            name: payload.name,
            description: payload.description,
            created_at: now,
            updated_at: now,
        };
        self.db.categories().insert(&category).await?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn find_all(&self) -> ApiResult<Vec<CategorySummary>> {
        Ok(self.db.categories().list_with_counts().await?)
    }

    /// One category with its available products and total product count.
    pub async fn find_one(&self, id: &str) -> ApiResult<CategoryDetail> {
        let category = self.get(id).await?;
        let products = self.db.products().list_available_by_category(id).await?;
        let product_count = self.db.categories().count_products(id).await?;

        Ok(CategoryDetail {
            category,
            products,
            product_count,
        })
    }

    pub async fn update(&self, id: &str, patch: UpdateCategory) -> ApiResult<Category> {
        let mut category = self.get(id).await?;
        let patch = patch.validate()?;

        if let Some(name) = patch.name {
            if name_key(&name) != name_key(&category.name) {
                self.ensure_name_free(&name, Some(id)).await?;
            }
            category.name = name;
        }
        category.description = merge_nullable(patch.description, category.description);
        category.updated_at = Utc::now();

        self.db.categories().update(&category).await?;

        info!(id = %category.id, "Category updated");
        Ok(category)
    }

    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        self.get(id).await?;

        let count = self.db.categories().count_products(id).await?;
        if count > 0 {
            return Err(CoreError::HasDependents {
                entity: "category",
                dependents: "products",
                count,
            }
            .into());
        }

        self.db.categories().delete(id).await?;

        info!(id = %id, "Category removed");
        Ok(())
    }

    /// 404 unless the category exists.
    pub async fn ensure_exists(&self, id: &str) -> ApiResult<()> {
        self.get(id).await.map(drop)
    }

    async fn get(&self, id: &str) -> ApiResult<Category> {
        self.db
            .categories()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Category", id).into())
    }

    async fn ensure_name_free(&self, name: &str, except_id: Option<&str>) -> ApiResult<()> {
        match self.db.categories().find_by_name(name).await? {
            Some(existing) if Some(existing.id.as_str()) != except_id => Err(CoreError::Conflict {
                entity: "category",
                field: "name",
            }
            .into()),
            _ => Ok(()),
        }
    }
}
