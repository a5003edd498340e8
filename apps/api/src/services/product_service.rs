//! Product service.
//!
//! ## Update Flow
//! ```text
//! PATCH /products/:id { salePrice: 2490 }
//!      │
//!      ├─ product exists?                        (404)
//!      ├─ patch.validate()                       (400 + field errors)
//!      ├─ merged salePrice < merged price?       (400)
//!      ├─ new categoryId exists?                 (404)
//!      ├─ new name free (ignoring case)?         (409)
//!      ▼
//! write merged row
//! ```

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use comanda_core::payload::{CreateProduct, ProductFilter, ProductQueryParams, UpdateProduct};
use comanda_core::pricing::{check_sale_price, merge_nullable};
use comanda_core::validation::name_key;
use comanda_core::{Category, CoreError, Pagination, Product, ProductWithCategory};
use comanda_db::{generate_id, Database};

use crate::error::ApiResult;

/// One page of the product listing.
#[derive(Debug)]
pub struct ProductPage {
    pub products: Vec<ProductWithCategory>,
    pub pagination: Pagination,
}

pub struct ProductService {
    db: Database,
}

impl ProductService {
    pub fn new(db: Database) -> Self {
        ProductService { db }
    }

    pub async fn create(&self, payload: CreateProduct) -> ApiResult<ProductWithCategory> {
        let payload = payload.validate()?;

        check_sale_price(payload.sale_price, payload.price)?;
        if let Some(category_id) = &payload.category_id {
            self.ensure_category(category_id).await?;
        }
        self.ensure_name_free(&payload.name, None).await?;

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            name: payload.name,
            description: payload.description,
            price: payload.price,
            sale_price: payload.sale_price,
            category_id: payload.category_id,
            image_url: payload.image_url,
            is_available: payload.is_available,
            ingredients: payload.ingredients.unwrap_or_default(),
            serving: payload.serving,
            tags: payload.tags,
            nutritional_info: payload.nutritional_info,
            created_at: now,
            updated_at: now,
        };
        self.db.products().insert(&product).await?;

        info!(id = %product.id, name = %product.name, price = %product.price, "Product created");
        self.with_category(product).await
    }

    pub async fn find_all(&self, params: ProductQueryParams) -> ApiResult<ProductPage> {
        let filter: ProductFilter = params.validate()?;

        let (products, total) = self.db.products().list(&filter).await?;
        let products = self.with_categories(products).await?;

        Ok(ProductPage {
            products,
            pagination: Pagination::new(filter.page, filter.limit, total),
        })
    }

    pub async fn find_by_category(&self, category_id: &str) -> ApiResult<Vec<ProductWithCategory>> {
        self.ensure_category(category_id).await?;

        let products = self
            .db
            .products()
            .list_available_by_category(category_id)
            .await?;
        self.with_categories(products).await
    }

    pub async fn find_one(&self, id: &str) -> ApiResult<ProductWithCategory> {
        let product = self.get(id).await?;
        self.with_category(product).await
    }

    pub async fn update(&self, id: &str, patch: UpdateProduct) -> ApiResult<ProductWithCategory> {
        let mut product = self.get(id).await?;
        let patch = patch.validate()?;

        let price = patch.price.unwrap_or(product.price);
        let sale_price = merge_nullable(patch.sale_price, product.sale_price);
        check_sale_price(sale_price, price)?;

        if let Some(Some(category_id)) = &patch.category_id {
            self.ensure_category(category_id).await?;
        }
        if let Some(name) = &patch.name {
            if name_key(name) != name_key(&product.name) {
                self.ensure_name_free(name, Some(id)).await?;
            }
        }

        if let Some(name) = patch.name {
            product.name = name;
        }
        product.description = merge_nullable(patch.description, product.description);
        product.price = price;
        product.sale_price = sale_price;
        product.category_id = merge_nullable(patch.category_id, product.category_id);
        product.image_url = merge_nullable(patch.image_url, product.image_url);
        if let Some(is_available) = patch.is_available {
            product.is_available = is_available;
        }
        if let Some(ingredients) = patch.ingredients {
            product.ingredients = ingredients.unwrap_or_default();
        }
        product.serving = merge_nullable(patch.serving, product.serving);
        if let Some(tags) = patch.tags {
            product.tags = tags;
        }
        product.nutritional_info = merge_nullable(patch.nutritional_info, product.nutritional_info);
        product.updated_at = Utc::now();

        self.db.products().update(&product).await?;

        info!(id = %product.id, "Product updated");
        self.with_category(product).await
    }

    /// Deletes a product no combo lists.
    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        self.get(id).await?;

        let count = self.db.products().count_combo_usages(id).await?;
        if count > 0 {
            return Err(CoreError::HasDependents {
                entity: "product",
                dependents: "combos",
                count,
            }
            .into());
        }

        self.db.products().delete(id).await?;

        info!(id = %id, "Product removed");
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// 404 unless the product exists.
    pub async fn ensure_exists(&self, id: &str) -> ApiResult<()> {
        self.get(id).await.map(drop)
    }

    async fn get(&self, id: &str) -> ApiResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id).into())
    }

    async fn ensure_category(&self, category_id: &str) -> ApiResult<()> {
        if self.db.categories().exists(category_id).await? {
            Ok(())
        } else {
            Err(CoreError::not_found("Category", category_id).into())
        }
    }

    async fn ensure_name_free(&self, name: &str, except_id: Option<&str>) -> ApiResult<()> {
        match self.db.products().find_by_name(name).await? {
            Some(existing) if Some(existing.id.as_str()) != except_id => Err(CoreError::Conflict {
                entity: "product",
                field: "name",
            }
            .into()),
            _ => Ok(()),
        }
    }

    async fn with_category(&self, product: Product) -> ApiResult<ProductWithCategory> {
        let category = match &product.category_id {
            Some(id) => self.db.categories().get_by_id(id).await?,
            None => None,
        };
        Ok(ProductWithCategory { product, category })
    }

    async fn with_categories(&self, products: Vec<Product>) -> ApiResult<Vec<ProductWithCategory>> {
        let mut categories: HashMap<String, Option<Category>> = HashMap::new();
        let mut expanded = Vec::with_capacity(products.len());

        for product in products {
            let category = match &product.category_id {
                Some(id) => {
                    if !categories.contains_key(id) {
                        let found = self.db.categories().get_by_id(id).await?;
                        categories.insert(id.clone(), found);
                    }
                    categories.get(id).cloned().flatten()
                }
                None => None,
            };
            expanded.push(ProductWithCategory { product, category });
        }

        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::services::test_support::test_db;
    use crate::services::CategoryService;
    use comanda_core::payload::CreateCategory;
    use comanda_core::Money;

    fn create(name: &str, price: i64, sale: Option<i64>) -> CreateProduct {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "price": price,
            "salePrice": sale,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_sale_price_must_undercut_price() {
        let service = ProductService::new(test_db().await);

        let err = service.create(create("X", 1000, Some(1200))).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let fries = service.create(create("Fries", 1000, Some(800))).await.unwrap();

        // Raising the sale price above the stored price fails on merge
        let patch = UpdateProduct {
            sale_price: Some(Some(Money::from_cents(1100))),
            ..Default::default()
        };
        let err = service.update(&fries.product.id, patch).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        // Lowering the price under the stored sale price fails too
        let patch = UpdateProduct {
            price: Some(Money::from_cents(700)),
            ..Default::default()
        };
        assert!(service.update(&fries.product.id, patch).await.is_err());

        // Clearing the sale price is always allowed
        let patch = UpdateProduct {
            price: Some(Money::from_cents(700)),
            sale_price: Some(None),
            ..Default::default()
        };
        let updated = service.update(&fries.product.id, patch).await.unwrap();
        assert_eq!(updated.product.sale_price, None);
        assert_eq!(updated.product.price.cents(), 700);
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let service = ProductService::new(test_db().await);

        let mut payload = create("Cola", 600, None);
        payload.category_id = Some("missing".to_string());
        assert!(matches!(
            service.create(payload).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.find_by_category("missing").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_name_ignoring_case() {
        let service = ProductService::new(test_db().await);
        service.create(create("Milkshake", 1500, None)).await.unwrap();

        let err = service.create(create("MILKSHAKE", 1500, None)).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_name_folds_non_ascii() {
        let service = ProductService::new(test_db().await);
        let snack = service.create(create("Pão de Queijo", 800, None)).await.unwrap();

        let err = service
            .create(create("PÃO DE QUEIJO", 800, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // Re-casing its own name is not a conflict
        let patch = UpdateProduct {
            name: Some("PÃO DE QUEIJO".to_string()),
            ..Default::default()
        };
        let updated = service.update(&snack.product.id, patch).await.unwrap();
        assert_eq!(updated.product.name, "PÃO DE QUEIJO");
    }

    #[tokio::test]
    async fn test_list_expands_category() {
        let db = test_db().await;
        let drinks = CategoryService::new(db.clone())
            .create(CreateCategory {
                name: "Drinks".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let service = ProductService::new(db);

        let mut cola = create("Cola", 600, None);
        cola.category_id = Some(drinks.id.clone());
        service.create(cola).await.unwrap();
        service.create(create("Fries", 900, None)).await.unwrap();

        let page = service.find_all(ProductQueryParams::default()).await.unwrap();
        assert_eq!(page.pagination.total, 2);
        let cola = page
            .products
            .iter()
            .find(|p| p.product.name == "Cola")
            .unwrap();
        assert_eq!(cola.category.as_ref().unwrap().name, "Drinks");

        let bad = ProductQueryParams {
            limit: Some("500".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.find_all(bad).await,
            Err(ApiError::Validation(_))
        ));
    }
}
