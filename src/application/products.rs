use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;

use crate::application::{
    error::ServiceError,
    fields::{apply_non_negative, apply_text, optional_text, required_text},
    repos::{CategoriesRepo, CreateProductParams, ProductsRepo},
};
use crate::cache::{CacheKey, CacheStore, EntityKind};
use crate::domain::{entities::ProductRecord, error::ensure_non_negative};

#[derive(Debug, Clone)]
pub struct CreateProductCommand {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category_id: i64,
    pub quantity: i32,
}

/// Empty strings and negative amounts keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductCommand {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub quantity: Option<i32>,
    pub category_id: Option<i64>,
}

#[derive(Clone)]
pub struct ProductService {
    repo: Arc<dyn ProductsRepo>,
    categories: Arc<dyn CategoriesRepo>,
    cache: Arc<CacheStore>,
}

impl ProductService {
    pub fn new(
        repo: Arc<dyn ProductsRepo>,
        categories: Arc<dyn CategoriesRepo>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            repo,
            categories,
            cache,
        }
    }

    pub async fn find_all(&self) -> Result<Vec<ProductRecord>, ServiceError> {
        Ok(self
            .cache
            .products
            .load_list(CacheKey::collection(EntityKind::Product), || {
                self.repo.list_products()
            })
            .await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ProductRecord>, ServiceError> {
        Ok(self
            .cache
            .products
            .load(CacheKey::id(EntityKind::Product, id), || {
                self.repo.find_product(id)
            })
            .await?)
    }

    pub async fn create(&self, command: CreateProductCommand) -> Result<ProductRecord, ServiceError> {
        let name = required_text(command.name, "name")?;
        ensure_non_negative("price_cents", command.price_cents)?;
        ensure_non_negative("quantity", command.quantity)?;
        self.ensure_category(command.category_id).await?;

        let product = self
            .repo
            .create_product(CreateProductParams {
                name,
                description: optional_text(command.description),
                price_cents: command.price_cents,
                category_id: command.category_id,
                quantity: command.quantity,
            })
            .await?;
        self.cache.record_created(EntityKind::Product);

        info!(
            target = "application::products::create",
            product_id = product.id,
            category_id = product.category_id,
            "product created"
        );
        Ok(product)
    }

    pub async fn update(
        &self,
        id: i64,
        command: UpdateProductCommand,
    ) -> Result<ProductRecord, ServiceError> {
        let mut product = self
            .repo
            .find_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", id))?;

        if let Some(category_id) = command.category_id
            && category_id != product.category_id
        {
            self.ensure_category(category_id).await?;
            product.category_id = category_id;
        }
        apply_text(&mut product.name, command.name);
        apply_text(&mut product.description, command.description);
        apply_non_negative(&mut product.price_cents, command.price_cents);
        apply_non_negative(&mut product.quantity, command.quantity);
        product.updated_at = OffsetDateTime::now_utc();

        self.repo.save_product(&product).await?;
        self.cache.record_updated(EntityKind::Product, id);

        info!(
            target = "application::products::update",
            product_id = id,
            "product updated"
        );
        Ok(product)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete_product(id).await? {
            return Err(ServiceError::not_found("product", id));
        }
        self.cache.record_deleted(EntityKind::Product, id);

        info!(
            target = "application::products::delete_by_id",
            product_id = id,
            "product deleted"
        );
        Ok(())
    }

    async fn ensure_category(&self, category_id: i64) -> Result<(), ServiceError> {
        match self.categories.find_category(category_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("category", category_id)),
        }
    }
}
