use std::sync::Arc;

use tracing::info;

use crate::application::{
    error::ServiceError,
    fields::{optional_text, required_text},
    repos::{CategoriesRepo, CreateCategoryParams},
};
use crate::cache::{CacheKey, CacheStore, EntityKind};
use crate::domain::entities::CategoryRecord;

#[derive(Debug, Clone)]
pub struct CreateCategoryCommand {
    pub name: String,
    pub description: String,
}

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoriesRepo>,
    cache: Arc<CacheStore>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoriesRepo>, cache: Arc<CacheStore>) -> Self {
        Self { repo, cache }
    }

    pub async fn find_all(&self) -> Result<Vec<CategoryRecord>, ServiceError> {
        Ok(self
            .cache
            .categories
            .load_list(CacheKey::collection(EntityKind::Category), || {
                self.repo.list_categories()
            })
            .await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<CategoryRecord>, ServiceError> {
        Ok(self
            .cache
            .categories
            .load(CacheKey::id(EntityKind::Category, id), || {
                self.repo.find_category(id)
            })
            .await?)
    }

    pub async fn create(
        &self,
        command: CreateCategoryCommand,
    ) -> Result<CategoryRecord, ServiceError> {
        let category = self
            .repo
            .create_category(CreateCategoryParams {
                name: required_text(command.name, "name")?,
                description: optional_text(command.description),
            })
            .await?;
        self.cache.record_created(EntityKind::Category);

        info!(
            target = "application::categories::create",
            category_id = category.id,
            "category created"
        );
        Ok(category)
    }
}
