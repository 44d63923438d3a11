use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;

use crate::application::{
    error::ServiceError,
    fields::apply_non_negative,
    repos::{CreateInventoryParams, InventoryRepo, ProductsRepo},
};
use crate::cache::{CacheKey, CacheStore, EntityKind};
use crate::domain::{entities::InventoryRecord, error::ensure_non_negative};

#[derive(Debug, Clone, Copy)]
pub struct CreateInventoryCommand {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateInventoryCommand {
    pub product_id: Option<i64>,
    /// Negative values keep the stored quantity.
    pub quantity: Option<i32>,
}

#[derive(Clone)]
pub struct InventoryService {
    repo: Arc<dyn InventoryRepo>,
    products: Arc<dyn ProductsRepo>,
    cache: Arc<CacheStore>,
}

impl InventoryService {
    pub fn new(
        repo: Arc<dyn InventoryRepo>,
        products: Arc<dyn ProductsRepo>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            repo,
            products,
            cache,
        }
    }

    pub async fn find_all(&self) -> Result<Vec<InventoryRecord>, ServiceError> {
        Ok(self
            .cache
            .inventory
            .load_list(CacheKey::collection(EntityKind::Inventory), || {
                self.repo.list_inventory()
            })
            .await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<InventoryRecord>, ServiceError> {
        Ok(self
            .cache
            .inventory
            .load(CacheKey::id(EntityKind::Inventory, id), || {
                self.repo.find_inventory(id)
            })
            .await?)
    }

    pub async fn create(
        &self,
        command: CreateInventoryCommand,
    ) -> Result<InventoryRecord, ServiceError> {
        self.ensure_product(command.product_id).await?;
        ensure_non_negative("quantity", command.quantity)?;

        let inventory = self
            .repo
            .create_inventory(CreateInventoryParams {
                product_id: command.product_id,
                quantity: command.quantity,
            })
            .await?;
        self.cache.record_created(EntityKind::Inventory);

        info!(
            target = "application::inventory::create",
            inventory_id = inventory.id,
            product_id = inventory.product_id,
            "inventory created"
        );
        Ok(inventory)
    }

    pub async fn update(
        &self,
        id: i64,
        command: UpdateInventoryCommand,
    ) -> Result<InventoryRecord, ServiceError> {
        let mut inventory = self
            .repo
            .find_inventory(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("inventory", id))?;

        apply_non_negative(&mut inventory.quantity, command.quantity);
        if let Some(product_id) = command.product_id
            && product_id != inventory.product_id
        {
            self.ensure_product(product_id).await?;
            inventory.product_id = product_id;
        }
        inventory.updated_at = OffsetDateTime::now_utc();

        self.repo.save_inventory(&inventory).await?;
        self.cache.record_updated(EntityKind::Inventory, id);

        info!(
            target = "application::inventory::update",
            inventory_id = id,
            "inventory updated"
        );
        Ok(inventory)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete_inventory(id).await? {
            return Err(ServiceError::not_found("inventory", id));
        }
        self.cache.record_deleted(EntityKind::Inventory, id);

        info!(
            target = "application::inventory::delete",
            inventory_id = id,
            "inventory deleted"
        );
        Ok(())
    }

    async fn ensure_product(&self, product_id: i64) -> Result<(), ServiceError> {
        match self.products.find_product(product_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("product", product_id)),
        }
    }
}
