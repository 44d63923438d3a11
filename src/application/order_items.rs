use std::sync::Arc;

use tracing::info;

use crate::application::{
    error::ServiceError,
    fields::apply_non_negative,
    repos::{CreateOrderItemParams, OrderItemsRepo, OrdersRepo, ProductsRepo},
};
use crate::cache::{CacheKey, CacheStore, EntityKind};
use crate::domain::{entities::OrderItemRecord, error::ensure_positive};

#[derive(Debug, Clone, Copy)]
pub struct CreateOrderItemCommand {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// An item stays on the order it was created for; `order_id` may only repeat it.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOrderItemCommand {
    pub order_id: Option<i64>,
    pub product_id: Option<i64>,
    pub quantity: Option<i32>,
}

#[derive(Clone)]
pub struct OrderItemService {
    repo: Arc<dyn OrderItemsRepo>,
    orders: Arc<dyn OrdersRepo>,
    products: Arc<dyn ProductsRepo>,
    cache: Arc<CacheStore>,
}

impl OrderItemService {
    pub fn new(
        repo: Arc<dyn OrderItemsRepo>,
        orders: Arc<dyn OrdersRepo>,
        products: Arc<dyn ProductsRepo>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            repo,
            orders,
            products,
            cache,
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<OrderItemRecord>, ServiceError> {
        Ok(self
            .cache
            .order_items
            .load(CacheKey::id(EntityKind::OrderItem, id), || {
                self.repo.find_order_item(id)
            })
            .await?)
    }

    /// Items of one order, cached as `order:{id}:items`.
    pub async fn find_by_order_id(
        &self,
        order_id: i64,
    ) -> Result<Vec<OrderItemRecord>, ServiceError> {
        let key = CacheKey::children(EntityKind::OrderItem, EntityKind::Order, order_id);
        Ok(self
            .cache
            .order_items
            .load_list(key, || self.repo.list_items_for_order(order_id))
            .await?)
    }

    /// Items referencing one product, cached as `product:{id}:items`.
    pub async fn find_by_product_id(
        &self,
        product_id: i64,
    ) -> Result<Vec<OrderItemRecord>, ServiceError> {
        let key = CacheKey::children(EntityKind::OrderItem, EntityKind::Product, product_id);
        Ok(self
            .cache
            .order_items
            .load_list(key, || self.repo.list_items_for_product(product_id))
            .await?)
    }

    pub async fn create(
        &self,
        command: CreateOrderItemCommand,
    ) -> Result<OrderItemRecord, ServiceError> {
        if self.orders.find_order(command.order_id).await?.is_none() {
            return Err(ServiceError::not_found("order", command.order_id));
        }
        self.ensure_product(command.product_id).await?;
        ensure_positive("quantity", command.quantity)?;

        let item = self
            .repo
            .create_order_item(CreateOrderItemParams {
                order_id: command.order_id,
                product_id: command.product_id,
                quantity: command.quantity,
            })
            .await?;
        self.cache.record_created(EntityKind::OrderItem);

        info!(
            target = "application::order_items::create",
            order_item_id = item.id,
            order_id = item.order_id,
            "order item created"
        );
        Ok(item)
    }

    pub async fn update(
        &self,
        id: i64,
        command: UpdateOrderItemCommand,
    ) -> Result<OrderItemRecord, ServiceError> {
        let mut item = self
            .repo
            .find_order_item(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order item", id))?;

        if let Some(product_id) = command.product_id
            && product_id != item.product_id
        {
            self.ensure_product(product_id).await?;
            item.product_id = product_id;
        }
        if command
            .order_id
            .is_some_and(|order_id| order_id != item.order_id)
        {
            return Err(ServiceError::ConstraintViolation("order cannot change"));
        }
        apply_non_negative(&mut item.quantity, command.quantity);

        self.repo.save_order_item(&item).await?;
        self.cache.record_updated(EntityKind::OrderItem, id);

        info!(
            target = "application::order_items::update",
            order_item_id = id,
            "order item updated"
        );
        Ok(item)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete_order_item(id).await? {
            return Err(ServiceError::not_found("order item", id));
        }
        self.cache.record_deleted(EntityKind::OrderItem, id);

        info!(
            target = "application::order_items::delete",
            order_item_id = id,
            "order item deleted"
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
