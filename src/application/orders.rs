use std::sync::Arc;

use tracing::info;

use crate::application::{
    error::ServiceError,
    repos::{CreateOrderParams, CustomersRepo, OrdersRepo},
};
use crate::cache::{CacheKey, CacheStore, EntityKind};
use crate::domain::entities::OrderRecord;

#[derive(Debug, Clone, Copy)]
pub struct CreateOrderCommand {
    pub customer_id: i64,
}

/// `customer_id` of `None` or `0` keeps the current customer.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOrderCommand {
    pub customer_id: Option<i64>,
}

#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrdersRepo>,
    customers: Arc<dyn CustomersRepo>,
    cache: Arc<CacheStore>,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn OrdersRepo>,
        customers: Arc<dyn CustomersRepo>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            repo,
            customers,
            cache,
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<OrderRecord>, ServiceError> {
        Ok(self
            .cache
            .orders
            .load(CacheKey::id(EntityKind::Order, id), || self.repo.find_order(id))
            .await?)
    }

    /// Orders placed by one customer, cached as `customer:{id}:orders`.
    pub async fn find_by_customer_id(
        &self,
        customer_id: i64,
    ) -> Result<Vec<OrderRecord>, ServiceError> {
        let key = CacheKey::children(EntityKind::Order, EntityKind::Customer, customer_id);
        Ok(self
            .cache
            .orders
            .load_list(key, || self.repo.list_orders_for_customer(customer_id))
            .await?)
    }

    pub async fn create(&self, command: CreateOrderCommand) -> Result<OrderRecord, ServiceError> {
        self.ensure_customer(command.customer_id).await?;

        let order = self
            .repo
            .create_order(CreateOrderParams {
                customer_id: command.customer_id,
            })
            .await?;
        self.cache.record_created(EntityKind::Order);

        info!(
            target = "application::orders::create",
            order_id = order.id,
            customer_id = order.customer_id,
            "order created"
        );
        Ok(order)
    }

    pub async fn update(
        &self,
        id: i64,
        command: UpdateOrderCommand,
    ) -> Result<OrderRecord, ServiceError> {
        let mut order = self
            .repo
            .find_order(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", id))?;

        if let Some(customer_id) = command.customer_id
            && customer_id != 0
            && customer_id != order.customer_id
        {
            self.ensure_customer(customer_id).await?;
            order.customer_id = customer_id;
        }

        self.repo.save_order(&order).await?;
        self.cache.record_updated(EntityKind::Order, id);

        info!(
            target = "application::orders::update",
            order_id = id,
            customer_id = order.customer_id,
            "order updated"
        );
        Ok(order)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete_order(id).await? {
            return Err(ServiceError::not_found("order", id));
        }
        self.cache.record_deleted(EntityKind::Order, id);

        info!(
            target = "application::orders::delete",
            order_id = id,
            "order deleted"
        );
        Ok(())
    }

    async fn ensure_customer(&self, customer_id: i64) -> Result<(), ServiceError> {
        self.customers
            .find_customer(customer_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::not_found("customer", customer_id))
    }
}
