use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CreateOrderItemParams, CreateOrderParams, OrderItemsRepo, OrdersRepo, RepoError,
    },
    domain::entities::{OrderItemRecord, OrderRecord},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_id: i64,
    created_at: OffsetDateTime,
}

impl From<OrderRow> for OrderRecord {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i32,
}

impl From<OrderItemRow> for OrderItemRecord {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
        }
    }
}

#[async_trait]
impl OrdersRepo for PostgresRepositories {
    async fn find_order(&self, id: i64) -> Result<Option<OrderRecord>, RepoError> {
        let row = query_as::<_, OrderRow>(
            "SELECT id, customer_id, created_at FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_orders_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<OrderRecord>, RepoError> {
        let rows = query_as::<_, OrderRow>(
            "SELECT id, customer_id, created_at FROM orders WHERE customer_id = $1 ORDER BY id",
        )
        .bind(customer_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_order(&self, params: CreateOrderParams) -> Result<OrderRecord, RepoError> {
        let row = query_as::<_, OrderRow>(
            "INSERT INTO orders (customer_id) VALUES ($1) RETURNING id, customer_id, created_at",
        )
        .bind(params.customer_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn save_order(&self, record: &OrderRecord) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE orders SET customer_id = $2 WHERE id = $1")
            .bind(record.id)
            .bind(record.customer_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_order(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderItemsRepo for PostgresRepositories {
    async fn find_order_item(&self, id: i64) -> Result<Option<OrderItemRecord>, RepoError> {
        let row = query_as::<_, OrderItemRow>(
            "SELECT id, order_id, product_id, quantity FROM order_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_items_for_order(
        &self,
        order_id: i64,
    ) -> Result<Vec<OrderItemRecord>, RepoError> {
        let rows = query_as::<_, OrderItemRow>(
            "SELECT id, order_id, product_id, quantity FROM order_items \
             WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_items_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<OrderItemRecord>, RepoError> {
        let rows = query_as::<_, OrderItemRow>(
            "SELECT id, order_id, product_id, quantity FROM order_items \
             WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_order_item(
        &self,
        params: CreateOrderItemParams,
    ) -> Result<OrderItemRecord, RepoError> {
        let row = query_as::<_, OrderItemRow>(
            "INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3) \
             RETURNING id, order_id, product_id, quantity",
        )
        .bind(params.order_id)
        .bind(params.product_id)
        .bind(params.quantity)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn save_order_item(&self, record: &OrderItemRecord) -> Result<(), RepoError> {
        let result =
            sqlx::query("UPDATE order_items SET product_id = $2, quantity = $3 WHERE id = $1")
                .bind(record.id)
                .bind(record.product_id)
                .bind(record.quantity)
                .execute(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_order_item(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM order_items WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
