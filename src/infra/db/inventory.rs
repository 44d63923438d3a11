use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;

use crate::{
    application::repos::{CreateInventoryParams, InventoryRepo, RepoError},
    domain::entities::InventoryRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct InventoryRow {
    id: i64,
    product_id: i64,
    quantity: i32,
    updated_at: OffsetDateTime,
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl InventoryRepo for PostgresRepositories {
    async fn list_inventory(&self) -> Result<Vec<InventoryRecord>, RepoError> {
        let rows = query_as::<_, InventoryRow>(
            "SELECT id, product_id, quantity, updated_at FROM inventories ORDER BY id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_inventory(&self, id: i64) -> Result<Option<InventoryRecord>, RepoError> {
        let row = query_as::<_, InventoryRow>(
            "SELECT id, product_id, quantity, updated_at FROM inventories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn create_inventory(
        &self,
        params: CreateInventoryParams,
    ) -> Result<InventoryRecord, RepoError> {
        let row = query_as::<_, InventoryRow>(
            "INSERT INTO inventories (product_id, quantity) VALUES ($1, $2) \
             RETURNING id, product_id, quantity, updated_at",
        )
        .bind(params.product_id)
        .bind(params.quantity)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn save_inventory(&self, record: &InventoryRecord) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE inventories SET product_id = $2, quantity = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(record.id)
        .bind(record.product_id)
        .bind(record.quantity)
        .bind(record.updated_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_inventory(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM inventories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
