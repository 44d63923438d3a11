use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;

use crate::{
    application::repos::{CreateCustomerParams, CustomersRepo, RepoError},
    domain::entities::CustomerRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    name: String,
    email: String,
    phone: String,
    address: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CustomerRow> for CustomerRecord {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    async fn find_customer_where(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Option<CustomerRecord>, RepoError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE {predicate} ORDER BY id LIMIT 1"
        );
        let row = query_as::<_, CustomerRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl CustomersRepo for PostgresRepositories {
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, RepoError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id");
        let rows = query_as::<_, CustomerRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_customer(&self, id: i64) -> Result<Option<CustomerRecord>, RepoError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row = query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CustomerRecord>, RepoError> {
        self.find_customer_where("lower(email) = lower($1)", email.trim())
            .await
    }

    async fn find_customer_by_name(&self, name: &str) -> Result<Option<CustomerRecord>, RepoError> {
        self.find_customer_where("name = $1", name).await
    }

    async fn find_customer_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<CustomerRecord>, RepoError> {
        self.find_customer_where("phone = $1", phone).await
    }

    async fn create_customer(
        &self,
        params: CreateCustomerParams,
    ) -> Result<CustomerRecord, RepoError> {
        let sql = format!(
            "INSERT INTO customers (name, email, phone, address) \
             VALUES ($1, $2, $3, $4) RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = query_as::<_, CustomerRow>(&sql)
            .bind(params.name)
            .bind(params.email)
            .bind(params.phone)
            .bind(params.address)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn save_customer(&self, record: &CustomerRecord) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE customers SET name = $2, email = $3, phone = $4, address = $5, \
             updated_at = $6 WHERE id = $1",
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.address)
        .bind(record.updated_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_customer(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
