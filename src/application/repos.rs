//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{
    CategoryRecord, CustomerRecord, InventoryRecord, OrderItemRecord, OrderRecord, ProductRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateCustomerParams {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreateProductParams {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct CreateOrderParams {
    pub customer_id: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct CreateOrderItemParams {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct CreateInventoryParams {
    pub product_id: i64,
    pub quantity: i32,
}

/// Backing store for customers.
///
/// `save_customer` persists every field of the record as given; services decide which
/// fields change. Lookups by attribute return the first match in id order.
#[async_trait]
pub trait CustomersRepo: Send + Sync {
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, RepoError>;

    async fn find_customer(&self, id: i64) -> Result<Option<CustomerRecord>, RepoError>;

    /// Case-insensitive match on a trimmed, lowercased email.
    async fn find_customer_by_email(&self, email: &str)
    -> Result<Option<CustomerRecord>, RepoError>;

    async fn find_customer_by_name(&self, name: &str) -> Result<Option<CustomerRecord>, RepoError>;

    async fn find_customer_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<CustomerRecord>, RepoError>;

    async fn create_customer(
        &self,
        params: CreateCustomerParams,
    ) -> Result<CustomerRecord, RepoError>;

    async fn save_customer(&self, record: &CustomerRecord) -> Result<(), RepoError>;

    /// Returns `false` when no row matched.
    async fn delete_customer(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError>;

    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError>;

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError>;

    async fn create_product(&self, params: CreateProductParams)
    -> Result<ProductRecord, RepoError>;

    async fn save_product(&self, record: &ProductRecord) -> Result<(), RepoError>;

    async fn delete_product(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait OrdersRepo: Send + Sync {
    async fn find_order(&self, id: i64) -> Result<Option<OrderRecord>, RepoError>;

    async fn list_orders_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<OrderRecord>, RepoError>;

    async fn create_order(&self, params: CreateOrderParams) -> Result<OrderRecord, RepoError>;

    async fn save_order(&self, record: &OrderRecord) -> Result<(), RepoError>;

    async fn delete_order(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait OrderItemsRepo: Send + Sync {
    async fn find_order_item(&self, id: i64) -> Result<Option<OrderItemRecord>, RepoError>;

    async fn list_items_for_order(&self, order_id: i64)
    -> Result<Vec<OrderItemRecord>, RepoError>;

    async fn list_items_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<OrderItemRecord>, RepoError>;

    async fn create_order_item(
        &self,
        params: CreateOrderItemParams,
    ) -> Result<OrderItemRecord, RepoError>;

    async fn save_order_item(&self, record: &OrderItemRecord) -> Result<(), RepoError>;

    async fn delete_order_item(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait InventoryRepo: Send + Sync {
    async fn list_inventory(&self) -> Result<Vec<InventoryRecord>, RepoError>;

    async fn find_inventory(&self, id: i64) -> Result<Option<InventoryRecord>, RepoError>;

    async fn create_inventory(
        &self,
        params: CreateInventoryParams,
    ) -> Result<InventoryRecord, RepoError>;

    async fn save_inventory(&self, record: &InventoryRecord) -> Result<(), RepoError>;

    async fn delete_inventory(&self, id: i64) -> Result<bool, RepoError>;
}
