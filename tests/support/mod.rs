//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use storefront::application::Services;
use storefront::application::customers::CreateCustomerCommand;
use storefront::application::repos::{
    CategoriesRepo, CreateCategoryParams, CreateCustomerParams, CreateProductParams,
    CustomersRepo, ProductsRepo, RepoError,
};
use storefront::cache::{CacheConfig, CacheStore, ManualClock};
use storefront::domain::entities::{CategoryRecord, CustomerRecord, ProductRecord};
use storefront::infra::memory::MemoryRepositories;

pub fn customer_command() -> CreateCustomerCommand {
    CreateCustomerCommand {
        name: "Name".to_string(),
        email: "Email@gmail.com".to_string(),
        phone: "843806784".to_string(),
        address: "1b22".to_string(),
    }
}

/// Services over a fresh in-memory store, with the clock exposed.
pub fn services(config: CacheConfig) -> (Services, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(CacheStore::with_clock(config, clock.clone()));
    let services = Services::new(Arc::new(MemoryRepositories::new()), cache);
    (services, clock)
}

/// Customer, category and product repositories that count reads and can be told
/// to fail.
#[derive(Default)]
pub struct CountingRepo {
    inner: MemoryRepositories,
    reads: AtomicUsize,
    failing: AtomicBool,
}

impl CountingRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn read(&self) -> Result<(), RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(())
    }
}

#[async_trait]
impl CustomersRepo for CountingRepo {
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, RepoError> {
        self.read()?;
        self.inner.list_customers().await
    }

    async fn find_customer(&self, id: i64) -> Result<Option<CustomerRecord>, RepoError> {
        self.read()?;
        self.inner.find_customer(id).await
    }

    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CustomerRecord>, RepoError> {
        self.read()?;
        self.inner.find_customer_by_email(email).await
    }

    async fn find_customer_by_name(&self, name: &str) -> Result<Option<CustomerRecord>, RepoError> {
        self.read()?;
        self.inner.find_customer_by_name(name).await
    }

    async fn find_customer_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<CustomerRecord>, RepoError> {
        self.read()?;
        self.inner.find_customer_by_phone(phone).await
    }

    async fn create_customer(
        &self,
        params: CreateCustomerParams,
    ) -> Result<CustomerRecord, RepoError> {
        self.inner.create_customer(params).await
    }

    async fn save_customer(&self, record: &CustomerRecord) -> Result<(), RepoError> {
        self.inner.save_customer(record).await
    }

    async fn delete_customer(&self, id: i64) -> Result<bool, RepoError> {
        self.inner.delete_customer(id).await
    }
}

#[async_trait]
impl CategoriesRepo for CountingRepo {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        self.read()?;
        self.inner.list_categories().await
    }

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        self.inner.find_category(id).await
    }

    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        self.inner.create_category(params).await
    }
}

#[async_trait]
impl ProductsRepo for CountingRepo {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        self.read()?;
        self.inner.list_products().await
    }

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        self.read()?;
        self.inner.find_product(id).await
    }

    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        self.inner.create_product(params).await
    }

    async fn save_product(&self, record: &ProductRecord) -> Result<(), RepoError> {
        self.inner.save_product(record).await
    }

    async fn delete_product(&self, id: i64) -> Result<bool, RepoError> {
        self.inner.delete_product(id).await
    }
}
