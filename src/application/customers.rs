use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;

use crate::application::{
    error::ServiceError,
    fields::{apply_text, optional_text, required_text},
    repos::{CreateCustomerParams, CustomersRepo},
};
use crate::cache::{CacheKey, CacheStore, EntityKind, LookupAttribute};
use crate::domain::entities::CustomerRecord;

#[derive(Debug, Clone)]
pub struct CreateCustomerCommand {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// Fields left as `None` or blank keep their stored value. Text is trimmed.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomerCommand {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone)]
pub struct CustomerService {
    repo: Arc<dyn CustomersRepo>,
    cache: Arc<CacheStore>,
}

impl CustomerService {
    pub fn new(repo: Arc<dyn CustomersRepo>, cache: Arc<CacheStore>) -> Self {
        Self { repo, cache }
    }

    pub async fn find_all(&self) -> Result<Vec<CustomerRecord>, ServiceError> {
        let key = CacheKey::collection(EntityKind::Customer);
        Ok(self
            .cache
            .customers
            .load_list(key, || self.repo.list_customers())
            .await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<CustomerRecord>, ServiceError> {
        let key = CacheKey::id(EntityKind::Customer, id);
        Ok(self
            .cache
            .customers
            .load(key, || self.repo.find_customer(id))
            .await?)
    }

    /// Email matching ignores case and surrounding whitespace.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<CustomerRecord>, ServiceError> {
        self.find_by_attribute(LookupAttribute::Email, email).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<CustomerRecord>, ServiceError> {
        self.find_by_attribute(LookupAttribute::Name, name).await
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<CustomerRecord>, ServiceError> {
        self.find_by_attribute(LookupAttribute::Phone, phone).await
    }

    pub async fn create(
        &self,
        command: CreateCustomerCommand,
    ) -> Result<CustomerRecord, ServiceError> {
        let params = CreateCustomerParams {
            name: required_text(command.name, "name")?,
            email: required_text(command.email, "email")?,
            phone: optional_text(command.phone),
            address: optional_text(command.address),
        };
        let customer = self.repo.create_customer(params).await?;
        self.cache.record_created(EntityKind::Customer);

        info!(
            target = "application::customers::create",
            customer_id = customer.id,
            "customer created"
        );
        Ok(customer)
    }

    pub async fn update(
        &self,
        id: i64,
        command: UpdateCustomerCommand,
    ) -> Result<CustomerRecord, ServiceError> {
        let mut customer = self
            .repo
            .find_customer(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", id))?;

        apply_text(&mut customer.name, command.name);
        apply_text(&mut customer.email, command.email);
        apply_text(&mut customer.phone, command.phone);
        apply_text(&mut customer.address, command.address);
        customer.updated_at = OffsetDateTime::now_utc();

        self.repo.save_customer(&customer).await?;
        self.cache.record_updated(EntityKind::Customer, id);

        info!(
            target = "application::customers::update",
            customer_id = id,
            "customer updated"
        );
        Ok(customer)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete_customer(id).await? {
            return Err(ServiceError::not_found("customer", id));
        }
        self.cache.record_deleted(EntityKind::Customer, id);

        info!(
            target = "application::customers::delete_by_id",
            customer_id = id,
            "customer deleted"
        );
        Ok(())
    }

    async fn find_by_attribute(
        &self,
        attribute: LookupAttribute,
        value: &str,
    ) -> Result<Option<CustomerRecord>, ServiceError> {
        let key = CacheKey::attribute(EntityKind::Customer, attribute, value);
        let normalized = attribute.normalize(value);
        let repo = &self.repo;

        Ok(self
            .cache
            .customers
            .load(key, || async {
                match attribute {
                    LookupAttribute::Email => repo.find_customer_by_email(&normalized).await,
                    LookupAttribute::Name => repo.find_customer_by_name(&normalized).await,
                    LookupAttribute::Phone => repo.find_customer_by_phone(&normalized).await,
                }
            })
            .await?)
    }
}
