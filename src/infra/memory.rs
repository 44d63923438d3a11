//! In-process backing store.
//!
//! Implements every repository trait over ordered maps. Identities start at 1 and
//! are never reused. Deletes cascade the way the relational schema does: removing
//! a customer removes its orders, removing an order or product removes the order
//! items (and inventory rows) that reference it.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    CategoriesRepo, CreateCategoryParams, CreateCustomerParams, CreateInventoryParams,
    CreateOrderItemParams, CreateOrderParams, CreateProductParams, CustomersRepo, InventoryRepo,
    OrderItemsRepo, OrdersRepo, ProductsRepo, RepoError,
};
use crate::cache::lock::mutex_lock;
use crate::domain::entities::{
    CategoryRecord, CustomerRecord, InventoryRecord, OrderItemRecord, OrderRecord, ProductRecord,
};

const SOURCE: &str = "infra::memory";

struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Table<T> {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    fn get(&self, id: i64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.values().find(|row| predicate(row)).cloned()
    }

    fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    fn replace(&mut self, id: i64, row: T) -> Result<(), RepoError> {
        match self.rows.get_mut(&id) {
            Some(slot) => {
                *slot = row;
                Ok(())
            }
            None => Err(RepoError::NotFound),
        }
    }

    fn remove_where(&mut self, predicate: impl Fn(&T) -> bool) {
        self.rows.retain(|_, row| !predicate(row));
    }
}

#[derive(Default)]
struct State {
    customers: Table<CustomerRecord>,
    categories: Table<CategoryRecord>,
    products: Table<ProductRecord>,
    orders: Table<OrderRecord>,
    order_items: Table<OrderItemRecord>,
    inventory: Table<InventoryRecord>,
}

impl State {
    fn remove_order(&mut self, order_id: i64) -> bool {
        let removed = self.orders.rows.remove(&order_id).is_some();
        if removed {
            self.order_items.remove_where(|item| item.order_id == order_id);
        }
        removed
    }

    fn require_customer(&self, id: i64) -> Result<(), RepoError> {
        if self.customers.rows.contains_key(&id) {
            Ok(())
        } else {
            Err(foreign_key("orders_customer_id_fkey"))
        }
    }

    fn require_product(&self, id: i64) -> Result<(), RepoError> {
        if self.products.rows.contains_key(&id) {
            Ok(())
        } else {
            Err(foreign_key("product_id_fkey"))
        }
    }
}

fn foreign_key(constraint: &str) -> RepoError {
    RepoError::InvalidInput {
        message: format!("violates foreign key constraint \"{constraint}\""),
    }
}

/// All six repositories over one in-memory state.
#[derive(Default)]
pub struct MemoryRepositories {
    state: Mutex<State>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, op: &'static str, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = mutex_lock(&self.state, SOURCE, op);
        f(&mut state)
    }
}

#[async_trait]
impl CustomersRepo for MemoryRepositories {
    async fn list_customers(&self) -> Result<Vec<CustomerRecord>, RepoError> {
        Ok(self.with_state("list_customers", |s| s.customers.all()))
    }

    async fn find_customer(&self, id: i64) -> Result<Option<CustomerRecord>, RepoError> {
        Ok(self.with_state("find_customer", |s| s.customers.get(id)))
    }

    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CustomerRecord>, RepoError> {
        let email = email.trim().to_lowercase();
        Ok(self.with_state("find_customer_by_email", |s| {
            s.customers
                .find(|c| c.email.trim().to_lowercase() == email)
        }))
    }

    async fn find_customer_by_name(&self, name: &str) -> Result<Option<CustomerRecord>, RepoError> {
        Ok(self.with_state("find_customer_by_name", |s| {
            s.customers.find(|c| c.name == name)
        }))
    }

    async fn find_customer_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<CustomerRecord>, RepoError> {
        Ok(self.with_state("find_customer_by_phone", |s| {
            s.customers.find(|c| c.phone == phone)
        }))
    }

    async fn create_customer(
        &self,
        params: CreateCustomerParams,
    ) -> Result<CustomerRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        Ok(self.with_state("create_customer", |s| {
            let record = CustomerRecord {
                id: s.customers.allocate(),
                name: params.name,
                email: params.email,
                phone: params.phone,
                address: params.address,
                created_at: now,
                updated_at: now,
            };
            s.customers.rows.insert(record.id, record.clone());
            record
        }))
    }

    async fn save_customer(&self, record: &CustomerRecord) -> Result<(), RepoError> {
        self.with_state("save_customer", |s| {
            s.customers.replace(record.id, record.clone())
        })
    }

    async fn delete_customer(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.with_state("delete_customer", |s| {
            if s.customers.rows.remove(&id).is_none() {
                return false;
            }
            let orders = s.orders.filter(|o| o.customer_id == id);
            for order in orders {
                s.remove_order(order.id);
            }
            true
        }))
    }
}

#[async_trait]
impl CategoriesRepo for MemoryRepositories {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        Ok(self.with_state("list_categories", |s| s.categories.all()))
    }

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self.with_state("find_category", |s| s.categories.get(id)))
    }

    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        Ok(self.with_state("create_category", |s| {
            let record = CategoryRecord {
                id: s.categories.allocate(),
                name: params.name,
                description: params.description,
            };
            s.categories.rows.insert(record.id, record.clone());
            record
        }))
    }
}

#[async_trait]
impl ProductsRepo for MemoryRepositories {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        Ok(self.with_state("list_products", |s| s.products.all()))
    }

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        Ok(self.with_state("find_product", |s| s.products.get(id)))
    }

    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        self.with_state("create_product", |s| {
            if !s.categories.rows.contains_key(&params.category_id) {
                return Err(foreign_key("products_category_id_fkey"));
            }
            let record = ProductRecord {
                id: s.products.allocate(),
                name: params.name,
                description: params.description,
                price_cents: params.price_cents,
                category_id: params.category_id,
                quantity: params.quantity,
                created_at: now,
                updated_at: now,
            };
            s.products.rows.insert(record.id, record.clone());
            Ok(record)
        })
    }

    async fn save_product(&self, record: &ProductRecord) -> Result<(), RepoError> {
        self.with_state("save_product", |s| {
            if !s.categories.rows.contains_key(&record.category_id) {
                return Err(foreign_key("products_category_id_fkey"));
            }
            s.products.replace(record.id, record.clone())
        })
    }

    async fn delete_product(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.with_state("delete_product", |s| {
            if s.products.rows.remove(&id).is_none() {
                return false;
            }
            s.order_items.remove_where(|item| item.product_id == id);
            s.inventory.remove_where(|row| row.product_id == id);
            true
        }))
    }
}

#[async_trait]
impl OrdersRepo for MemoryRepositories {
    async fn find_order(&self, id: i64) -> Result<Option<OrderRecord>, RepoError> {
        Ok(self.with_state("find_order", |s| s.orders.get(id)))
    }

    async fn list_orders_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<OrderRecord>, RepoError> {
        Ok(self.with_state("list_orders_for_customer", |s| {
            s.orders.filter(|o| o.customer_id == customer_id)
        }))
    }

    async fn create_order(&self, params: CreateOrderParams) -> Result<OrderRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        self.with_state("create_order", |s| {
            s.require_customer(params.customer_id)?;
            let record = OrderRecord {
                id: s.orders.allocate(),
                customer_id: params.customer_id,
                created_at: now,
            };
            s.orders.rows.insert(record.id, record.clone());
            Ok(record)
        })
    }

    async fn save_order(&self, record: &OrderRecord) -> Result<(), RepoError> {
        self.with_state("save_order", |s| {
            s.require_customer(record.customer_id)?;
            s.orders.replace(record.id, record.clone())
        })
    }

    async fn delete_order(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.with_state("delete_order", |s| s.remove_order(id)))
    }
}

#[async_trait]
impl OrderItemsRepo for MemoryRepositories {
    async fn find_order_item(&self, id: i64) -> Result<Option<OrderItemRecord>, RepoError> {
        Ok(self.with_state("find_order_item", |s| s.order_items.get(id)))
    }

    async fn list_items_for_order(
        &self,
        order_id: i64,
    ) -> Result<Vec<OrderItemRecord>, RepoError> {
        Ok(self.with_state("list_items_for_order", |s| {
            s.order_items.filter(|item| item.order_id == order_id)
        }))
    }

    async fn list_items_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<OrderItemRecord>, RepoError> {
        Ok(self.with_state("list_items_for_product", |s| {
            s.order_items.filter(|item| item.product_id == product_id)
        }))
    }

    async fn create_order_item(
        &self,
        params: CreateOrderItemParams,
    ) -> Result<OrderItemRecord, RepoError> {
        self.with_state("create_order_item", |s| {
            if !s.orders.rows.contains_key(&params.order_id) {
                return Err(foreign_key("order_items_order_id_fkey"));
            }
            s.require_product(params.product_id)?;
            let record = OrderItemRecord {
                id: s.order_items.allocate(),
                order_id: params.order_id,
                product_id: params.product_id,
                quantity: params.quantity,
            };
            s.order_items.rows.insert(record.id, record.clone());
            Ok(record)
        })
    }

    async fn save_order_item(&self, record: &OrderItemRecord) -> Result<(), RepoError> {
        self.with_state("save_order_item", |s| {
            s.require_product(record.product_id)?;
            s.order_items.replace(record.id, record.clone())
        })
    }

    async fn delete_order_item(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.with_state("delete_order_item", |s| {
            s.order_items.rows.remove(&id).is_some()
        }))
    }
}

#[async_trait]
impl InventoryRepo for MemoryRepositories {
    async fn list_inventory(&self) -> Result<Vec<InventoryRecord>, RepoError> {
        Ok(self.with_state("list_inventory", |s| s.inventory.all()))
    }

    async fn find_inventory(&self, id: i64) -> Result<Option<InventoryRecord>, RepoError> {
        Ok(self.with_state("find_inventory", |s| s.inventory.get(id)))
    }

    async fn create_inventory(
        &self,
        params: CreateInventoryParams,
    ) -> Result<InventoryRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        self.with_state("create_inventory", |s| {
            s.require_product(params.product_id)?;
            let record = InventoryRecord {
                id: s.inventory.allocate(),
                product_id: params.product_id,
                quantity: params.quantity,
                updated_at: now,
            };
            s.inventory.rows.insert(record.id, record.clone());
            Ok(record)
        })
    }

    async fn save_inventory(&self, record: &InventoryRecord) -> Result<(), RepoError> {
        self.with_state("save_inventory", |s| {
            s.require_product(record.product_id)?;
            s.inventory.replace(record.id, record.clone())
        })
    }

    async fn delete_inventory(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.with_state("delete_inventory", |s| {
            s.inventory.rows.remove(&id).is_some()
        }))
    }
}
