//! Services for the back-office entities.
//!
//! Every lookup reads through the shared [`crate::cache::CacheStore`]; every
//! mutation writes to the backing store first and then tells the cache.

pub mod categories;
pub mod customers;
pub mod error;
mod fields;
pub mod inventory;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod repos;

use std::sync::Arc;

use crate::cache::CacheStore;

use self::{
    categories::CategoryService, customers::CustomerService, inventory::InventoryService,
    order_items::OrderItemService, orders::OrderService, products::ProductService,
    repos::{
        CategoriesRepo, CustomersRepo, InventoryRepo, OrderItemsRepo, OrdersRepo, ProductsRepo,
    },
};

/// The six services wired to one set of repositories and one cache.
#[derive(Clone)]
pub struct Services {
    pub customers: CustomerService,
    pub categories: CategoryService,
    pub products: ProductService,
    pub orders: OrderService,
    pub order_items: OrderItemService,
    pub inventory: InventoryService,
    pub cache: Arc<CacheStore>,
}

impl Services {
    pub fn new<R>(repositories: Arc<R>, cache: Arc<CacheStore>) -> Self
    where
        R: CustomersRepo
            + CategoriesRepo
            + ProductsRepo
            + OrdersRepo
            + OrderItemsRepo
            + InventoryRepo
            + 'static,
    {
        let customers: Arc<dyn CustomersRepo> = repositories.clone();
        let categories: Arc<dyn CategoriesRepo> = repositories.clone();
        let products: Arc<dyn ProductsRepo> = repositories.clone();
        let orders: Arc<dyn OrdersRepo> = repositories.clone();
        let order_items: Arc<dyn OrderItemsRepo> = repositories.clone();
        let inventory: Arc<dyn InventoryRepo> = repositories;

        Self {
            customers: CustomerService::new(customers.clone(), cache.clone()),
            categories: CategoryService::new(categories.clone(), cache.clone()),
            products: ProductService::new(products.clone(), categories, cache.clone()),
            orders: OrderService::new(orders.clone(), customers, cache.clone()),
            order_items: OrderItemService::new(order_items, orders, products.clone(), cache.clone()),
            inventory: InventoryService::new(inventory, products, cache.clone()),
            cache,
        }
    }
}
