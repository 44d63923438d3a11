mod support;

use storefront::application::Services;
use storefront::application::categories::CreateCategoryCommand;
use storefront::application::customers::UpdateCustomerCommand;
use storefront::application::error::ServiceError;
use storefront::application::inventory::{CreateInventoryCommand, UpdateInventoryCommand};
use storefront::application::order_items::{CreateOrderItemCommand, UpdateOrderItemCommand};
use storefront::application::orders::CreateOrderCommand;
use storefront::application::products::{CreateProductCommand, UpdateProductCommand};
use storefront::cache::{CacheConfig, WriteConsistency};

use support::{customer_command, services};

fn invalidate_on_write() -> CacheConfig {
    CacheConfig::default().with_consistency(WriteConsistency::InvalidateOnWrite)
}

/// One customer with one order holding one item, plus the product and its stock.
async fn seed(services: &Services) {
    services
        .customers
        .create(customer_command())
        .await
        .expect("customer");
    let category = services
        .categories
        .create(CreateCategoryCommand {
            name: "Tools".to_string(),
            description: "Hand tools".to_string(),
        })
        .await
        .expect("category");
    let product = services
        .products
        .create(CreateProductCommand {
            name: "Hammer".to_string(),
            description: "Claw hammer".to_string(),
            price_cents: 1_999,
            category_id: category.id,
            quantity: 10,
        })
        .await
        .expect("product");
    let order = services
        .orders
        .create(CreateOrderCommand { customer_id: 1 })
        .await
        .expect("order");
    services
        .order_items
        .create(CreateOrderItemCommand {
            order_id: order.id,
            product_id: product.id,
            quantity: 2,
        })
        .await
        .expect("order item");
    services
        .inventory
        .create(CreateInventoryCommand {
            product_id: product.id,
            quantity: 10,
        })
        .await
        .expect("inventory");
}

fn rename(name: &str) -> UpdateCustomerCommand {
    UpdateCustomerCommand {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn bounded_staleness_serves_cached_copy_after_update() {
    let (services, _clock) = services(CacheConfig::default());
    seed(&services).await;

    let before = services
        .customers
        .find_by_id(1)
        .await
        .expect("lookup")
        .expect("customer");
    services
        .customers
        .find_by_email("email@gmail.com")
        .await
        .expect("lookup");

    let updated = services
        .customers
        .update(1, rename("Renamed"))
        .await
        .expect("update");
    assert_eq!(updated.name, "Renamed");

    let after = services
        .customers
        .find_by_id(1)
        .await
        .expect("lookup")
        .expect("customer");
    assert_eq!(after, before);

    let by_email = services
        .customers
        .find_by_email("email@gmail.com")
        .await
        .expect("lookup")
        .expect("customer");
    assert_eq!(by_email.name, "Name");
}

#[tokio::test]
async fn invalidate_on_write_reflects_update_under_every_key() {
    let (services, _clock) = services(invalidate_on_write());
    seed(&services).await;

    services.customers.find_by_id(1).await.expect("lookup");
    services
        .customers
        .find_by_email("email@gmail.com")
        .await
        .expect("lookup");
    services.customers.find_all().await.expect("list");

    services
        .customers
        .update(1, rename("Renamed"))
        .await
        .expect("update");

    let by_id = services
        .customers
        .find_by_id(1)
        .await
        .expect("lookup")
        .expect("customer");
    let by_email = services
        .customers
        .find_by_email("email@gmail.com")
        .await
        .expect("lookup")
        .expect("customer");
    let all = services.customers.find_all().await.expect("list");

    assert_eq!(by_id.name, "Renamed");
    assert_eq!(by_email.name, "Renamed");
    assert_eq!(all[0].name, "Renamed");
}

#[tokio::test]
async fn invalidate_on_write_drops_collection_on_create() {
    let (services, _clock) = services(invalidate_on_write());
    seed(&services).await;

    assert_eq!(services.customers.find_all().await.expect("list").len(), 1);

    let mut second = customer_command();
    second.email = "second@gmail.com".to_string();
    services.customers.create(second).await.expect("create");

    assert_eq!(services.customers.find_all().await.expect("list").len(), 2);
}

#[tokio::test]
async fn child_listings_follow_the_consistency_mode() {
    for (config, expected) in [(CacheConfig::default(), 1), (invalidate_on_write(), 2)] {
        let (services, _clock) = services(config);
        seed(&services).await;

        assert_eq!(
            services
                .order_items
                .find_by_order_id(1)
                .await
                .expect("list")
                .len(),
            1
        );

        services
            .order_items
            .create(CreateOrderItemCommand {
                order_id: 1,
                product_id: 1,
                quantity: 1,
            })
            .await
            .expect("order item");

        assert_eq!(
            services
                .order_items
                .find_by_order_id(1)
                .await
                .expect("list")
                .len(),
            expected
        );
    }
}

#[tokio::test]
async fn delete_purges_under_both_modes() {
    for config in [CacheConfig::default(), invalidate_on_write()] {
        let (services, _clock) = services(config);
        seed(&services).await;

        assert_eq!(
            services
                .orders
                .find_by_customer_id(1)
                .await
                .expect("list")
                .len(),
            1
        );
        services.orders.find_by_id(1).await.expect("lookup");
        services.order_items.find_by_order_id(1).await.expect("list");

        services.orders.delete(1).await.expect("delete");

        assert!(services.orders.find_by_id(1).await.expect("lookup").is_none());
        assert!(
            services
                .orders
                .find_by_customer_id(1)
                .await
                .expect("list")
                .is_empty()
        );
        assert!(
            services
                .order_items
                .find_by_order_id(1)
                .await
                .expect("list")
                .is_empty()
        );
    }
}

#[tokio::test]
async fn product_delete_purges_product_keyed_listings() {
    let (services, _clock) = services(CacheConfig::default());
    seed(&services).await;

    assert_eq!(services.products.find_all().await.expect("list").len(), 1);
    assert_eq!(
        services
            .order_items
            .find_by_product_id(1)
            .await
            .expect("list")
            .len(),
        1
    );

    services.products.delete_by_id(1).await.expect("delete");

    assert!(services.products.find_all().await.expect("list").is_empty());
    assert!(
        services
            .order_items
            .find_by_product_id(1)
            .await
            .expect("list")
            .is_empty()
    );
    assert!(services.products.find_by_id(1).await.expect("lookup").is_none());
}

#[tokio::test]
async fn rejected_writes_leave_store_and_cache_alone() {
    let (services, _clock) = services(invalidate_on_write());
    seed(&services).await;

    let cached = services
        .products
        .find_by_id(1)
        .await
        .expect("lookup")
        .expect("product");
    let entries = services.cache.len();

    let err = services
        .products
        .update(
            1,
            UpdateProductCommand {
                category_id: Some(42),
                ..Default::default()
            },
        )
        .await
        .expect_err("unknown category");
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: "category",
            id: 42
        }
    ));

    let err = services
        .order_items
        .update(
            1,
            UpdateOrderItemCommand {
                order_id: Some(7),
                ..Default::default()
            },
        )
        .await
        .expect_err("order cannot change");
    assert!(matches!(err, ServiceError::ConstraintViolation(_)));

    assert_eq!(services.cache.len(), entries);
    assert_eq!(
        services
            .products
            .find_by_id(1)
            .await
            .expect("lookup")
            .expect("product"),
        cached
    );
}

#[tokio::test]
async fn update_ignores_blank_and_negative_values() {
    let (services, _clock) = services(invalidate_on_write());
    seed(&services).await;

    let product = services
        .products
        .update(
            1,
            UpdateProductCommand {
                name: Some(String::new()),
                price_cents: Some(-5),
                quantity: Some(4),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(product.name, "Hammer");
    assert_eq!(product.price_cents, 1_999);
    assert_eq!(product.quantity, 4);

    let stock = services
        .inventory
        .update(
            1,
            UpdateInventoryCommand {
                quantity: Some(-1),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(stock.quantity, 10);

    let item = services
        .order_items
        .update(
            1,
            UpdateOrderItemCommand {
                quantity: Some(5),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(item.quantity, 5);
    assert_eq!(
        services
            .order_items
            .find_by_id(1)
            .await
            .expect("lookup")
            .expect("item")
            .quantity,
        5
    );
}
