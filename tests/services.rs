mod support;

use storefront::application::Services;
use storefront::application::categories::CreateCategoryCommand;
use storefront::application::customers::{CreateCustomerCommand, UpdateCustomerCommand};
use storefront::application::error::ServiceError;
use storefront::application::inventory::CreateInventoryCommand;
use storefront::application::order_items::CreateOrderItemCommand;
use storefront::application::orders::{CreateOrderCommand, UpdateOrderCommand};
use storefront::application::products::CreateProductCommand;
use storefront::cache::CacheConfig;
use storefront::domain::error::DomainError;

use support::{customer_command, services};

fn hammer(category_id: i64) -> CreateProductCommand {
    CreateProductCommand {
        name: "Hammer".to_string(),
        description: String::new(),
        price_cents: 1_999,
        category_id,
        quantity: 1,
    }
}

async fn with_catalog() -> Services {
    let (services, _clock) = services(CacheConfig::default());
    services
        .customers
        .create(customer_command())
        .await
        .expect("customer");
    services
        .categories
        .create(CreateCategoryCommand {
            name: "Tools".to_string(),
            description: String::new(),
        })
        .await
        .expect("category");
    services.products.create(hammer(1)).await.expect("product");
    services
}

#[tokio::test]
async fn customer_requires_name_and_email() {
    let (services, _clock) = services(CacheConfig::default());

    let err = services
        .customers
        .create(CreateCustomerCommand {
            name: "  ".to_string(),
            ..customer_command()
        })
        .await
        .expect_err("blank name");
    assert!(matches!(err, ServiceError::ConstraintViolation("name")));

    let err = services
        .customers
        .create(CreateCustomerCommand {
            email: String::new(),
            ..customer_command()
        })
        .await
        .expect_err("blank email");
    assert!(matches!(err, ServiceError::ConstraintViolation("email")));
}

#[tokio::test]
async fn customer_update_keeps_fields_left_blank() {
    let services = with_catalog().await;

    let updated = services
        .customers
        .update(
            1,
            UpdateCustomerCommand {
                phone: Some("555".to_string()),
                email: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.phone, "555");
    assert_eq!(updated.email, "Email@gmail.com");
    assert!(updated.updated_at >= updated.created_at);
}

#[tokio::test]
async fn customer_text_is_trimmed_on_create_and_update() {
    let (services, _clock) = services(CacheConfig::default());
    let created = services
        .customers
        .create(CreateCustomerCommand {
            name: "  Padded Name ".to_string(),
            ..customer_command()
        })
        .await
        .expect("create");
    assert_eq!(created.name, "Padded Name");

    let updated = services
        .customers
        .update(
            created.id,
            UpdateCustomerCommand {
                name: Some("   ".to_string()),
                email: Some("  New@Example.com ".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.name, "Padded Name");
    assert_eq!(updated.email, "New@Example.com");

    let by_email = services
        .customers
        .find_by_email("new@example.com")
        .await
        .expect("lookup")
        .expect("customer");
    assert_eq!(by_email.id, created.id);

    let by_name = services
        .customers
        .find_by_name(" Padded Name")
        .await
        .expect("lookup")
        .expect("customer");
    assert_eq!(by_name.id, created.id);
}

#[tokio::test]
async fn missing_records_are_reported_as_not_found() {
    let services = with_catalog().await;

    let err = services
        .customers
        .update(9, UpdateCustomerCommand::default())
        .await
        .expect_err("no customer 9");
    assert!(err.is_not_found());

    let err = services
        .customers
        .delete_by_id(9)
        .await
        .expect_err("no customer 9");
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: "customer",
            id: 9
        }
    ));

    let err = services.orders.delete(3).await.expect_err("no order 3");
    assert!(err.is_not_found());

    let err = services.inventory.delete(3).await.expect_err("no stock 3");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn product_rules() {
    let services = with_catalog().await;

    let err = services
        .products
        .create(CreateProductCommand {
            price_cents: -1,
            ..hammer(1)
        })
        .await
        .expect_err("negative price");
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::Negative {
            field: "price_cents",
            value: -1
        })
    ));

    let err = services
        .products
        .create(hammer(5))
        .await
        .expect_err("unknown category");
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: "category",
            id: 5
        }
    ));
}

#[tokio::test]
async fn order_rules() {
    let services = with_catalog().await;

    let err = services
        .orders
        .create(CreateOrderCommand { customer_id: 4 })
        .await
        .expect_err("unknown customer");
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: "customer",
            id: 4
        }
    ));

    let order = services
        .orders
        .create(CreateOrderCommand { customer_id: 1 })
        .await
        .expect("order");

    // Zero means "keep the current customer".
    let unchanged = services
        .orders
        .update(
            order.id,
            UpdateOrderCommand {
                customer_id: Some(0),
            },
        )
        .await
        .expect("update");
    assert_eq!(unchanged.customer_id, 1);

    let err = services
        .orders
        .update(
            order.id,
            UpdateOrderCommand {
                customer_id: Some(8),
            },
        )
        .await
        .expect_err("unknown customer");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn order_item_rules() {
    let services = with_catalog().await;
    let order = services
        .orders
        .create(CreateOrderCommand { customer_id: 1 })
        .await
        .expect("order");

    let err = services
        .order_items
        .create(CreateOrderItemCommand {
            order_id: 40,
            product_id: 1,
            quantity: 1,
        })
        .await
        .expect_err("unknown order");
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: "order",
            id: 40
        }
    ));

    let err = services
        .order_items
        .create(CreateOrderItemCommand {
            order_id: order.id,
            product_id: 1,
            quantity: 0,
        })
        .await
        .expect_err("zero quantity");
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::NotPositive {
            field: "quantity",
            ..
        })
    ));

    let item = services
        .order_items
        .create(CreateOrderItemCommand {
            order_id: order.id,
            product_id: 1,
            quantity: 3,
        })
        .await
        .expect("item");
    assert_eq!(
        services
            .order_items
            .find_by_product_id(1)
            .await
            .expect("list"),
        vec![item]
    );
}

#[tokio::test]
async fn inventory_rules() {
    let services = with_catalog().await;

    let err = services
        .inventory
        .create(CreateInventoryCommand {
            product_id: 2,
            quantity: 1,
        })
        .await
        .expect_err("unknown product");
    assert!(err.is_not_found());

    let err = services
        .inventory
        .create(CreateInventoryCommand {
            product_id: 1,
            quantity: -3,
        })
        .await
        .expect_err("negative stock");
    assert!(matches!(err, ServiceError::Domain(_)));

    let stock = services
        .inventory
        .create(CreateInventoryCommand {
            product_id: 1,
            quantity: 0,
        })
        .await
        .expect("stock");
    assert_eq!(
        services.inventory.find_all().await.expect("list"),
        vec![stock]
    );
}
