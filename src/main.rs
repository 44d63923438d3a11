use std::{
    io::{self, Write},
    process,
    sync::Arc,
};

use serde::Serialize;
use storefront::{
    application::{Services, error::AppError},
    cache::{CacheConfig, CacheStatsSnapshot, CacheStore, EntityKind, WriteConsistency},
    config,
    infra::{db::PostgresRepositories, error::InfraError, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Policies(config::PoliciesArgs::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Policies(_) => run_policies(&settings),
        config::Command::Warm(_) => run_warm(&settings).await,
    }
}

#[derive(Debug, Serialize)]
struct PolicyReport {
    enabled: bool,
    consistency: WriteConsistency,
    sweep_interval_seconds: Option<u64>,
    policies: Vec<EntityPolicy>,
}

#[derive(Debug, Serialize)]
struct EntityPolicy {
    entity: EntityKind,
    sliding_seconds: u64,
    absolute_seconds: u64,
}

#[derive(Debug, Serialize)]
struct WarmReport {
    customers: usize,
    categories: usize,
    products: usize,
    inventory: usize,
    orders: usize,
    order_items: usize,
    stats: Vec<CacheStatsSnapshot>,
}

fn run_policies(settings: &config::Settings) -> Result<(), AppError> {
    let cache = CacheStore::new(CacheConfig::from(&settings.cache));
    let report = PolicyReport {
        enabled: cache.config().enabled,
        consistency: cache.consistency(),
        sweep_interval_seconds: cache.config().sweep_interval.map(|period| period.as_secs()),
        policies: cache
            .policies()
            .into_iter()
            .map(|(entity, policy)| EntityPolicy {
                entity,
                sliding_seconds: policy.sliding().as_secs(),
                absolute_seconds: policy.absolute().as_secs(),
            })
            .collect(),
    };

    print_json(&report)
}

async fn run_warm(settings: &config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(settings).await?;
    let cache = Arc::new(CacheStore::new(CacheConfig::from(&settings.cache)));
    let services = Services::new(repositories, cache.clone());

    info!(
        target = "storefront::warm",
        consistency = %cache.consistency(),
        enabled = cache.config().enabled,
        "Starting cache warm"
    );

    let customers = services.customers.find_all().await?;
    let categories = services.categories.find_all().await?;
    let products = services.products.find_all().await?;
    let inventory = services.inventory.find_all().await?;

    let mut orders = 0;
    let mut order_items = 0;
    for customer in &customers {
        let customer_orders = services.orders.find_by_customer_id(customer.id).await?;
        for order in &customer_orders {
            order_items += services.order_items.find_by_order_id(order.id).await?.len();
        }
        orders += customer_orders.len();
    }

    info!(
        target = "storefront::warm",
        entries = cache.len(),
        "Cache warm completed"
    );

    print_json(&WarmReport {
        customers: customers.len(),
        categories: categories.len(),
        products: products.len(),
        inventory: inventory.len(),
        orders,
        order_items,
        stats: cache.stats(),
    })
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let repositories = PostgresRepositories::new(pool);
    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(Arc::new(repositories))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(InfraError::from)?;
    writeln!(stdout).map_err(InfraError::from)?;
    Ok(())
}
