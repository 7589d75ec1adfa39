use std::sync::Arc;
use tracing::info;

use robotshop_rs::{
    handlers::{catalogue::create_catalogue_router, create_app, MonitoringState},
    init_observability,
    observability::{Metrics, StoreTracing},
    repositories::{
        spawn_supervisor, ConnectionState, DynamoDbProductRepository, DynamoDbTable,
        ProductRepository, DYNAMODB_STORE,
    },
    server,
    services::CatalogueService,
    Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment("catalogue")?;

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref(),
        config.observability.enable_json_logging,
    )?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.dynamodb.region);
    info!("Products table: {}", config.dynamodb.products_table_name);

    let metrics = Arc::new(Metrics::new()?);

    let dynamodb_client = Arc::new(config.dynamodb.client().await);
    let table = DynamoDbTable::new(
        dynamodb_client,
        config.dynamodb.products_table_name.clone(),
        config.dynamodb.region.clone(),
    )
    .with_tracing(StoreTracing::new(metrics.clone()));
    let product_repository = Arc::new(DynamoDbProductRepository::new(table));

    // Serve 500s until the table answers
    let products_state = Arc::new(ConnectionState::new(DYNAMODB_STORE));
    let store = product_repository.clone();
    spawn_supervisor(
        products_state.clone(),
        config.retry.backoff_policy(),
        move || {
            let store = store.clone();
            async move { store.ping().await }
        },
    );

    let catalogue_service = Arc::new(
        CatalogueService::new(product_repository, products_state.clone())
            .with_go_slow(config.server.go_slow()),
    );
    info!("Services initialized successfully");

    let app = create_app(
        create_catalogue_router(catalogue_service),
        MonitoringState::new(metrics, vec![products_state]),
        config.server.request_timeout(),
    );

    server::serve(app, &config.server).await
}
