use std::sync::Arc;
use tracing::info;

use robotshop_rs::{
    handlers::{cart::create_cart_router, create_app, MonitoringState},
    init_observability,
    observability::{Metrics, StoreTracing},
    repositories::{RedisCartRepository, RedisConnection},
    server,
    services::{CartService, HttpCatalogueClient},
    Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment("cart")?;

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
    info!("Redis: {}", config.redis.url());
    info!("Catalogue: {}", config.catalogue.base_url());

    let metrics = Arc::new(Metrics::new()?);
    let store_tracing = StoreTracing::new(metrics.clone());

    // Redis may come up after us; the supervisor keeps retrying
    let redis = Arc::new(RedisConnection::open(&config.redis.url())?);
    redis.spawn_supervisor(config.retry.backoff_policy());

    let cart_repository = Arc::new(
        RedisCartRepository::new(redis.clone(), config.redis.cart_ttl())
            .with_tracing(store_tracing),
    );
    let catalogue = Arc::new(
        HttpCatalogueClient::new(config.catalogue.base_url(), config.catalogue.timeout())?
            .with_metrics(metrics.clone()),
    );

    let cart_service = Arc::new(
        CartService::new(cart_repository, catalogue).with_metrics(metrics.clone()),
    );
    info!("Services initialized successfully");

    let app = create_app(
        create_cart_router(cart_service),
        MonitoringState::new(metrics, vec![redis.state()]),
        config.server.request_timeout(),
    );

    server::serve(app, &config.server).await
}
