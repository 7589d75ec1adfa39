use std::sync::Arc;
use tracing::info;

use robotshop_rs::{
    handlers::{create_app, user::create_user_router, MonitoringState},
    init_observability,
    observability::{Metrics, StoreTracing},
    repositories::{
        spawn_supervisor, ConnectionState, DynamoDbTable, DynamoDbUserRepository,
        RedisConnection, RedisIdCounter, UserRepository, DYNAMODB_STORE,
    },
    server,
    services::UserService,
    Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment("user")?;

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
    info!("Users table: {}", config.dynamodb.users_table_name);
    info!("Redis: {}", config.redis.url());

    let metrics = Arc::new(Metrics::new()?);
    let store_tracing = StoreTracing::new(metrics.clone());
    let policy = config.retry.backoff_policy();

    let redis = Arc::new(RedisConnection::open(&config.redis.url())?);
    redis.spawn_supervisor(policy);
    let counter = Arc::new(RedisIdCounter::new(redis.clone()).with_tracing(store_tracing.clone()));

    let dynamodb_client = Arc::new(config.dynamodb.client().await);
    let table = DynamoDbTable::new(
        dynamodb_client,
        config.dynamodb.users_table_name.clone(),
        config.dynamodb.region.clone(),
    )
    .with_tracing(store_tracing);
    let user_repository = Arc::new(DynamoDbUserRepository::new(table));

    let users_state = Arc::new(ConnectionState::new(DYNAMODB_STORE));
    let store = user_repository.clone();
    spawn_supervisor(users_state.clone(), policy, move || {
        let store = store.clone();
        async move { store.ping().await }
    });

    let user_service = Arc::new(UserService::new(
        user_repository,
        counter,
        users_state.clone(),
    ));
    info!("Services initialized successfully");

    let app = create_app(
        create_user_router(user_service),
        MonitoringState::new(metrics, vec![redis.state(), users_state]),
        config.server.request_timeout(),
    );

    server::serve(app, &config.server).await
}
