// Repositories module - data access layer

pub mod cart_repository;
pub mod connection;
pub mod dynamodb;
pub mod product_repository;
pub mod user_repository;

#[cfg(test)]
mod tests;

pub use cart_repository::{CartRepository, RedisCartRepository};
pub use connection::{
    spawn_supervisor, supervise, BackoffPolicy, ConnectionState, RedisConnection, DYNAMODB_STORE,
    REDIS_STORE,
};
pub use dynamodb::DynamoDbTable;
pub use product_repository::{
    distinct_categories, filter_by_category, DynamoDbProductRepository, ProductRepository,
};
pub use user_repository::{DynamoDbUserRepository, IdCounter, RedisIdCounter, UserRepository};
