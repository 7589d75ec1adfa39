use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{RepositoryError, RepositoryResult, User};
use crate::observability::StoreTracing;

use super::connection::{RedisConnection, REDIS_STORE};
use super::dynamodb::DynamoDbTable;

/// Redis key holding the anonymous user counter
pub const ANONYMOUS_COUNTER_KEY: &str = "anonymous-counter";

/// Access to registered user documents
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<User>>;

    /// Insert a new user; fails with `ConstraintViolation` if the name is taken
    async fn create(&self, user: &User) -> RepositoryResult<()>;

    async fn ping(&self) -> RepositoryResult<()>;
}

/// Source of monotonically increasing ids
#[async_trait]
pub trait IdCounter: Send + Sync {
    async fn next_id(&self) -> RepositoryResult<i64>;
}

/// DynamoDB implementation keyed by `name`
pub struct DynamoDbUserRepository {
    table: DynamoDbTable,
}

impl DynamoDbUserRepository {
    pub fn new(table: DynamoDbTable) -> Self {
        Self { table }
    }

    pub fn user_to_item(&self, user: &User) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("name".to_string(), AttributeValue::S(user.name.clone())),
            ("password".to_string(), AttributeValue::S(user.password.clone())),
            ("email".to_string(), AttributeValue::S(user.email.clone())),
        ])
    }

    pub fn item_to_user(&self, item: &HashMap<String, AttributeValue>) -> RepositoryResult<User> {
        let field = |name: &str| item.get(name).and_then(|v| v.as_s().ok()).cloned();

        let name = field("name").ok_or_else(|| RepositoryError::InvalidItem {
            message: "Missing name".to_string(),
        })?;

        Ok(User {
            name,
            password: field("password").unwrap_or_default(),
            email: field("email").unwrap_or_default(),
        })
    }
}

#[async_trait]
impl UserRepository for DynamoDbUserRepository {
    #[instrument(skip(self), fields(table = %self.table.table_name()))]
    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<User>> {
        let response = self
            .table
            .call("GetItem", async {
                self.table
                    .client()
                    .get_item()
                    .table_name(self.table.table_name())
                    .key("name", AttributeValue::S(name.to_string()))
                    .send()
                    .await
                    .map_err(|e| self.table.map_error(e.into()))
            })
            .await?;

        response
            .item
            .as_ref()
            .map(|item| self.item_to_user(item))
            .transpose()
    }

    #[instrument(skip(self, user), fields(table = %self.table.table_name(), name = %user.name))]
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let item = self.user_to_item(user);

        self.table
            .call("PutItem", async {
                self.table
                    .client()
                    .put_item()
                    .table_name(self.table.table_name())
                    .set_item(Some(item))
                    .condition_expression("attribute_not_exists(#name)")
                    .expression_attribute_names("#name", "name")
                    .send()
                    .await
                    .map_err(|e| self.table.map_error(e.into()))
            })
            .await?;

        info!("User created");
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.table.ping().await
    }
}

/// Redis `INCR` counter
pub struct RedisIdCounter {
    connection: Arc<RedisConnection>,
    key: String,
    tracing: StoreTracing,
}

impl RedisIdCounter {
    pub fn new(connection: Arc<RedisConnection>) -> Self {
        Self {
            connection,
            key: ANONYMOUS_COUNTER_KEY.to_string(),
            tracing: StoreTracing::disabled(),
        }
    }

    pub fn with_tracing(mut self, tracing: StoreTracing) -> Self {
        self.tracing = tracing;
        self
    }
}

#[async_trait]
impl IdCounter for RedisIdCounter {
    #[instrument(skip(self), fields(store = REDIS_STORE, key = %self.key))]
    async fn next_id(&self) -> RepositoryResult<i64> {
        self.tracing
            .trace_operation("INCR", REDIS_STORE, async {
                let mut conn = self.connection.manager()?;
                self.connection.observe(conn.incr(&self.key, 1i64).await)
            })
            .await
    }
}
