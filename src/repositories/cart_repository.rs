use async_trait::async_trait;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::models::{Cart, RepositoryResult};
use crate::observability::StoreTracing;

use super::connection::{RedisConnection, REDIS_STORE};

/// Trait defining the interface for cart data access operations
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Find a cart by its id
    async fn find_cart(&self, cart_id: &str) -> RepositoryResult<Option<Cart>>;

    /// Overwrite the cart and restart its expiry window
    async fn save_cart(&self, cart_id: &str, cart: &Cart) -> RepositoryResult<()>;

    /// Delete a cart, returning whether it existed
    async fn delete_cart(&self, cart_id: &str) -> RepositoryResult<bool>;
}

/// Redis implementation storing each cart as a JSON string with a TTL
pub struct RedisCartRepository {
    connection: Arc<RedisConnection>,
    ttl: Duration,
    tracing: StoreTracing,
}

impl RedisCartRepository {
    pub fn new(connection: Arc<RedisConnection>, ttl: Duration) -> Self {
        Self {
            connection,
            ttl,
            tracing: StoreTracing::disabled(),
        }
    }

    pub fn with_tracing(mut self, tracing: StoreTracing) -> Self {
        self.tracing = tracing;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Serialize a cart to the stored JSON value
pub fn cart_to_value(cart: &Cart) -> RepositoryResult<String> {
    Ok(serde_json::to_string(cart)?)
}

/// Parse a stored JSON value back into a cart
pub fn value_to_cart(value: &str) -> RepositoryResult<Cart> {
    Ok(serde_json::from_str(value)?)
}

#[async_trait]
impl CartRepository for RedisCartRepository {
    #[instrument(skip(self), fields(store = REDIS_STORE))]
    async fn find_cart(&self, cart_id: &str) -> RepositoryResult<Option<Cart>> {
        let value: Option<String> = self
            .tracing
            .trace_operation("GET", REDIS_STORE, async {
                let mut conn = self.connection.manager()?;
                self.connection.observe(conn.get(cart_id).await)
            })
            .await?;

        match value {
            Some(value) => {
                let cart = value_to_cart(&value)?;
                debug!(items = cart.items.len(), "Cart found");
                Ok(Some(cart))
            }
            None => {
                debug!("Cart not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, cart), fields(store = REDIS_STORE, items = cart.items.len()))]
    async fn save_cart(&self, cart_id: &str, cart: &Cart) -> RepositoryResult<()> {
        let value = cart_to_value(cart)?;
        let ttl_seconds = self.ttl.as_secs();

        self.tracing
            .trace_operation("SETEX", REDIS_STORE, async {
                let mut conn = self.connection.manager()?;
                self.connection
                    .observe(conn.set_ex::<_, _, ()>(cart_id, value, ttl_seconds).await)
            })
            .await
    }

    #[instrument(skip(self), fields(store = REDIS_STORE))]
    async fn delete_cart(&self, cart_id: &str) -> RepositoryResult<bool> {
        let removed: u64 = self
            .tracing
            .trace_operation("DEL", REDIS_STORE, async {
                let mut conn = self.connection.manager()?;
                self.connection.observe(conn.del(cart_id).await)
            })
            .await?;

        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartItem, RepositoryError};
    use rust_decimal_macros::dec;

    fn create_repository() -> RedisCartRepository {
        let connection = Arc::new(RedisConnection::open("redis://127.0.0.1:6379").unwrap());
        RedisCartRepository::new(connection, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_operations_fail_fast_before_connect() {
        let repo = create_repository();

        let result = repo.find_cart("anonymous-1").await;
        assert!(matches!(result, Err(RepositoryError::NotConnected { .. })));

        let result = repo.save_cart("anonymous-1", &Cart::new()).await;
        assert!(matches!(result, Err(RepositoryError::NotConnected { .. })));

        let result = repo.delete_cart("anonymous-1").await;
        assert!(matches!(result, Err(RepositoryError::NotConnected { .. })));
    }

    #[test]
    fn test_ttl_is_kept() {
        assert_eq!(create_repository().ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_stored_value_shape() {
        let mut cart = Cart::new();
        cart.add_item(
            CartItem::new("EMM".to_string(), "Ewooid".to_string(), dec!(200), 1).unwrap(),
        )
        .unwrap();

        let value = cart_to_value(&cart).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&value).unwrap();

        assert_eq!(raw["total"], serde_json::json!(200.0));
        assert_eq!(raw["items"][0]["sku"], "EMM");
        assert_eq!(value_to_cart(&value).unwrap().items, cart.items);
    }

    #[test]
    fn test_corrupt_value_is_serialization_error() {
        assert!(matches!(
            value_to_cart("{not json"),
            Err(RepositoryError::Serialization { .. })
        ));
    }
}
