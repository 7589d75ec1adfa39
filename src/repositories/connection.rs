use redis::aio::ConnectionManager;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::models::{RepositoryError, RepositoryResult};

pub const REDIS_STORE: &str = "redis";
pub const DYNAMODB_STORE: &str = "dynamodb";

/// Connectivity flag for one backing store, shared between the supervisor,
/// the repositories and the health endpoint.
#[derive(Debug)]
pub struct ConnectionState {
    store: String,
    connected: AtomicBool,
}

impl ConnectionState {
    pub fn new(store: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            connected: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn mark_connected(&self) {
        if !self.connected.swap(true, Ordering::AcqRel) {
            info!(store = %self.store, "Store connected");
        }
    }

    pub fn mark_disconnected(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            warn!(store = %self.store, "Store connection lost");
        }
    }
}

/// Exponential backoff: `initial * 2^(attempt-1)`, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    initial: Duration,
    max: Duration,
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }

    /// Delay before retrying after the given 1-based failed attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial
            .checked_mul(multiplier)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(30))
    }
}

/// Retry `connect` until it succeeds, sleeping per `policy` between attempts.
///
/// `state` is marked disconnected on each failure and connected on success.
pub async fn supervise<T, E, F, Fut>(state: &ConnectionState, policy: BackoffPolicy, mut connect: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match connect().await {
            Ok(value) => {
                state.mark_connected();
                info!(store = %state.store(), attempt, "Store connection established");
                return value;
            }
            Err(error) => {
                state.mark_disconnected();
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    store = %state.store(),
                    attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %error,
                    "Store connection failed"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Run [`supervise`] on a background task, discarding the connected value
pub fn spawn_supervisor<T, E, F, Fut>(
    state: Arc<ConnectionState>,
    policy: BackoffPolicy,
    connect: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    E: Display + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    tokio::spawn(async move {
        supervise(&state, policy, connect).await;
    })
}

/// Lazily established Redis connection.
///
/// Repositories can be built before Redis is reachable; until the supervisor
/// succeeds every call fails with `NotConnected`.
pub struct RedisConnection {
    client: redis::Client,
    manager: OnceCell<ConnectionManager>,
    state: Arc<ConnectionState>,
}

impl RedisConnection {
    /// Parse the URL; no network I/O happens here
    pub fn open(url: &str) -> RepositoryResult<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            manager: OnceCell::new(),
            state: Arc::new(ConnectionState::new(REDIS_STORE)),
        })
    }

    pub fn state(&self) -> Arc<ConnectionState> {
        Arc::clone(&self.state)
    }

    /// Connect in the background, retrying with backoff
    pub fn spawn_supervisor(self: &Arc<Self>, policy: BackoffPolicy) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let manager = supervise(&this.state, policy, || {
                let client = this.client.clone();
                async move { client.get_connection_manager().await }
            })
            .await;

            if this.manager.set(manager).is_err() {
                warn!("Redis connection manager was already initialized");
            }
        })
    }

    /// Handle for issuing commands; cheap to clone
    pub fn manager(&self) -> RepositoryResult<ConnectionManager> {
        self.manager
            .get()
            .cloned()
            .ok_or_else(|| RepositoryError::NotConnected {
                store: REDIS_STORE.to_string(),
            })
    }

    /// Track connectivity from a command result and convert its error
    pub fn observe<T>(&self, result: redis::RedisResult<T>) -> RepositoryResult<T> {
        match result {
            Ok(value) => {
                self.state.mark_connected();
                Ok(value)
            }
            Err(error) => {
                if error.is_connection_dropped()
                    || error.is_connection_refusal()
                    || error.is_io_error()
                    || error.is_timeout()
                {
                    self.state.mark_disconnected();
                }
                Err(error.into())
            }
        }
    }
}
