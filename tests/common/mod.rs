#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use reqwest::Client;
use rust_decimal_macros::dec;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use robotshop_rs::handlers::{
    cart::create_cart_router, catalogue::create_catalogue_router, create_app,
    user::create_user_router, MonitoringState,
};
use robotshop_rs::models::{Cart, Product, RepositoryError, RepositoryResult, User};
use robotshop_rs::observability::Metrics;
use robotshop_rs::repositories::{
    distinct_categories, filter_by_category, CartRepository, ConnectionState, IdCounter,
    ProductRepository, UserRepository, DYNAMODB_STORE, REDIS_STORE,
};
use robotshop_rs::services::{CartService, CatalogueService, HttpCatalogueClient, UserService};

/// Cart store backed by a map instead of Redis
#[derive(Default)]
pub struct InMemoryCartRepository {
    carts: Mutex<HashMap<String, Cart>>,
}

impl InMemoryCartRepository {
    pub async fn contains(&self, cart_id: &str) -> bool {
        self.carts.lock().await.contains_key(cart_id)
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find_cart(&self, cart_id: &str) -> RepositoryResult<Option<Cart>> {
        Ok(self.carts.lock().await.get(cart_id).cloned())
    }

    async fn save_cart(&self, cart_id: &str, cart: &Cart) -> RepositoryResult<()> {
        self.carts
            .lock()
            .await
            .insert(cart_id.to_string(), cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, cart_id: &str) -> RepositoryResult<bool> {
        Ok(self.carts.lock().await.remove(cart_id).is_some())
    }
}

/// Fixed product list standing in for the DynamoDB table
pub struct InMemoryProductRepository {
    products: Vec<Product>,
}

impl InMemoryProductRepository {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        Ok(self.products.clone())
    }

    async fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        Ok(self.products.iter().find(|p| p.sku == sku).cloned())
    }

    async fn find_by_category(&self, category: &str) -> RepositoryResult<Vec<Product>> {
        Ok(filter_by_category(self.products.clone(), category))
    }

    async fn categories(&self) -> RepositoryResult<Vec<String>> {
        Ok(distinct_categories(&self.products))
    }

    async fn search(&self, text: &str) -> RepositoryResult<Vec<Product>> {
        Ok(self
            .products
            .iter()
            .filter(|p| p.matches_text(text))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<User>> {
        Ok(self.users.lock().await.get(name).cloned())
    }

    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.name) {
            return Err(RepositoryError::ConstraintViolation {
                message: format!("user {} exists", user.name),
            });
        }
        users.insert(user.name.clone(), user.clone());
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryIdCounter {
    value: AtomicI64,
}

#[async_trait]
impl IdCounter for InMemoryIdCounter {
    async fn next_id(&self) -> RepositoryResult<i64> {
        Ok(self.value.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            sku: "Watson".to_string(),
            name: "Watson".to_string(),
            description: "Quiz champion robot".to_string(),
            price: dec!(2001),
            instock: 2,
            categories: vec!["Artificial Intelligence".to_string()],
        },
        Product {
            sku: "HAL-1".to_string(),
            name: "HAL".to_string(),
            description: "Sorry Dave, I can't do that".to_string(),
            price: dec!(2001),
            instock: 0,
            categories: vec!["Artificial Intelligence".to_string()],
        },
        Product {
            sku: "RD-10".to_string(),
            name: "Responsive Dusting Droid".to_string(),
            description: "Keeps the house spotless".to_string(),
            price: dec!(42),
            instock: 10,
            categories: vec!["Robot".to_string()],
        },
    ]
}

/// The three services served on ephemeral ports against in-memory stores.
///
/// The cart service reaches the catalogue over real HTTP.
pub struct TestEnvironment {
    pub client: Client,
    pub cart_url: String,
    pub catalogue_url: String,
    pub user_url: String,
    pub carts: Arc<InMemoryCartRepository>,
    pub products_state: Arc<ConnectionState>,
    pub users_state: Arc<ConnectionState>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let timeout = Duration::from_secs(5);

        let products_state = connected(DYNAMODB_STORE);
        let catalogue_service = Arc::new(CatalogueService::new(
            Arc::new(InMemoryProductRepository::new(sample_products())),
            products_state.clone(),
        ));
        let catalogue_url = spawn_app(create_app(
            create_catalogue_router(catalogue_service),
            monitoring(vec![products_state.clone()]),
            timeout,
        ))
        .await;

        let carts = Arc::new(InMemoryCartRepository::default());
        let catalogue_client = HttpCatalogueClient::new(catalogue_url.clone(), timeout)
            .expect("Failed to build catalogue client");
        let cart_service = Arc::new(CartService::new(carts.clone(), Arc::new(catalogue_client)));
        let cart_url = spawn_app(create_app(
            create_cart_router(cart_service),
            monitoring(vec![connected(REDIS_STORE)]),
            timeout,
        ))
        .await;

        let users_state = connected(DYNAMODB_STORE);
        let user_service = Arc::new(UserService::new(
            Arc::new(InMemoryUserRepository::default()),
            Arc::new(InMemoryIdCounter::default()),
            users_state.clone(),
        ));
        let user_url = spawn_app(create_app(
            create_user_router(user_service),
            monitoring(vec![connected(REDIS_STORE), users_state.clone()]),
            timeout,
        ))
        .await;

        Self {
            client: Client::new(),
            cart_url,
            catalogue_url,
            user_url,
            carts,
            products_state,
            users_state,
        }
    }
}

fn connected(store: &str) -> Arc<ConnectionState> {
    let state = Arc::new(ConnectionState::new(store));
    state.mark_connected();
    state
}

fn monitoring(stores: Vec<Arc<ConnectionState>>) -> MonitoringState {
    MonitoringState::new(
        Arc::new(Metrics::new().expect("Failed to create metrics")),
        stores,
    )
}

async fn spawn_app(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Test server failed");
    });

    format!("http://{}", addr)
}
