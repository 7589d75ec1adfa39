use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::models::{Product, ServiceError, ServiceResult};
use crate::repositories::{ConnectionState, ProductRepository};

/// Read-only product catalogue
pub struct CatalogueService {
    repository: Arc<dyn ProductRepository>,
    state: Arc<ConnectionState>,
    go_slow: Duration,
}

impl CatalogueService {
    pub fn new(repository: Arc<dyn ProductRepository>, state: Arc<ConnectionState>) -> Self {
        Self {
            repository,
            state,
            go_slow: Duration::ZERO,
        }
    }

    /// Artificial delay applied to single product lookups
    pub fn with_go_slow(mut self, delay: Duration) -> Self {
        self.go_slow = delay;
        self
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        self.ensure_connected()?;
        Ok(self.repository.find_all().await?)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, sku: &str) -> ServiceResult<Product> {
        self.ensure_connected()?;

        if !self.go_slow.is_zero() {
            tokio::time::sleep(self.go_slow).await;
        }

        self.repository
            .find_by_sku(sku)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound {
                sku: sku.to_string(),
            })
    }

    #[instrument(skip(self))]
    pub async fn products_in_category(&self, category: &str) -> ServiceResult<Vec<Product>> {
        self.ensure_connected()?;
        let products = self.repository.find_by_category(category).await?;
        info!(count = products.len(), "Products in category");
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn categories(&self) -> ServiceResult<Vec<String>> {
        self.ensure_connected()?;
        Ok(self.repository.categories().await?)
    }

    #[instrument(skip(self))]
    pub async fn search(&self, text: &str) -> ServiceResult<Vec<Product>> {
        self.ensure_connected()?;
        Ok(self.repository.search(text).await?)
    }

    fn ensure_connected(&self) -> ServiceResult<()> {
        if self.state.is_connected() {
            Ok(())
        } else {
            Err(ServiceError::StoreUnavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryError;
    use async_trait::async_trait;
    use mockall::{mock, predicate::eq};
    use rust_decimal_macros::dec;

    mock! {
        TestProductRepository {}

        #[async_trait]
        impl ProductRepository for TestProductRepository {
            async fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;
            async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError>;
            async fn find_by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError>;
            async fn categories(&self) -> Result<Vec<String>, RepositoryError>;
            async fn search(&self, text: &str) -> Result<Vec<Product>, RepositoryError>;
            async fn ping(&self) -> Result<(), RepositoryError>;
        }
    }

    fn connected() -> Arc<ConnectionState> {
        let state = Arc::new(ConnectionState::new("dynamodb"));
        state.mark_connected();
        state
    }

    fn create_test_product() -> Product {
        Product {
            sku: "Watson".to_string(),
            name: "Watson".to_string(),
            description: "Quiz champion".to_string(),
            price: dec!(2001),
            instock: 2,
            categories: vec!["Artificial Intelligence".to_string()],
        }
    }

    #[tokio::test]
    async fn test_unavailable_until_connected() {
        let state = Arc::new(ConnectionState::new("dynamodb"));
        let mut repo = MockTestProductRepository::new();
        repo.expect_find_all().returning(|| Ok(vec![]));

        let service = CatalogueService::new(Arc::new(repo), state.clone());

        assert!(matches!(
            service.list_products().await,
            Err(ServiceError::StoreUnavailable)
        ));
        assert!(matches!(
            service.categories().await,
            Err(ServiceError::StoreUnavailable)
        ));

        state.mark_connected();
        assert!(service.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_product() {
        let mut repo = MockTestProductRepository::new();
        repo.expect_find_by_sku()
            .with(eq("Watson".to_string()))
            .returning(|_| Ok(Some(create_test_product())));
        repo.expect_find_by_sku()
            .with(eq("Nope".to_string()))
            .returning(|_| Ok(None));

        let service = CatalogueService::new(Arc::new(repo), connected());

        assert_eq!(service.get_product("Watson").await.unwrap().price, dec!(2001));
        assert!(matches!(
            service.get_product("Nope").await,
            Err(ServiceError::ProductNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_go_slow_delays_lookup() {
        let mut repo = MockTestProductRepository::new();
        repo.expect_find_by_sku()
            .returning(|_| Ok(Some(create_test_product())));

        let service = CatalogueService::new(Arc::new(repo), connected())
            .with_go_slow(Duration::from_millis(50));

        let start = std::time::Instant::now();
        service.get_product("Watson").await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut repo = MockTestProductRepository::new();
        repo.expect_search().returning(|_| {
            Err(RepositoryError::TableNotFound {
                table_name: "RobotShopProducts".to_string(),
            })
        });

        let service = CatalogueService::new(Arc::new(repo), connected());

        assert!(matches!(
            service.search("robot").await,
            Err(ServiceError::Repository { .. })
        ));
    }
}
