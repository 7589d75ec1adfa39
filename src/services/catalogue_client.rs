use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

use crate::models::Product;
use crate::observability::Metrics;

/// Product lookup against the catalogue service.
///
/// Any failure (transport, non-2xx, undecodable body) is reported as `None`.
#[async_trait]
pub trait CatalogueClient: Send + Sync {
    async fn find_product(&self, sku: &str) -> Option<Product>;
}

/// HTTP client for `GET {base_url}/product/:sku`
pub struct HttpCatalogueClient {
    client: reqwest::Client,
    base_url: String,
    metrics: Option<Arc<Metrics>>,
}

impl HttpCatalogueClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn record(&self, status: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_catalogue_lookup(status);
        }
    }
}

#[async_trait]
impl CatalogueClient for HttpCatalogueClient {
    #[instrument(skip(self), fields(otel.kind = "client"))]
    async fn find_product(&self, sku: &str) -> Option<Product> {
        let url = format!("{}/product/{}", self.base_url, sku);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                crate::warn_with_trace!(error = %e, "Catalogue request failed");
                self.record("error");
                return None;
            }
        };

        match response.status() {
            status if status.is_success() => match response.json::<Product>().await {
                Ok(product) => {
                    self.record("found");
                    Some(product)
                }
                Err(e) => {
                    warn!(error = %e, "Catalogue returned an unreadable product");
                    self.record("error");
                    None
                }
            },
            StatusCode::NOT_FOUND => {
                self.record("missing");
                None
            }
            status => {
                crate::warn_with_trace!(status = status.as_u16(), "Catalogue returned an error status");
                self.record("error");
                None
            }
        }
    }
}
