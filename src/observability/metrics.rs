use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Prometheus metrics shared by the robot shop services
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Store metrics
    pub store_operations_total: CounterVec,
    pub store_operation_duration_seconds: HistogramVec,
    pub store_connected: GaugeVec,

    // Business metrics
    pub cart_items_added_total: CounterVec,
    pub catalogue_lookups_total: CounterVec,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.3, 0.5, 1.0, 2.0, 5.0]),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        let store_operations_total = CounterVec::new(
            Opts::new(
                "store_operations_total",
                "Total number of backing store operations",
            ),
            &["operation", "store", "status"],
        )?;

        let store_operation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "store_operation_duration_seconds",
                "Backing store operation duration in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["operation", "store"],
        )?;

        let store_connected = GaugeVec::new(
            Opts::new(
                "store_connected",
                "Whether the backing store connection is established (1) or not (0)",
            ),
            &["store"],
        )?;

        let cart_items_added_total = CounterVec::new(
            Opts::new(
                "cart_items_added_total",
                "Total number of items added to cart",
            ),
            &["service"],
        )?;

        let catalogue_lookups_total = CounterVec::new(
            Opts::new(
                "catalogue_lookups_total",
                "Total number of product lookups against the catalogue",
            ),
            &["status"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(store_operations_total.clone()))?;
        registry.register(Box::new(store_operation_duration_seconds.clone()))?;
        registry.register(Box::new(store_connected.clone()))?;
        registry.register(Box::new(cart_items_added_total.clone()))?;
        registry.register(Box::new(catalogue_lookups_total.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            store_operations_total,
            store_operation_duration_seconds,
            store_connected,
            cart_items_added_total,
            catalogue_lookups_total,
        })
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    /// Record HTTP request metrics
    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_str = status_code.to_string();

        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_str])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    /// Record a backing store operation
    pub fn record_store_operation(
        &self,
        operation: &str,
        store: &str,
        success: bool,
        duration_seconds: f64,
    ) {
        let status = if success { "success" } else { "error" };

        self.store_operations_total
            .with_label_values(&[operation, store, status])
            .inc();

        self.store_operation_duration_seconds
            .with_label_values(&[operation, store])
            .observe(duration_seconds);
    }

    /// Publish the current connectivity of a store
    pub fn set_store_connected(&self, store: &str, connected: bool) {
        self.store_connected
            .with_label_values(&[store])
            .set(if connected { 1.0 } else { 0.0 });
    }

    /// Count units added to carts
    pub fn record_cart_items_added(&self, qty: u32) {
        self.cart_items_added_total
            .with_label_values(&["cart"])
            .inc_by(f64::from(qty));
    }

    /// Count catalogue lookups by outcome (found, missing, error)
    pub fn record_catalogue_lookup(&self, status: &str) {
        self.catalogue_lookups_total
            .with_label_values(&[status])
            .inc();
    }

    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }
}
