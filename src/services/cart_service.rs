use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    parse_add_quantity, parse_update_quantity, validate_cart_id, Cart, CartItem, ServiceError,
    ServiceResult, ShippingRequest,
};
use crate::observability::Metrics;
use crate::repositories::CartRepository;

use super::CatalogueClient;

/// Service for managing shopping carts
pub struct CartService {
    cart_repository: Arc<dyn CartRepository>,
    catalogue: Arc<dyn CatalogueClient>,
    metrics: Option<Arc<Metrics>>,
}

impl CartService {
    pub fn new(cart_repository: Arc<dyn CartRepository>, catalogue: Arc<dyn CatalogueClient>) -> Self {
        Self {
            cart_repository,
            catalogue,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Get a stored cart
    #[instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: &str) -> ServiceResult<Cart> {
        validate_cart_id(cart_id)?;
        self.load(cart_id).await
    }

    /// Delete a stored cart
    #[instrument(skip(self))]
    pub async fn delete_cart(&self, cart_id: &str) -> ServiceResult<()> {
        validate_cart_id(cart_id)?;

        if !self.cart_repository.delete_cart(cart_id).await? {
            return Err(ServiceError::CartNotFound {
                cart_id: cart_id.to_string(),
            });
        }

        info!("Cart deleted");
        Ok(())
    }

    /// Add `qty` units of `sku`, creating the cart on first add.
    ///
    /// The quantity is checked before any catalogue or store access.
    #[instrument(skip(self))]
    pub async fn add_item(&self, cart_id: &str, sku: &str, qty: &str) -> ServiceResult<Cart> {
        let qty = parse_add_quantity(qty).map_err(|_| ServiceError::ValidationError {
            message: "quantity must be a positive number".to_string(),
        })?;
        validate_cart_id(cart_id)?;

        let product = self
            .catalogue
            .find_product(sku)
            .await
            .ok_or_else(|| ServiceError::ProductNotFound {
                sku: sku.to_string(),
            })?;

        if !product.is_in_stock() {
            return Err(ServiceError::OutOfStock {
                sku: sku.to_string(),
            });
        }

        let mut cart = self
            .cart_repository
            .find_cart(cart_id)
            .await?
            .unwrap_or_default();

        // Overflow is a 400 and nothing is written
        cart.add_item(CartItem::new(product.sku, product.name, product.price, qty)?)?;
        self.cart_repository.save_cart(cart_id, &cart).await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_cart_items_added(qty);
        }

        crate::info_with_trace!(qty, total = %cart.total, "Item added to cart");
        Ok(cart)
    }

    /// Set the quantity of a line already in the cart; zero removes it
    #[instrument(skip(self))]
    pub async fn update_item(&self, cart_id: &str, sku: &str, qty: &str) -> ServiceResult<Cart> {
        let qty = parse_update_quantity(qty)?;
        validate_cart_id(cart_id)?;

        let mut cart = self.load(cart_id).await?;

        if !cart.update_item_quantity(sku, qty)? {
            return Err(ServiceError::CartItemNotFound {
                sku: sku.to_string(),
                cart_id: cart_id.to_string(),
            });
        }

        self.cart_repository.save_cart(cart_id, &cart).await?;
        Ok(cart)
    }

    /// Move the cart at `from` to `to`, merging into an existing cart there
    #[instrument(skip(self))]
    pub async fn rename_cart(&self, from: &str, to: &str) -> ServiceResult<Cart> {
        validate_cart_id(from)?;
        validate_cart_id(to)?;

        let source = self.load(from).await?;
        if from == to {
            return Ok(source);
        }

        let cart = match self.cart_repository.find_cart(to).await? {
            Some(mut destination) => {
                destination.absorb(source)?;
                destination
            }
            None => source,
        };

        self.cart_repository.save_cart(to, &cart).await?;
        self.cart_repository.delete_cart(from).await?;

        crate::info_with_trace!(items = cart.items.len(), "Cart renamed");
        Ok(cart)
    }

    /// Replace the shipping line of a cart
    #[instrument(skip(self, request), fields(location = %request.location))]
    pub async fn add_shipping(&self, cart_id: &str, request: &ShippingRequest) -> ServiceResult<Cart> {
        validate_cart_id(cart_id)?;

        if request.location.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "shipping data missing".to_string(),
            });
        }

        let mut cart = self.load(cart_id).await?;
        cart.set_shipping(request)?;
        self.cart_repository.save_cart(cart_id, &cart).await?;

        Ok(cart)
    }

    async fn load(&self, cart_id: &str) -> ServiceResult<Cart> {
        self.cart_repository
            .find_cart(cart_id)
            .await?
            .ok_or_else(|| ServiceError::CartNotFound {
                cart_id: cart_id.to_string(),
            })
    }
}
