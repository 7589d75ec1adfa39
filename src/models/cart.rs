use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ValidationError, ValidationResult};

/// Prices are tax inclusive at 20%, so the net amount is `total / 1.2`.
pub const TAX_DIVISOR: Decimal = dec!(1.2);

/// SKU reserved for the shipping line added by the shipping service
pub const SHIPPING_SKU: &str = "SHIP";

/// Shopping cart stored under a caller-supplied cart id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Cart {
    pub total: Decimal,
    pub tax: Decimal,
    pub items: Vec<CartItem>,
}

/// One SKU's line within a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub qty: u32,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub subtotal: Decimal,
}

/// Body posted by the shipping service when a delivery is confirmed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingRequest {
    #[serde(default)]
    pub distance: Decimal,
    pub cost: Decimal,
    pub location: String,
}

impl CartItem {
    /// Create a line item; the subtotal is derived from qty and price
    pub fn new(sku: String, name: String, price: Decimal, qty: u32) -> ValidationResult<Self> {
        Ok(Self {
            qty,
            sku,
            name,
            price,
            subtotal: line_subtotal(price, qty)?,
        })
    }

    /// Set the quantity and recompute the subtotal; unchanged on error
    pub fn set_qty(&mut self, qty: u32) -> ValidationResult<()> {
        self.subtotal = line_subtotal(self.price, qty)?;
        self.qty = qty;
        Ok(())
    }
}

fn line_subtotal(price: Decimal, qty: u32) -> ValidationResult<Decimal> {
    price
        .checked_mul(Decimal::from(qty))
        .ok_or_else(|| overflow("subtotal"))
}

fn overflow(field: &str) -> ValidationError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
}

/// Merge `item` into `items` by SKU.
///
/// An existing line accumulates the new quantity and keeps its original
/// name and price; a new SKU is appended. Insertion order never changes.
pub fn merge_item(items: &mut Vec<CartItem>, item: CartItem) -> ValidationResult<()> {
    match items.iter_mut().find(|existing| existing.sku == item.sku) {
        Some(existing) => {
            let qty = existing
                .qty
                .checked_add(item.qty)
                .ok_or_else(|| overflow("qty"))?;
            existing.set_qty(qty)
        }
        None => {
            items.push(item);
            Ok(())
        }
    }
}

/// Sum of all line subtotals
pub fn calculate_total(items: &[CartItem]) -> ValidationResult<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        total
            .checked_add(item.subtotal)
            .ok_or_else(|| overflow("total"))
    })
}

/// Portion of `total` attributable to a 20% inclusive tax rate
pub fn calculate_tax(total: Decimal) -> Decimal {
    total - total / TAX_DIVISOR
}

impl Cart {
    /// Create an empty cart
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an item and refresh the derived totals.
    ///
    /// On overflow the cart is left as it was.
    pub fn add_item(&mut self, item: CartItem) -> ValidationResult<()> {
        let mut items = self.items.clone();
        merge_item(&mut items, item)?;
        self.replace_items(items)
    }

    /// Set the quantity of an existing line; zero removes it.
    ///
    /// Returns false when the SKU is not in the cart.
    pub fn update_item_quantity(&mut self, sku: &str, qty: u32) -> ValidationResult<bool> {
        let Some(position) = self.items.iter().position(|item| item.sku == sku) else {
            return Ok(false);
        };

        let mut items = self.items.clone();
        if qty == 0 {
            items.remove(position);
        } else {
            items[position].set_qty(qty)?;
        }
        self.replace_items(items)?;
        Ok(true)
    }

    /// Merge every line of `other` into this cart, in `other`'s order
    pub fn absorb(&mut self, other: Cart) -> ValidationResult<()> {
        let mut items = self.items.clone();
        for item in other.items {
            merge_item(&mut items, item)?;
        }
        self.replace_items(items)
    }

    /// Replace any shipping line with a fresh one for `request`
    pub fn set_shipping(&mut self, request: &ShippingRequest) -> ValidationResult<()> {
        let mut items: Vec<CartItem> = self
            .items
            .iter()
            .filter(|item| item.sku != SHIPPING_SKU)
            .cloned()
            .collect();
        items.push(CartItem::new(
            SHIPPING_SKU.to_string(),
            format!("shipping to {}", request.location),
            request.cost,
            1,
        )?);
        self.replace_items(items)
    }

    /// Swap in `items` and recompute total and tax
    fn replace_items(&mut self, items: Vec<CartItem>) -> ValidationResult<()> {
        let total = calculate_total(&items)?;
        self.items = items;
        self.total = total;
        self.tax = calculate_tax(total);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_item(&self, sku: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.sku == sku)
    }

    /// Total number of units across all lines
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.qty)).sum()
    }
}
