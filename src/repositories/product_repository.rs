use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use tracing::{info, instrument, warn};

use crate::models::{Product, RepositoryError, RepositoryResult};

use super::dynamodb::DynamoDbTable;

type Item = HashMap<String, AttributeValue>;

/// Read access to the product catalogue
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_all(&self) -> RepositoryResult<Vec<Product>>;

    async fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>>;

    /// Products listed under `category`, sorted by name
    async fn find_by_category(&self, category: &str) -> RepositoryResult<Vec<Product>>;

    /// Distinct categories across all products, sorted
    async fn categories(&self) -> RepositoryResult<Vec<String>>;

    /// Case-insensitive substring search over name and description
    async fn search(&self, text: &str) -> RepositoryResult<Vec<Product>>;

    /// Verify the store is reachable
    async fn ping(&self) -> RepositoryResult<()>;
}

/// DynamoDB implementation keyed by `sku`
pub struct DynamoDbProductRepository {
    table: DynamoDbTable,
}

impl DynamoDbProductRepository {
    pub fn new(table: DynamoDbTable) -> Self {
        Self { table }
    }

    pub fn table_name(&self) -> &str {
        self.table.table_name()
    }

    /// Build the item a seeded product is stored as; the catalogue itself never writes
    #[cfg(test)]
    pub(crate) fn product_to_item(&self, product: &Product) -> Item {
        let mut item = HashMap::new();

        item.insert("sku".to_string(), AttributeValue::S(product.sku.clone()));
        item.insert("name".to_string(), AttributeValue::S(product.name.clone()));
        item.insert(
            "description".to_string(),
            AttributeValue::S(product.description.clone()),
        );
        item.insert(
            "price".to_string(),
            AttributeValue::N(product.price.to_string()),
        );
        item.insert(
            "instock".to_string(),
            AttributeValue::N(product.instock.to_string()),
        );
        // Empty string sets are rejected by DynamoDB, so categories are a list
        item.insert(
            "categories".to_string(),
            AttributeValue::L(
                product
                    .categories
                    .iter()
                    .map(|c| AttributeValue::S(c.clone()))
                    .collect(),
            ),
        );

        item
    }

    /// Convert a DynamoDB item to a Product
    pub fn item_to_product(&self, item: &Item) -> RepositoryResult<Product> {
        let sku = required_string(item, "sku")?;
        let name = required_string(item, "name")?;

        let price = item
            .get("price")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| Decimal::from_str(n).ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: format!("Invalid price for product {}", sku),
            })?;

        let instock = match item.get("instock").and_then(|v| v.as_n().ok()) {
            Some(n) => n.parse::<u32>().map_err(|_| RepositoryError::InvalidItem {
                message: format!("Invalid instock for product {}", sku),
            })?,
            None => 0,
        };

        let description = item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();

        let categories = match item.get("categories") {
            Some(AttributeValue::L(list)) => list
                .iter()
                .filter_map(|v| v.as_s().ok().cloned())
                .collect(),
            Some(AttributeValue::Ss(set)) => set.clone(),
            _ => Vec::new(),
        };

        Ok(Product {
            sku,
            name,
            description,
            price,
            instock,
            categories,
        })
    }

    /// Scan every page of the table, skipping unparseable items.
    ///
    /// With a category, `contains()` narrows the scan server side.
    async fn scan_all(&self, category: Option<&str>) -> RepositoryResult<Vec<Product>> {
        let mut products = Vec::new();
        let mut start_key: Option<Item> = None;

        let filter = category.map(|_| "contains(categories, :cat)".to_string());
        let values = category.map(|cat| {
            HashMap::from([(":cat".to_string(), AttributeValue::S(cat.to_string()))])
        });

        loop {
            let response = self
                .table
                .call("Scan", async {
                    self.table
                        .client()
                        .scan()
                        .table_name(self.table.table_name())
                        .set_filter_expression(filter.clone())
                        .set_expression_attribute_values(values.clone())
                        .set_exclusive_start_key(start_key.clone())
                        .send()
                        .await
                        .map_err(|e| self.table.map_error(e.into()))
                })
                .await?;

            for item in response.items() {
                match self.item_to_product(item) {
                    Ok(product) => products.push(product),
                    Err(e) => warn!("Skipping product item: {}", e),
                }
            }

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(products)
    }
}

fn required_string(item: &Item, field: &str) -> RepositoryResult<String> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: format!("Missing {}", field),
        })
}

/// Products in `category`, sorted by name
pub fn filter_by_category(products: Vec<Product>, category: &str) -> Vec<Product> {
    let mut matching: Vec<Product> = products
        .into_iter()
        .filter(|p| p.in_category(category))
        .collect();
    matching.sort_by(|a, b| a.name.cmp(&b.name));
    matching
}

/// Distinct, sorted categories across `products`
pub fn distinct_categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .flat_map(|p| p.categories.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[async_trait]
impl ProductRepository for DynamoDbProductRepository {
    #[instrument(skip(self), fields(table = %self.table.table_name()))]
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        let products = self.scan_all(None).await?;
        info!("Found {} products", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(table = %self.table.table_name()))]
    async fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        let response = self
            .table
            .call("GetItem", async {
                self.table
                    .client()
                    .get_item()
                    .table_name(self.table.table_name())
                    .key("sku", AttributeValue::S(sku.to_string()))
                    .send()
                    .await
                    .map_err(|e| self.table.map_error(e.into()))
            })
            .await?;

        response
            .item
            .as_ref()
            .map(|item| self.item_to_product(item))
            .transpose()
    }

    #[instrument(skip(self), fields(table = %self.table.table_name()))]
    async fn find_by_category(&self, category: &str) -> RepositoryResult<Vec<Product>> {
        let products = self.scan_all(Some(category)).await?;
        Ok(filter_by_category(products, category))
    }

    #[instrument(skip(self), fields(table = %self.table.table_name()))]
    async fn categories(&self) -> RepositoryResult<Vec<String>> {
        let products = self.scan_all(None).await?;
        Ok(distinct_categories(&products))
    }

    #[instrument(skip(self), fields(table = %self.table.table_name()))]
    async fn search(&self, text: &str) -> RepositoryResult<Vec<Product>> {
        let products = self.scan_all(None).await?;
        Ok(products
            .into_iter()
            .filter(|p| p.matches_text(text))
            .collect())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.table.ping().await
    }
}
