use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalogue product document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub instock: u32,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Product {
    /// Check if the product can be added to a cart
    pub fn is_in_stock(&self) -> bool {
        self.instock > 0
    }

    /// Check if the product is listed under `category`
    pub fn in_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Case-insensitive match against name and description
    pub fn matches_text(&self, text: &str) -> bool {
        let needle = text.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_product() -> Product {
        Product {
            sku: "Watson".to_string(),
            name: "Watson".to_string(),
            description: "Quiz champion robot".to_string(),
            price: dec!(2001),
            instock: 2,
            categories: vec!["Artificial Intelligence".to_string()],
        }
    }

    #[test]
    fn test_stock_check() {
        let mut product = create_test_product();
        assert!(product.is_in_stock());

        product.instock = 0;
        assert!(!product.is_in_stock());
    }

    #[test]
    fn test_category_match_is_exact() {
        let product = create_test_product();

        assert!(product.in_category("Artificial Intelligence"));
        assert!(!product.in_category("artificial intelligence"));
        assert!(!product.in_category("Robot"));
    }

    #[test]
    fn test_text_match() {
        let product = create_test_product();

        assert!(product.matches_text("quiz"));
        assert!(product.matches_text("WATSON"));
        assert!(!product.matches_text("vacuum"));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{"sku":"K9","name":"K9","price":99.5}"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.instock, 0);
        assert!(product.categories.is_empty());
        assert_eq!(product.price, dec!(99.5));
    }
}
