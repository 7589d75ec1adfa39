#[cfg(test)]
mod repository_tests {
    use crate::models::{Product, RepositoryError, User};
    use aws_sdk_dynamodb::types::AttributeValue;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::repositories::dynamodb::DynamoDbTable;
    use crate::repositories::product_repository::*;
    use crate::repositories::user_repository::*;

    fn create_test_table(name: &str) -> DynamoDbTable {
        let config = aws_sdk_dynamodb::Config::builder()
            .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        let client = Arc::new(aws_sdk_dynamodb::Client::from_conf(config));
        DynamoDbTable::new(client, name.to_string(), "us-east-1".to_string())
    }

    fn product(sku: &str, name: &str, categories: &[&str]) -> Product {
        Product {
            sku: sku.to_string(),
            name: name.to_string(),
            description: format!("{} robot", name),
            price: dec!(99.99),
            instock: 3,
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    mod product_repository_tests {
        use super::*;

        #[test]
        fn test_product_to_item_conversion() {
            let repo = DynamoDbProductRepository::new(create_test_table("products"));
            let item = repo.product_to_item(&product("HAL-1", "HAL", &["Artificial Intelligence"]));

            assert_eq!(repo.table_name(), "products");

            if let Some(AttributeValue::N(price)) = item.get("price") {
                assert_eq!(price, "99.99");
            } else {
                panic!("Expected number value for price");
            }

            if let Some(AttributeValue::L(categories)) = item.get("categories") {
                assert_eq!(categories.len(), 1);
            } else {
                panic!("Expected list value for categories");
            }

            let converted = repo.item_to_product(&item).unwrap();
            assert_eq!(converted.price, dec!(99.99));
            assert_eq!(converted.instock, 3);
            assert_eq!(converted.categories, vec!["Artificial Intelligence"]);
        }

        #[test]
        fn test_item_with_only_required_fields() {
            let repo = DynamoDbProductRepository::new(create_test_table("products"));
            let item = HashMap::from([
                ("sku".to_string(), AttributeValue::S("K9".to_string())),
                ("name".to_string(), AttributeValue::S("K9".to_string())),
                ("price".to_string(), AttributeValue::N("12".to_string())),
            ]);

            let product = repo.item_to_product(&item).unwrap();

            assert_eq!(product.instock, 0);
            assert!(product.description.is_empty());
            assert!(product.categories.is_empty());
        }

        #[test]
        fn test_string_set_categories_accepted() {
            let repo = DynamoDbProductRepository::new(create_test_table("products"));
            let item = HashMap::from([
                ("sku".to_string(), AttributeValue::S("K9".to_string())),
                ("name".to_string(), AttributeValue::S("K9".to_string())),
                ("price".to_string(), AttributeValue::N("12".to_string())),
                (
                    "categories".to_string(),
                    AttributeValue::Ss(vec!["Robot".to_string()]),
                ),
            ]);

            let product = repo.item_to_product(&item).unwrap();
            assert!(product.in_category("Robot"));
        }

        #[test]
        fn test_invalid_items_rejected() {
            let repo = DynamoDbProductRepository::new(create_test_table("products"));

            let missing_sku = HashMap::from([
                ("name".to_string(), AttributeValue::S("K9".to_string())),
                ("price".to_string(), AttributeValue::N("12".to_string())),
            ]);
            match repo.item_to_product(&missing_sku) {
                Err(RepositoryError::InvalidItem { message }) => {
                    assert!(message.contains("sku"))
                }
                other => panic!("Expected InvalidItem, got {:?}", other),
            }

            let negative_stock = HashMap::from([
                ("sku".to_string(), AttributeValue::S("K9".to_string())),
                ("name".to_string(), AttributeValue::S("K9".to_string())),
                ("price".to_string(), AttributeValue::N("12".to_string())),
                ("instock".to_string(), AttributeValue::N("-1".to_string())),
            ]);
            assert!(repo.item_to_product(&negative_stock).is_err());
        }

        #[test]
        fn test_filter_by_category_sorts_by_name() {
            let products = vec![
                product("R2", "Zed", &["Robot"]),
                product("EMM", "Ewooid", &["Robot"]),
                product("HAL-1", "HAL", &["Artificial Intelligence"]),
                product("STAN-1", "Stan", &["Robot", "Artificial Intelligence"]),
            ];

            let robots = filter_by_category(products, "Robot");
            let names: Vec<&str> = robots.iter().map(|p| p.name.as_str()).collect();

            assert_eq!(names, vec!["Ewooid", "Stan", "Zed"]);
        }

        #[test]
        fn test_distinct_categories() {
            let products = vec![
                product("R2", "Zed", &["Robot"]),
                product("HAL-1", "HAL", &["Artificial Intelligence"]),
                product("STAN-1", "Stan", &["Robot", "Artificial Intelligence"]),
            ];

            assert_eq!(
                distinct_categories(&products),
                vec!["Artificial Intelligence", "Robot"]
            );
            assert!(distinct_categories(&[]).is_empty());
        }
    }

    mod user_repository_tests {
        use super::*;

        #[test]
        fn test_user_item_keeps_password() {
            let repo = DynamoDbUserRepository::new(create_test_table("users"));
            let user = User {
                name: "user".to_string(),
                password: "password".to_string(),
                email: "user@me.com".to_string(),
            };

            let item = repo.user_to_item(&user);
            assert_eq!(
                item.get("password"),
                Some(&AttributeValue::S("password".to_string()))
            );

            assert_eq!(repo.item_to_user(&item).unwrap(), user);
        }

        #[test]
        fn test_user_item_missing_name() {
            let repo = DynamoDbUserRepository::new(create_test_table("users"));
            let item = HashMap::from([(
                "email".to_string(),
                AttributeValue::S("user@me.com".to_string()),
            )]);

            assert!(matches!(
                repo.item_to_user(&item),
                Err(RepositoryError::InvalidItem { .. })
            ));
        }

        #[test]
        fn test_counter_key() {
            assert_eq!(ANONYMOUS_COUNTER_KEY, "anonymous-counter");
        }
    }
}
