use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::sync::Arc;
use tracing::{error, Instrument};

use crate::models::{RepositoryError, RepositoryResult};
use crate::observability::StoreTracing;

use super::connection::DYNAMODB_STORE;

/// A DynamoDB table plus the client, region and tracing used to reach it
#[derive(Clone)]
pub struct DynamoDbTable {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
    tracing: StoreTracing,
}

impl DynamoDbTable {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
            tracing: StoreTracing::disabled(),
        }
    }

    pub fn with_tracing(mut self, tracing: StoreTracing) -> Self {
        self.tracing = tracing;
        self
    }

    pub fn client(&self) -> &DynamoDbClient {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Create a DynamoDB subsegment span with X-Ray attributes
    pub fn span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "DynamoDB",
            "aws.service" = "DynamoDB",
            "aws.operation" = operation,
            "aws.region" = %self.region,
            "aws.dynamodb.table_name" = %self.table_name,
            "aws.remote.service" = "AWS::DynamoDB",
            "aws.remote.operation" = operation,
            "aws.remote.resource.type" = "AWS::DynamoDB::Table",
            "aws.remote.resource.identifier" = %self.table_name,
            "otel.kind" = "client",
            "otel.name" = format!("DynamoDB.{}", operation),
            "rpc.system" = "aws-api",
            "rpc.service" = "AmazonDynamoDBv2",
            "rpc.method" = operation,
            "db.system" = "dynamodb",
            "db.name" = %self.table_name,
            "db.operation" = operation,
        )
    }

    /// Run one SDK call inside its span, recording store metrics
    pub async fn call<T, Fut>(&self, operation: &str, future: Fut) -> RepositoryResult<T>
    where
        Fut: std::future::Future<Output = RepositoryResult<T>>,
    {
        self.tracing
            .trace_operation(operation, DYNAMODB_STORE, future)
            .instrument(self.span(operation))
            .await
    }

    /// Describe the table; used by the connection supervisor
    pub async fn ping(&self) -> RepositoryResult<()> {
        self.call("DescribeTable", async {
            self.client
                .describe_table()
                .table_name(&self.table_name)
                .send()
                .await
                .map_err(|e| self.map_error(e.into()))?;
            Ok(())
        })
        .await
    }

    /// Convert a DynamoDB error to a RepositoryError
    pub fn map_error(&self, error: DynamoDbError) -> RepositoryError {
        match error {
            DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
                table_name: self.table_name.clone(),
            },
            DynamoDbError::ConditionalCheckFailedException(e) => {
                RepositoryError::ConstraintViolation {
                    message: e.to_string(),
                }
            }
            other => {
                error!(table = %self.table_name, "DynamoDB error: {:?}", other);
                RepositoryError::AwsSdk {
                    message: other.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::error::{
        ConditionalCheckFailedException, ResourceNotFoundException,
    };

    fn create_table() -> DynamoDbTable {
        let config = aws_sdk_dynamodb::Config::builder()
            .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        let client = Arc::new(aws_sdk_dynamodb::Client::from_conf(config));
        DynamoDbTable::new(client, "RobotShopProducts".to_string(), "us-east-1".to_string())
    }

    #[test]
    fn test_missing_table_maps_to_table_not_found() {
        let table = create_table();
        let error = DynamoDbError::ResourceNotFoundException(
            ResourceNotFoundException::builder()
                .message("Requested resource not found")
                .build(),
        );

        match table.map_error(error) {
            RepositoryError::TableNotFound { table_name } => {
                assert_eq!(table_name, "RobotShopProducts")
            }
            other => panic!("Expected TableNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_condition_maps_to_constraint_violation() {
        let table = create_table();
        let error = DynamoDbError::ConditionalCheckFailedException(
            ConditionalCheckFailedException::builder()
                .message("The conditional request failed")
                .build(),
        );

        assert!(matches!(
            table.map_error(error),
            RepositoryError::ConstraintViolation { .. }
        ));
    }
}
