use crate::common;
use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};

use aws_sdk_dynamodb::{Client, operation, types};

/// Describe table operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::context;
/// use dynamodb_mapper::table::describe_table;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let context = context::OperationContext::new("users");
/// let description = describe_table::DescribeTable.send(client, &context).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DescribeTable;

impl DescribeTable {
    /// Build the wire request.
    pub fn generate_request(
        &self,
        context: &OperationContext,
    ) -> Result<operation::describe_table::DescribeTableInput> {
        common::ensure_primary_index("DescribeTable", context)?;
        let input = operation::describe_table::DescribeTableInput::builder()
            .table_name(context.table_name())
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Execute the describe table operation.
    pub async fn send(
        &self,
        client: &Client,
        context: &OperationContext,
    ) -> Result<Option<types::TableDescription>> {
        let input = self.generate_request(context)?;
        let output = client
            .describe_table()
            .set_table_name(input.table_name)
            .send()
            .await
            .map_err(Error::transport)?;
        Ok(output.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request() {
        let context = OperationContext::new("users");
        let input = DescribeTable.generate_request(&context).unwrap();
        assert_eq!(input.table_name.as_deref(), Some("users"));
    }

    #[test]
    fn test_secondary_index_is_rejected() {
        let context = OperationContext::with_index("users", "email-index");
        assert!(matches!(
            DescribeTable.generate_request(&context).unwrap_err(),
            Error::InvalidRequest { .. }
        ));
    }
}
