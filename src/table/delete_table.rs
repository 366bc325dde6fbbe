use crate::common;
use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};

use aws_sdk_dynamodb::{Client, operation, types};

/// Delete table operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::context;
/// use dynamodb_mapper::table::delete_table;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let context = context::OperationContext::new("users");
/// delete_table::DeleteTable.send(client, &context).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeleteTable;

impl DeleteTable {
    /// Build the wire request.
    pub fn generate_request(
        &self,
        context: &OperationContext,
    ) -> Result<operation::delete_table::DeleteTableInput> {
        common::ensure_primary_index("DeleteTable", context)?;
        let input = operation::delete_table::DeleteTableInput::builder()
            .table_name(context.table_name())
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Execute the delete table operation.
    pub async fn send(
        &self,
        client: &Client,
        context: &OperationContext,
    ) -> Result<Option<types::TableDescription>> {
        let input = self.generate_request(context)?;
        let output = client
            .delete_table()
            .set_table_name(input.table_name)
            .send()
            .await
            .map_err(Error::transport)?;
        Ok(output.table_description)
    }
}
