use crate::common::error::{Error, Result};

use aws_sdk_dynamodb::{Client, operation, types};

/// Transact write items operation.
///
/// Aggregates write envelopes produced by the single-item operations'
/// `generate_transact_write_item` conversions (put, delete, update,
/// condition check) into one atomic wire call. An empty transaction is a
/// valid request; whether the store accepts it is the transport's
/// concern.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{context, schema};
/// use dynamodb_mapper::write::{put_item, transact_write_items};
/// use serde_json::{Value, json};
///
/// # async fn example(
/// #     client: &Client,
/// #     schema: &schema::StaticSchema<Value>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let context = context::OperationContext::new("users");
/// let put = put_item::PutItem::new(json!({"id": "1"}));
/// let transact_write = transact_write_items::TransactWriteItems {
///     items: vec![put.generate_transact_write_item(schema, &context, None)?],
///     client_request_token: None,
/// };
/// transact_write.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactWriteItems {
    /// The write envelopes, in caller order.
    pub items: Vec<types::TransactWriteItem>,
    /// Idempotency token for the whole transaction.
    pub client_request_token: Option<String>,
}

impl TransactWriteItems {
    /// Build the wire request.
    pub fn generate_request(
        &self,
    ) -> Result<operation::transact_write_items::TransactWriteItemsInput> {
        let input = operation::transact_write_items::TransactWriteItemsInput::builder()
            .set_transact_items(Some(self.items.clone()))
            .set_client_request_token(self.client_request_token.clone())
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Execute the transact write items operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.transact_write_items", skip_all, err)
    )]
    pub async fn send(&self, client: &Client) -> Result<()> {
        let input = self.generate_request()?;
        client
            .transact_write_items()
            .set_transact_items(input.transact_items)
            .set_client_request_token(input.client_request_token)
            .send()
            .await
            .map_err(Error::transport)?;
        Ok(())
    }
}
