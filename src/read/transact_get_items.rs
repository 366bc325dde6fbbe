use crate::common::error::{Error, Result};
use crate::common::expression::AttributeMap;
use crate::common::key::Key;
use crate::common::schema::TableMetadata;

use aws_sdk_dynamodb::{Client, operation, types};

/// One (table, key) read within a transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactGetItem {
    /// The table to read from.
    pub table_name: String,
    /// The table's key structure, used to pair key values with names.
    pub metadata: TableMetadata,
    /// The primary key to retrieve.
    pub key: Key,
}

/// Transact get items operation.
///
/// Builds one get descriptor per (table, key) pair, preserving caller
/// order. Transactional reads bypass the item-modification pipeline
/// entirely: no extension hook runs on the results, and absent items keep
/// their position so callers can distinguish "not found" from "found but
/// empty".
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{key, schema};
/// use dynamodb_mapper::read::transact_get_items;
///
/// # async fn example(
/// #     client: &Client,
/// #     users_metadata: schema::TableMetadata,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let transact_get = transact_get_items::TransactGetItems {
///     items: vec![transact_get_items::TransactGetItem {
///         table_name: "users".to_string(),
///         metadata: users_metadata,
///         key: key::Key::new("1")?,
///     }],
/// };
/// let documents = transact_get.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactGetItems {
    /// The reads to perform, in caller order.
    pub items: Vec<TransactGetItem>,
}

impl TransactGetItems {
    /// Build the wire request, one descriptor per read in caller order.
    pub fn generate_request(&self) -> Result<operation::transact_get_items::TransactGetItemsInput> {
        let mut transact_items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let get = types::Get::builder()
                .table_name(&item.table_name)
                .set_key(Some(item.key.key_map(&item.metadata)?))
                .build()
                .map_err(|error| Error::invalid_request(error.to_string()))?;
            transact_items.push(types::TransactGetItem::builder().get(get).build());
        }
        let input = operation::transact_get_items::TransactGetItemsInput::builder()
            .set_transact_items(Some(transact_items))
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Convert the wire response into one document per requested read,
    /// preserving position: a missing item stays `None`, a present but
    /// empty item stays an empty document.
    pub fn transform_response(
        &self,
        output: operation::transact_get_items::TransactGetItemsOutput,
    ) -> Vec<Option<AttributeMap>> {
        output
            .responses
            .unwrap_or_default()
            .into_iter()
            .map(|response| response.item)
            .collect()
    }

    /// Execute the transact get items operation.
    pub async fn send(&self, client: &Client) -> Result<Vec<Option<AttributeMap>>> {
        let input = self.generate_request()?;
        let output = client
            .transact_get_items()
            .set_transact_items(input.transact_items)
            .send()
            .await
            .map_err(Error::transport)?;
        Ok(self.transform_response(output))
    }
}
