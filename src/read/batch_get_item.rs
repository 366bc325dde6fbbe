use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::AttributeMap;
use crate::common::extension::Extension;
use crate::common::key::Key;
use crate::common::schema::{ItemSchema, TableMetadata};
use crate::read;

use aws_sdk_dynamodb::{Client, operation, types};
use indexmap::IndexMap;

/// A group of keys to read from one table.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadBatch {
    /// The table to read from.
    pub table_name: String,
    /// The table's key structure, used to pair key values with names and
    /// to build the after-read context.
    pub metadata: TableMetadata,
    /// The primary keys to retrieve.
    pub keys: Vec<Key>,
    /// Whether to read this table with strong consistency. Unset defers
    /// to whatever another batch for the same table requests.
    pub consistent_read: Option<bool>,
}

/// Batch get item operation.
///
/// Flattens an ordered list of per-table read batches into one wire
/// request. All batches naming the same table must agree on the
/// consistent-read setting: an unset flag is a wildcard, but two
/// explicit, differing values are rejected before the network call.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{key, schema};
/// use dynamodb_mapper::read::batch_get_item;
///
/// # async fn example(
/// #     client: &Client,
/// #     users_metadata: schema::TableMetadata,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let batch_get = batch_get_item::BatchGetItem {
///     batches: vec![batch_get_item::ReadBatch {
///         table_name: "users".to_string(),
///         metadata: users_metadata,
///         keys: vec![key::Key::new("1")?, key::Key::new("2")?],
///         consistent_read: None,
///     }],
/// };
/// let page = batch_get.send(client, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItem {
    /// The read batches, in caller order.
    pub batches: Vec<ReadBatch>,
}

impl BatchGetItem {
    /// Build the wire request, grouping keys per table and reconciling
    /// the per-table consistent-read settings.
    pub fn generate_request(&self) -> Result<operation::batch_get_item::BatchGetItemInput> {
        let mut tables: IndexMap<String, (Vec<AttributeMap>, Option<bool>)> = IndexMap::new();
        for batch in &self.batches {
            let (keys, consistent_read) = tables
                .entry(batch.table_name.clone())
                .or_insert((Vec::new(), None));
            match (*consistent_read, batch.consistent_read) {
                (Some(existing), Some(requested)) if existing != requested => {
                    return Err(Error::invalid_request(format!(
                        "two read batches for table `{}` request conflicting consistent read settings",
                        batch.table_name
                    )));
                }
                (None, requested @ Some(_)) => *consistent_read = requested,
                _ => {}
            }
            for key in &batch.keys {
                keys.push(key.key_map(&batch.metadata)?);
            }
        }
        let mut request_items = std::collections::HashMap::with_capacity(tables.len());
        for (table_name, (keys, consistent_read)) in tables {
            let keys_and_attributes = types::KeysAndAttributes::builder()
                .set_keys(Some(keys))
                .set_consistent_read(consistent_read)
                .build()
                .map_err(|error| Error::invalid_request(error.to_string()))?;
            request_items.insert(table_name, keys_and_attributes);
        }
        let input = operation::batch_get_item::BatchGetItemInput::builder()
            .set_request_items(Some(request_items))
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    fn metadata_for_table(&self, table_name: &str) -> Option<&TableMetadata> {
        self.batches
            .iter()
            .find(|batch| batch.table_name == table_name)
            .map(|batch| &batch.metadata)
    }

    /// Partition the wire response back per table, running the after-read
    /// hook on every present item. Unprocessed keys are bare keys and
    /// never see the extension.
    pub fn transform_response(
        &self,
        output: operation::batch_get_item::BatchGetItemOutput,
        extension: Option<&dyn Extension>,
    ) -> Result<BatchGetResultPage> {
        let mut results = IndexMap::new();
        for (table_name, items) in output.responses.unwrap_or_default() {
            let context = OperationContext::new(table_name.clone());
            let mut transformed = Vec::with_capacity(items.len());
            for item in items {
                let item = match self.metadata_for_table(&table_name) {
                    Some(metadata) => {
                        read::common::apply_after_read(item, &context, metadata, extension)?
                    }
                    None => item,
                };
                transformed.push(item);
            }
            results.insert(table_name, transformed);
        }
        let mut unprocessed = IndexMap::new();
        for (table_name, keys_and_attributes) in output.unprocessed_keys.unwrap_or_default() {
            unprocessed.insert(table_name, keys_and_attributes.keys);
        }
        Ok(BatchGetResultPage {
            results,
            unprocessed,
        })
    }

    /// Execute the batch get item operation.
    pub async fn send(
        &self,
        client: &Client,
        extension: Option<&dyn Extension>,
    ) -> Result<BatchGetResultPage> {
        let input = self.generate_request()?;
        let output = client
            .batch_get_item()
            .set_request_items(input.request_items)
            .send()
            .await
            .map_err(Error::transport)?;
        self.transform_response(output, extension)
    }
}

/// Per-table partitioning of one batch get response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetResultPage {
    results: IndexMap<String, Vec<AttributeMap>>,
    unprocessed: IndexMap<String, Vec<AttributeMap>>,
}

impl BatchGetResultPage {
    /// The items returned for a table, converted through the schema.
    pub fn items_for_table<S: ItemSchema>(
        &self,
        table_name: &str,
        schema: &S,
    ) -> Result<Vec<S::Item>> {
        self.results
            .get(table_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|item| schema.map_to_item(item.clone()))
            .collect()
    }

    /// The keys the service did not process for a table, as bare key
    /// maps. Feed them into a follow-up batch to retry.
    pub fn unprocessed_keys_for_table(&self, table_name: &str) -> &[AttributeMap] {
        self.unprocessed
            .get(table_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
