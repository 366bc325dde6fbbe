use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::AttributeMap;
use crate::common::extension::Extension;
use crate::common::key::Key;
use crate::common::schema::{ItemSchema, TableMetadata};
use crate::read;
use crate::write;

use aws_sdk_dynamodb::{Client, operation, types};
use indexmap::IndexMap;

/// A single request within a batch write operation.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchWriteRequest {
    /// Put request - creates or replaces an item.
    Put(AttributeMap),
    /// Delete request - removes an item by its primary key.
    Delete(Key),
}

impl BatchWriteRequest {
    /// Build a put request from a typed item via its schema.
    pub fn put<S: ItemSchema>(schema: &S, item: &S::Item) -> Result<Self> {
        Ok(Self::Put(schema.item_to_map(item, false)?))
    }
}

/// The write requests targeting one table.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteBatch {
    /// The table to write to.
    pub table_name: String,
    /// The table's key structure, used for key pairing and the extension
    /// contexts.
    pub metadata: TableMetadata,
    /// The puts and deletes for this table, in caller order.
    pub requests: Vec<BatchWriteRequest>,
}

/// Batch write item operation.
///
/// The before-write hook runs on every put item, never on delete keys.
/// The underlying protocol has no per-item condition slot, so an
/// extension that contributes a condition (or update clauses) to a batch
/// put is rejected before the network call.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::schema::ItemSchema;
/// use dynamodb_mapper::common::{key, schema};
/// use dynamodb_mapper::write::batch_write_item;
/// use serde_json::{Value, json};
///
/// # async fn example(
/// #     client: &Client,
/// #     schema: &schema::StaticSchema<Value>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let batch_write = batch_write_item::BatchWriteItem {
///     batches: vec![batch_write_item::WriteBatch {
///         table_name: "users".to_string(),
///         metadata: schema.metadata().clone(),
///         requests: vec![
///             batch_write_item::BatchWriteRequest::put(schema, &json!({"id": "1"}))?,
///             batch_write_item::BatchWriteRequest::Delete(key::Key::new("2")?),
///         ],
///     }],
/// };
/// let result = batch_write.send(client, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteItem {
    /// The write batches, in caller order.
    pub batches: Vec<WriteBatch>,
}

impl BatchWriteItem {
    /// Build the wire request, grouping write requests per table and
    /// running the before-write hook on each put.
    pub fn generate_request(
        &self,
        extension: Option<&dyn Extension>,
    ) -> Result<operation::batch_write_item::BatchWriteItemInput> {
        let mut tables: IndexMap<String, Vec<types::WriteRequest>> = IndexMap::new();
        for batch in &self.batches {
            let context = OperationContext::new(batch.table_name.clone());
            let requests = tables.entry(batch.table_name.clone()).or_default();
            for request in &batch.requests {
                let write_request = match request {
                    BatchWriteRequest::Put(item) => {
                        let prepared = write::common::apply_before_write(
                            item.clone(),
                            None,
                            &context,
                            &batch.metadata,
                            extension,
                        )?;
                        if prepared.condition.is_some() {
                            return Err(Error::invalid_request(format!(
                                "an extension added a condition expression to a batch put for table `{}`, but batch writes carry no per-item condition",
                                batch.table_name
                            )));
                        }
                        if prepared.update_expression.is_some() {
                            return Err(Error::invalid_request(format!(
                                "an extension added an update expression to a batch put for table `{}`",
                                batch.table_name
                            )));
                        }
                        write::common::ensure_partition_key(&prepared.item, &batch.metadata)?;
                        let put_request = types::PutRequest::builder()
                            .set_item(Some(prepared.item))
                            .build()
                            .map_err(|error| Error::invalid_request(error.to_string()))?;
                        types::WriteRequest::builder().put_request(put_request).build()
                    }
                    BatchWriteRequest::Delete(key) => {
                        let delete_request = types::DeleteRequest::builder()
                            .set_key(Some(key.key_map(&batch.metadata)?))
                            .build()
                            .map_err(|error| Error::invalid_request(error.to_string()))?;
                        types::WriteRequest::builder()
                            .delete_request(delete_request)
                            .build()
                    }
                };
                requests.push(write_request);
            }
        }
        let input = operation::batch_write_item::BatchWriteItemInput::builder()
            .set_request_items(Some(tables.into_iter().collect()))
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

    /// Partition the unprocessed items the service returned back per
    /// table: puts round-trip as full items and flow through the
    /// after-read hook, delete keys are bare keys and never see the
    /// extension.
    pub fn transform_response(
        &self,
        output: operation::batch_write_item::BatchWriteItemOutput,
        extension: Option<&dyn Extension>,
    ) -> Result<BatchWriteResult> {
        let mut unprocessed_puts: IndexMap<String, Vec<AttributeMap>> = IndexMap::new();
        let mut unprocessed_deletes: IndexMap<String, Vec<AttributeMap>> = IndexMap::new();
        for (table_name, requests) in output.unprocessed_items.unwrap_or_default() {
            let context = OperationContext::new(table_name.clone());
            for request in requests {
                if let Some(put_request) = request.put_request {
                    let item = match self.metadata_for_table(&table_name) {
                        Some(metadata) => read::common::apply_after_read(
                            put_request.item,
                            &context,
                            metadata,
                            extension,
                        )?,
                        None => put_request.item,
                    };
                    unprocessed_puts
                        .entry(table_name.clone())
                        .or_default()
                        .push(item);
                }
                if let Some(delete_request) = request.delete_request {
                    unprocessed_deletes
                        .entry(table_name.clone())
                        .or_default()
                        .push(delete_request.key);
                }
            }
        }
        Ok(BatchWriteResult {
            unprocessed_puts,
            unprocessed_deletes,
        })
    }

    /// Execute the batch write item operation.
    pub async fn send(
        &self,
        client: &Client,
        extension: Option<&dyn Extension>,
    ) -> Result<BatchWriteResult> {
        let input = self.generate_request(extension)?;
        let output = client
            .batch_write_item()
            .set_request_items(input.request_items)
            .send()
            .await
            .map_err(Error::transport)?;
        self.transform_response(output, extension)
    }
}

/// Per-table partitioning of the unprocessed half of a batch write
/// response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteResult {
    unprocessed_puts: IndexMap<String, Vec<AttributeMap>>,
    unprocessed_deletes: IndexMap<String, Vec<AttributeMap>>,
}

impl BatchWriteResult {
    /// The put items the service did not process for a table, converted
    /// through the schema.
    pub fn unprocessed_put_items_for_table<S: ItemSchema>(
        &self,
        table_name: &str,
        schema: &S,
    ) -> Result<Vec<S::Item>> {
        self.unprocessed_puts
            .get(table_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|item| schema.map_to_item(item.clone()))
            .collect()
    }

    /// The delete keys the service did not process for a table, as bare
    /// key maps.
    pub fn unprocessed_delete_keys_for_table(&self, table_name: &str) -> &[AttributeMap] {
        self.unprocessed_deletes
            .get(table_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
