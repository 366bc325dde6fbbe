use crate::common;
use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::Expression;
use crate::common::extension::Extension;
use crate::common::key::Key;
use crate::common::schema::ItemSchema;
use crate::common::selection::SelectionMap;
use crate::read;

use aws_sdk_dynamodb::{Client, operation};

/// Get item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{context, key, schema};
/// use dynamodb_mapper::read;
/// use serde_json::Value;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let schema: schema::StaticSchema<Value> = schema::StaticSchema::new(schema::TableMetadata {
///     partition_key: "id".to_string(),
///     ..Default::default()
/// });
/// let get_item = read::get_item::GetItem {
///     key: key::Key::new("1")?,
///     consistent_read: None,
///     projection: None,
/// };
/// let context = context::OperationContext::new("users");
/// let item = get_item.send(client, &schema, &context, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GetItem {
    /// The primary key of the item to retrieve.
    pub key: Key,
    /// Whether to use a strongly consistent read. Unset leaves the
    /// service default (eventually consistent) in place.
    pub consistent_read: Option<bool>,
    /// Which attributes to retrieve; all attributes when unset.
    pub projection: Option<SelectionMap>,
}

impl GetItem {
    /// Retrieve by key with the operation defaults (eventually consistent
    /// read, all attributes).
    pub fn new(key: Key) -> Self {
        Self {
            key,
            consistent_read: None,
            projection: None,
        }
    }

    /// Build the wire request. Fails before any network call if the
    /// context targets a secondary index or the key does not match the
    /// schema's key structure.
    pub fn generate_request<S: ItemSchema>(
        &self,
        schema: &S,
        context: &OperationContext,
    ) -> Result<operation::get_item::GetItemInput> {
        common::ensure_primary_index("GetItem", context)?;
        let key = self.key.key_map(schema.metadata())?;
        let (names, projection_expression) = match self.projection.clone() {
            Some(projection) => {
                let expression: Expression = projection.into();
                (Some(expression.names), Some(expression.text))
            }
            None => (None, None),
        };
        let input = operation::get_item::GetItemInput::builder()
            .table_name(context.table_name())
            .set_key(Some(key))
            .set_consistent_read(self.consistent_read)
            .set_expression_attribute_names(names)
            .set_projection_expression(projection_expression)
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Convert the wire response back to a typed item, running the
    /// after-read hook first. An absent item stays absent.
    pub fn transform_response<S: ItemSchema>(
        &self,
        output: operation::get_item::GetItemOutput,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<Option<S::Item>> {
        match output.item {
            None => Ok(None),
            Some(item) => {
                let item =
                    read::common::apply_after_read(item, context, schema.metadata(), extension)?;
                Ok(Some(schema.map_to_item(item)?))
            }
        }
    }

    /// Execute the get item operation.
    pub async fn send<S: ItemSchema>(
        &self,
        client: &Client,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<Option<S::Item>> {
        let input = self.generate_request(schema, context)?;
        let output = client
            .get_item()
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_consistent_read(input.consistent_read)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_projection_expression(input.projection_expression)
            .send()
            .await
            .map_err(Error::transport)?;
        self.transform_response(output, schema, context, extension)
    }
}
