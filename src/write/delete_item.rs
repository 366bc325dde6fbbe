use crate::common;
use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::Expression;
use crate::common::extension::Extension;
use crate::common::key::Key;
use crate::common::schema::ItemSchema;
use crate::read;
use crate::write::common::split_condition;

use aws_sdk_dynamodb::{Client, operation, types};

/// Delete item operation.
///
/// Deletes are key-addressed: the before-write hook never runs (there is
/// no item to transform), but the removed item flows back through the
/// after-read hook because the request pins `ALL_OLD` return values.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{context, key, schema};
/// use dynamodb_mapper::write::delete_item;
/// use serde_json::Value;
///
/// # async fn example(
/// #     client: &Client,
/// #     schema: &schema::StaticSchema<Value>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let delete_item = delete_item::DeleteItem::new(key::Key::new("1")?);
/// let context = context::OperationContext::new("users");
/// let removed = delete_item.send(client, schema, &context, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteItem {
    /// The primary key of the item to delete.
    pub key: Key,
    /// Condition that must hold for the delete to succeed.
    pub condition: Option<Expression>,
    /// Which item attributes to return if the condition check fails.
    pub return_values_on_condition_check_failure:
        Option<types::ReturnValuesOnConditionCheckFailure>,
}

impl DeleteItem {
    /// Delete by key with the operation defaults.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            condition: None,
            return_values_on_condition_check_failure: None,
        }
    }

    /// Build the wire request. The caller condition passes through
    /// unchanged; no extension hook is consulted for a bare key.
    pub fn generate_request<S: ItemSchema>(
        &self,
        schema: &S,
        context: &OperationContext,
    ) -> Result<operation::delete_item::DeleteItemInput> {
        common::ensure_primary_index("DeleteItem", context)?;
        let key = self.key.key_map(schema.metadata())?;
        let (condition_expression, names, values) = split_condition(self.condition.clone());
        let input = operation::delete_item::DeleteItemInput::builder()
            .table_name(context.table_name())
            .set_key(Some(key))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .return_values(types::ReturnValue::AllOld)
            .set_return_values_on_condition_check_failure(
                self.return_values_on_condition_check_failure.clone(),
            )
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Wrap the generated delete into a transaction write envelope.
    pub fn generate_transact_write_item<S: ItemSchema>(
        &self,
        schema: &S,
        context: &OperationContext,
    ) -> Result<types::TransactWriteItem> {
        common::ensure_primary_index("DeleteItem", context)?;
        let key = self.key.key_map(schema.metadata())?;
        let (condition_expression, names, values) = split_condition(self.condition.clone());
        let delete = types::Delete::builder()
            .table_name(context.table_name())
            .set_key(Some(key))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .set_return_values_on_condition_check_failure(
                self.return_values_on_condition_check_failure.clone(),
            )
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(types::TransactWriteItem::builder().delete(delete).build())
    }

    /// Convert the removed item (returned via `ALL_OLD`) back to a typed
    /// item, running the after-read hook first.
    pub fn transform_response<S: ItemSchema>(
        &self,
        output: operation::delete_item::DeleteItemOutput,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<Option<S::Item>> {
        match output.attributes {
            None => Ok(None),
            Some(attributes) => {
                let attributes = read::common::apply_after_read(
                    attributes,
                    context,
                    schema.metadata(),
                    extension,
                )?;
                Ok(Some(schema.map_to_item(attributes)?))
            }
        }
    }

    /// Execute the delete item operation, returning the removed item.
    pub async fn send<S: ItemSchema>(
        &self,
        client: &Client,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<Option<S::Item>> {
        let input = self.generate_request(schema, context)?;
        let output = client
            .delete_item()
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_return_values(input.return_values)
            .set_return_values_on_condition_check_failure(
                input.return_values_on_condition_check_failure,
            )
            .send()
            .await
            .map_err(Error::transport)?;
        self.transform_response(output, schema, context, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::extension::{BeforeWrite, BoxError, WriteModification};
    use crate::common::schema::{StaticSchema, TableMetadata};

    use rstest::rstest;
    use serde_json::{Value, json};
    use std::collections;

    fn schema() -> StaticSchema<Value> {
        StaticSchema::new(TableMetadata {
            partition_key: "id".to_string(),
            ..Default::default()
        })
    }

    #[rstest]
    #[case::key_only(
        DeleteItem::new(Key::new("1").unwrap()),
        operation::delete_item::DeleteItemInput::builder()
            .table_name("users")
            .key("id", types::AttributeValue::S("1".to_string()))
            .return_values(types::ReturnValue::AllOld)
            .build()
            .unwrap()
    )]
    #[case::with_condition(
        DeleteItem {
            condition: Some(Expression {
                text: "#v = :v".to_string(),
                names: collections::HashMap::from([("#v".to_string(), "version".to_string())]),
                values: collections::HashMap::from([(
                    ":v".to_string(),
                    types::AttributeValue::N("3".to_string()),
                )]),
            }),
            ..DeleteItem::new(Key::new("1").unwrap())
        },
        operation::delete_item::DeleteItemInput::builder()
            .table_name("users")
            .key("id", types::AttributeValue::S("1".to_string()))
            .condition_expression("#v = :v")
            .expression_attribute_names("#v", "version")
            .expression_attribute_values(":v", types::AttributeValue::N("3".to_string()))
            .return_values(types::ReturnValue::AllOld)
            .build()
            .unwrap()
    )]
    fn test_generate_request(
        #[case] delete_item: DeleteItem,
        #[case] expected: operation::delete_item::DeleteItemInput,
    ) {
        let context = OperationContext::new("users");
        let actual = delete_item.generate_request(&schema(), &context).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_secondary_index_is_rejected() {
        let delete_item = DeleteItem::new(Key::new("1").unwrap());
        let context = OperationContext::with_index("users", "email-index");
        assert!(matches!(
            delete_item
                .generate_request(&schema(), &context)
                .unwrap_err(),
            Error::InvalidRequest { .. }
        ));
    }

    #[test]
    fn test_before_write_never_runs_for_deletes() {
        struct Counting(std::sync::atomic::AtomicUsize);

        impl Extension for Counting {
            fn before_write(&self, _: BeforeWrite<'_>) -> Result<WriteModification, BoxError> {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(WriteModification::default())
            }
        }

        let extension = Counting(std::sync::atomic::AtomicUsize::new(0));
        let delete_item = DeleteItem::new(Key::new("1").unwrap());
        let context = OperationContext::new("users");
        // request generation has no extension parameter; transform only
        // consults after_read
        let _ = delete_item.generate_request(&schema(), &context).unwrap();
        let output = operation::delete_item::DeleteItemOutput::builder()
            .attributes("id", types::AttributeValue::S("1".to_string()))
            .build();
        let removed = delete_item
            .transform_response(output, &schema(), &context, Some(&extension))
            .unwrap();
        assert_eq!(removed, Some(json!({"id": "1"})));
        assert_eq!(extension.0.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_generate_transact_write_item() {
        let delete_item = DeleteItem::new(Key::new("1").unwrap());
        let context = OperationContext::new("users");
        let envelope = delete_item
            .generate_transact_write_item(&schema(), &context)
            .unwrap();
        let delete = envelope.delete.unwrap();
        assert_eq!(delete.table_name, "users");
        assert_eq!(
            delete.key.get("id"),
            Some(&types::AttributeValue::S("1".to_string()))
        );
    }
}
