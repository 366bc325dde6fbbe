use crate::common;
use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::Expression;
use crate::common::extension::Extension;
use crate::common::schema::ItemSchema;
use crate::read;
use crate::write;

use aws_sdk_dynamodb::{Client, operation, types};

/// Put item operation.
///
/// The before-write hook runs once on the item; an extension may replace
/// the item and add a condition, but cannot contribute update clauses (a
/// put carries no update expression slot).
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{context, schema};
/// use dynamodb_mapper::write::put_item;
/// use serde_json::{Value, json};
///
/// # async fn example(
/// #     client: &Client,
/// #     schema: &schema::StaticSchema<Value>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let put_item = put_item::PutItem::new(json!({"id": "1", "name": "John"}));
/// let context = context::OperationContext::new("users");
/// put_item.send(client, schema, &context, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PutItem<T> {
    /// The item to put into the table.
    pub item: T,
    /// Condition that must hold for the put to succeed.
    pub condition: Option<Expression>,
    /// Which item attributes to return (`AllOld` to see the replaced item).
    pub return_values: Option<types::ReturnValue>,
    /// Which item attributes to return if the condition check fails.
    pub return_values_on_condition_check_failure:
        Option<types::ReturnValuesOnConditionCheckFailure>,
}

impl<T> PutItem<T> {
    /// Put an item with the operation defaults (no condition, nothing
    /// returned).
    pub fn new(item: T) -> Self {
        Self {
            item,
            condition: None,
            return_values: None,
            return_values_on_condition_check_failure: None,
        }
    }

    fn prepare<S: ItemSchema<Item = T>>(
        &self,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<write::common::PreparedWrite> {
        common::ensure_primary_index("PutItem", context)?;
        let item = schema.item_to_map(&self.item, false)?;
        let prepared = write::common::apply_before_write(
            item,
            self.condition.clone(),
            context,
            schema.metadata(),
            extension,
        )?;
        if prepared.update_expression.is_some() {
            return Err(Error::invalid_request(
                "an extension added an update expression to a put, which carries no update slot",
            ));
        }
        write::common::ensure_partition_key(&prepared.item, schema.metadata())?;
        Ok(prepared)
    }

    /// Build the wire request, running the before-write hook and merging
    /// its condition with the caller's.
    pub fn generate_request<S: ItemSchema<Item = T>>(
        &self,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<operation::put_item::PutItemInput> {
        let prepared = self.prepare(schema, context, extension)?;
        let (condition_expression, names, values) = write::common::split_condition(prepared.condition);
        let input = operation::put_item::PutItemInput::builder()
            .table_name(context.table_name())
            .set_item(Some(prepared.item))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .set_return_values(self.return_values.clone())
            .set_return_values_on_condition_check_failure(
                self.return_values_on_condition_check_failure.clone(),
            )
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Wrap the generated put into a transaction write envelope.
    pub fn generate_transact_write_item<S: ItemSchema<Item = T>>(
        &self,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<types::TransactWriteItem> {
        let prepared = self.prepare(schema, context, extension)?;
        let (condition_expression, names, values) = write::common::split_condition(prepared.condition);
        let put = types::Put::builder()
            .table_name(context.table_name())
            .set_item(Some(prepared.item))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .set_return_values_on_condition_check_failure(
                self.return_values_on_condition_check_failure.clone(),
            )
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(types::TransactWriteItem::builder().put(put).build())
    }

    /// Convert the wire response's returned attributes (the replaced
    /// item, when `return_values` asked for it) back to a typed item.
    pub fn transform_response<S: ItemSchema<Item = T>>(
        &self,
        output: operation::put_item::PutItemOutput,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<Option<T>> {
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

    /// Execute the put item operation.
    pub async fn send<S: ItemSchema<Item = T>>(
        &self,
        client: &Client,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<Option<T>> {
        let input = self.generate_request(schema, context, extension)?;
        let output = client
            .put_item()
            .set_table_name(input.table_name)
            .set_item(input.item)
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

    struct AddCondition;

    impl Extension for AddCondition {
        fn before_write(&self, _: BeforeWrite<'_>) -> Result<WriteModification, BoxError> {
            Ok(WriteModification {
                additional_conditional_expression: Some(Expression {
                    text: "attr = :v".to_string(),
                    values: collections::HashMap::from([(
                        ":v".to_string(),
                        types::AttributeValue::N("1".to_string()),
                    )]),
                    ..Default::default()
                }),
                ..Default::default()
            })
        }
    }

    #[rstest]
    #[case::plain(
        PutItem::new(json!({"id": "1", "name": "John"})),
        operation::put_item::PutItemInput::builder()
            .table_name("users")
            .item("id", types::AttributeValue::S("1".to_string()))
            .item("name", types::AttributeValue::S("John".to_string()))
            .build()
            .unwrap()
    )]
    #[case::with_condition(
        PutItem {
            condition: Some(Expression {
                text: "attribute_not_exists(#id)".to_string(),
                names: collections::HashMap::from([("#id".to_string(), "id".to_string())]),
                ..Default::default()
            }),
            return_values: Some(types::ReturnValue::AllOld),
            ..PutItem::new(json!({"id": "1"}))
        },
        operation::put_item::PutItemInput::builder()
            .table_name("users")
            .item("id", types::AttributeValue::S("1".to_string()))
            .condition_expression("attribute_not_exists(#id)")
            .expression_attribute_names("#id", "id")
            .return_values(types::ReturnValue::AllOld)
            .build()
            .unwrap()
    )]
    fn test_generate_request(
        #[case] put_item: PutItem<Value>,
        #[case] expected: operation::put_item::PutItemInput,
    ) {
        let context = OperationContext::new("users");
        let actual = put_item
            .generate_request(&schema(), &context, None)
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_extension_condition_joined_after_caller_condition() {
        let put_item = PutItem {
            condition: Some(Expression::plain("foo = bar")),
            ..PutItem::new(json!({"id": "1"}))
        };
        let context = OperationContext::new("users");
        let input = put_item
            .generate_request(&schema(), &context, Some(&AddCondition))
            .unwrap();
        assert_eq!(
            input.condition_expression.as_deref(),
            Some("foo = bar AND attr = :v")
        );
        assert_eq!(
            input.expression_attribute_values.unwrap().get(":v"),
            Some(&types::AttributeValue::N("1".to_string()))
        );
    }

    #[test]
    fn test_missing_partition_key_is_rejected() {
        let put_item = PutItem::new(json!({"name": "John"}));
        let context = OperationContext::new("users");
        assert!(matches!(
            put_item
                .generate_request(&schema(), &context, None)
                .unwrap_err(),
            Error::InvalidRequest { .. }
        ));
    }

    #[test]
    fn test_secondary_index_is_rejected() {
        let put_item = PutItem::new(json!({"id": "1"}));
        let context = OperationContext::with_index("users", "email-index");
        assert!(matches!(
            put_item
                .generate_request(&schema(), &context, None)
                .unwrap_err(),
            Error::InvalidRequest { .. }
        ));
    }

    #[test]
    fn test_extension_update_expression_is_rejected() {
        struct AddUpdate;

        impl Extension for AddUpdate {
            fn before_write(&self, _: BeforeWrite<'_>) -> Result<WriteModification, BoxError> {
                Ok(WriteModification {
                    update_expression: Some(crate::common::expression::UpdateExpression {
                        set: vec![Expression::plain("#a = :a")],
                        ..Default::default()
                    }),
                    ..Default::default()
                })
            }
        }

        let put_item = PutItem::new(json!({"id": "1"}));
        let context = OperationContext::new("users");
        assert!(matches!(
            put_item
                .generate_request(&schema(), &context, Some(&AddUpdate))
                .unwrap_err(),
            Error::InvalidRequest { .. }
        ));
    }

    #[test]
    fn test_generate_transact_write_item() {
        let put_item = PutItem {
            condition: Some(Expression::plain("foo = bar")),
            ..PutItem::new(json!({"id": "1"}))
        };
        let context = OperationContext::new("users");
        let envelope = put_item
            .generate_transact_write_item(&schema(), &context, None)
            .unwrap();
        let put = envelope.put.unwrap();
        assert_eq!(put.table_name, "users");
        assert_eq!(put.condition_expression.as_deref(), Some("foo = bar"));
        assert_eq!(
            put.item.get("id"),
            Some(&types::AttributeValue::S("1".to_string()))
        );
    }

    #[test]
    fn test_transform_response_returns_replaced_item() {
        let put_item = PutItem::new(json!({"id": "1"}));
        let context = OperationContext::new("users");
        let output = operation::put_item::PutItemOutput::builder()
            .attributes("id", types::AttributeValue::S("1".to_string()))
            .attributes("name", types::AttributeValue::S("old".to_string()))
            .build();
        let actual = put_item
            .transform_response(output, &schema(), &context, None)
            .unwrap();
        assert_eq!(actual, Some(json!({"id": "1", "name": "old"})));
    }
}
