use crate::common;
use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::{AttributeMap, Expression, UpdateExpression};
use crate::common::extension::Extension;
use crate::common::schema::{ItemSchema, TableMetadata};
use crate::read;
use crate::write;

use aws_sdk_dynamodb::{Client, operation, types};
use std::collections;

/// Update item operation.
///
/// The update expression is derived from the typed item: every non-null,
/// non-key attribute becomes a SET clause and, unless `ignore_nulls` is
/// set, every null attribute becomes a REMOVE clause. The before-write
/// hook may replace the item, add a condition, and contribute further
/// update clauses, which are merged group by group into the generated
/// expression.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{context, schema};
/// use dynamodb_mapper::write::update_item;
/// use serde_json::{Value, json};
///
/// # async fn example(
/// #     client: &Client,
/// #     schema: &schema::StaticSchema<Value>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let update_item = update_item::UpdateItem::new(json!({"id": "1", "name": "Jane"}));
/// let context = context::OperationContext::new("users");
/// let updated = update_item.send(client, schema, &context, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateItem<T> {
    /// The item carrying the key and the attributes to update.
    pub item: T,
    /// When set, null attributes are omitted instead of removed.
    pub ignore_nulls: bool,
    /// Condition that must hold for the update to succeed.
    pub condition: Option<Expression>,
}

struct GeneratedUpdate {
    key: AttributeMap,
    update_expression: Option<Expression>,
    condition: Option<Expression>,
}

impl<T> UpdateItem<T> {
    /// Update an item with the operation defaults (nulls removed, no
    /// condition).
    pub fn new(item: T) -> Self {
        Self {
            item,
            ignore_nulls: false,
            condition: None,
        }
    }

    fn split_key(item: &mut AttributeMap, metadata: &TableMetadata) -> Result<AttributeMap> {
        let mut key = AttributeMap::with_capacity(2);
        for key_attribute in metadata.primary_keys() {
            match item.remove(key_attribute) {
                Some(value) if !matches!(value, types::AttributeValue::Null(_)) => {
                    key.insert(key_attribute.to_string(), value);
                }
                _ => {
                    return Err(Error::invalid_request(format!(
                        "the item is missing a value for the key attribute `{key_attribute}`"
                    )));
                }
            }
        }
        Ok(key)
    }

    fn item_update_expression(item: AttributeMap, ignore_nulls: bool) -> UpdateExpression {
        let mut attributes: Vec<_> = item.into_iter().collect();
        attributes.sort_by(|(left, _), (right, _)| left.cmp(right));
        let mut update = UpdateExpression::default();
        for (attribute, value) in attributes {
            let name_placeholder = format!("#{attribute}");
            if matches!(value, types::AttributeValue::Null(_)) {
                if !ignore_nulls {
                    update.remove.push(Expression {
                        text: name_placeholder.clone(),
                        names: collections::HashMap::from([(name_placeholder, attribute)]),
                        ..Default::default()
                    });
                }
            } else {
                let value_placeholder = format!(":{attribute}_set");
                update.set.push(Expression {
                    text: format!("{name_placeholder} = {value_placeholder}"),
                    names: collections::HashMap::from([(name_placeholder, attribute)]),
                    values: collections::HashMap::from([(value_placeholder, value)]),
                });
            }
        }
        update
    }

    fn generate<S: ItemSchema<Item = T>>(
        &self,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<GeneratedUpdate> {
        common::ensure_primary_index("UpdateItem", context)?;
        let item = schema.item_to_map(&self.item, false)?;
        let prepared = write::common::apply_before_write(
            item,
            self.condition.clone(),
            context,
            schema.metadata(),
            extension,
        )?;
        write::common::ensure_partition_key(&prepared.item, schema.metadata())?;
        let mut item = prepared.item;
        let key = Self::split_key(&mut item, schema.metadata())?;
        let mut update = Self::item_update_expression(item, self.ignore_nulls);
        if let Some(contributed) = prepared.update_expression {
            update = update.merge(contributed);
        }
        let update_expression = if update.is_empty() {
            None
        } else {
            Some(update.build()?)
        };
        Ok(GeneratedUpdate {
            key,
            update_expression,
            condition: prepared.condition,
        })
    }

    fn shape_expressions(
        generated: &GeneratedUpdate,
    ) -> Result<(
        Option<String>,
        Option<String>,
        Option<collections::HashMap<String, String>>,
        Option<collections::HashMap<String, types::AttributeValue>>,
    )> {
        let mut names = None;
        let mut values = None;
        let update_text = generated
            .update_expression
            .clone()
            .map(|expression| expression.merge_bindings_into(&mut names, &mut values))
            .transpose()?;
        let condition_text = generated
            .condition
            .clone()
            .map(|expression| expression.merge_bindings_into(&mut names, &mut values))
            .transpose()?;
        Ok((update_text, condition_text, names, values))
    }

    /// Build the wire request, deriving the update expression from the
    /// item and merging extension contributions. The updated item comes
    /// back via `ALL_NEW` return values.
    pub fn generate_request<S: ItemSchema<Item = T>>(
        &self,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<operation::update_item::UpdateItemInput> {
        let generated = self.generate(schema, context, extension)?;
        let (update_text, condition_text, names, values) = Self::shape_expressions(&generated)?;
        let input = operation::update_item::UpdateItemInput::builder()
            .table_name(context.table_name())
            .set_key(Some(generated.key))
            .set_update_expression(update_text)
            .set_condition_expression(condition_text)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .return_values(types::ReturnValue::AllNew)
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Wrap the generated update into a transaction write envelope.
    pub fn generate_transact_write_item<S: ItemSchema<Item = T>>(
        &self,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<types::TransactWriteItem> {
        let generated = self.generate(schema, context, extension)?;
        let (update_text, condition_text, names, values) = Self::shape_expressions(&generated)?;
        let update_text = update_text.ok_or_else(|| {
            Error::invalid_request("a transactional update requires at least one update clause")
        })?;
        let update = types::Update::builder()
            .table_name(context.table_name())
            .set_key(Some(generated.key))
            .update_expression(update_text)
            .set_condition_expression(condition_text)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(types::TransactWriteItem::builder().update(update).build())
    }

    /// Convert the updated item (returned via `ALL_NEW`) back to a typed
    /// item, running the after-read hook first.
    pub fn transform_response<S: ItemSchema<Item = T>>(
        &self,
        output: operation::update_item::UpdateItemOutput,
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

    /// Execute the update item operation, returning the updated item.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.update_item", skip_all, err)
    )]
    pub async fn send<S: ItemSchema<Item = T>>(
        &self,
        client: &Client,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<Option<T>> {
        let input = self.generate_request(schema, context, extension)?;
        let output = client
            .update_item()
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_update_expression(input.update_expression)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_return_values(input.return_values)
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

    fn schema() -> StaticSchema<Value> {
        StaticSchema::new(TableMetadata {
            partition_key: "id".to_string(),
            ..Default::default()
        })
    }

    fn sorted_schema() -> StaticSchema<Value> {
        StaticSchema::new(TableMetadata {
            partition_key: "id".to_string(),
            sort_key: Some("sort".to_string()),
            ..Default::default()
        })
    }

    #[rstest]
    #[case::set_only(
        UpdateItem::new(json!({"id": "1", "name": "Jane"})),
        "SET #name = :name_set",
        None
    )]
    #[case::set_and_remove(
        UpdateItem::new(json!({"id": "1", "name": "Jane", "age": null})),
        "SET #name = :name_set REMOVE #age",
        None
    )]
    #[case::two_nulls_one_remove_clause(
        UpdateItem::new(json!({"id": "1", "age": null, "nickname": null})),
        "REMOVE #age, #nickname",
        None
    )]
    #[case::ignore_nulls_omits_removes(
        UpdateItem {
            ignore_nulls: true,
            ..UpdateItem::new(json!({"id": "1", "name": "Jane", "age": null}))
        },
        "SET #name = :name_set",
        None
    )]
    #[case::key_only_item_has_no_update_expression(
        UpdateItem::new(json!({"id": "1"})),
        "",
        None
    )]
    #[case::with_condition(
        UpdateItem {
            condition: Some(Expression::plain("attribute_exists(id)")),
            ..UpdateItem::new(json!({"id": "1", "name": "Jane"}))
        },
        "SET #name = :name_set",
        Some("attribute_exists(id)")
    )]
    fn test_generate_request_expressions(
        #[case] update_item: UpdateItem<Value>,
        #[case] expected_update: &str,
        #[case] expected_condition: Option<&str>,
    ) {
        let context = OperationContext::new("users");
        let input = update_item
            .generate_request(&schema(), &context, None)
            .unwrap();
        match expected_update {
            "" => assert!(input.update_expression.is_none()),
            expected => assert_eq!(input.update_expression.as_deref(), Some(expected)),
        }
        assert_eq!(input.condition_expression.as_deref(), expected_condition);
        assert_eq!(input.return_values, Some(types::ReturnValue::AllNew));
        assert_eq!(
            input.key.as_ref().unwrap().get("id"),
            Some(&types::AttributeValue::S("1".to_string()))
        );
    }

    #[test]
    fn test_key_attributes_never_appear_in_update_expression() {
        let update_item = UpdateItem::new(json!({"id": "1", "sort": "a", "name": "Jane"}));
        let context = OperationContext::new("users");
        let input = update_item
            .generate_request(&sorted_schema(), &context, None)
            .unwrap();
        let key = input.key.unwrap();
        assert_eq!(key.len(), 2);
        assert_eq!(
            input.update_expression.as_deref(),
            Some("SET #name = :name_set")
        );
    }

    #[test]
    fn test_missing_sort_key_value_is_rejected() {
        let update_item = UpdateItem::new(json!({"id": "1", "name": "Jane"}));
        let context = OperationContext::new("users");
        assert!(matches!(
            update_item
                .generate_request(&sorted_schema(), &context, None)
                .unwrap_err(),
            Error::InvalidRequest { .. }
        ));
    }

    #[test]
    fn test_extension_update_clauses_merge_into_generated_groups() {
        struct Stamp;

        impl Extension for Stamp {
            fn before_write(&self, _: BeforeWrite<'_>) -> Result<WriteModification, BoxError> {
                Ok(WriteModification {
                    update_expression: Some(UpdateExpression {
                        set: vec![Expression {
                            text: "#version = :version".to_string(),
                            names: collections::HashMap::from([(
                                "#version".to_string(),
                                "version".to_string(),
                            )]),
                            values: collections::HashMap::from([(
                                ":version".to_string(),
                                types::AttributeValue::N("1".to_string()),
                            )]),
                        }],
                        ..Default::default()
                    }),
                    ..Default::default()
                })
            }
        }

        let update_item = UpdateItem::new(json!({"id": "1", "name": "Jane"}));
        let context = OperationContext::new("users");
        let input = update_item
            .generate_request(&schema(), &context, Some(&Stamp))
            .unwrap();
        assert_eq!(
            input.update_expression.as_deref(),
            Some("SET #name = :name_set, #version = :version")
        );
        let values = input.expression_attribute_values.unwrap();
        assert_eq!(
            values.get(":version"),
            Some(&types::AttributeValue::N("1".to_string()))
        );
    }

    #[test]
    fn test_secondary_index_is_rejected() {
        let update_item = UpdateItem::new(json!({"id": "1"}));
        let context = OperationContext::with_index("users", "email-index");
        assert!(matches!(
            update_item
                .generate_request(&schema(), &context, None)
                .unwrap_err(),
            Error::InvalidRequest { .. }
        ));
    }

    #[test]
    fn test_generate_transact_write_item_requires_update_clause() {
        let update_item = UpdateItem::new(json!({"id": "1"}));
        let context = OperationContext::new("users");
        assert!(matches!(
            update_item
                .generate_transact_write_item(&schema(), &context, None)
                .unwrap_err(),
            Error::InvalidRequest { .. }
        ));
        let update_item = UpdateItem::new(json!({"id": "1", "name": "Jane"}));
        let envelope = update_item
            .generate_transact_write_item(&schema(), &context, None)
            .unwrap();
        let update = envelope.update.unwrap();
        assert_eq!(update.update_expression, "SET #name = :name_set");
    }

    #[test]
    fn test_transform_response_returns_updated_item() {
        let update_item = UpdateItem::new(json!({"id": "1", "name": "Jane"}));
        let context = OperationContext::new("users");
        let output = operation::update_item::UpdateItemOutput::builder()
            .attributes("id", types::AttributeValue::S("1".to_string()))
            .attributes("name", types::AttributeValue::S("Jane".to_string()))
            .build();
        let updated = update_item
            .transform_response(output, &schema(), &context, None)
            .unwrap();
        assert_eq!(updated, Some(json!({"id": "1", "name": "Jane"})));
    }
}
