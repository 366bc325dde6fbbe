use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::{AttributeMap, Expression};
use crate::common::extension::Extension;
use crate::common::key::Key;
use crate::common::schema::{ItemSchema, TableMetadata};
use crate::common::selection::SelectionMap;
use crate::read;

use aws_sdk_dynamodb::{Client, operation, types};

/// Key condition flavor of a query.
///
/// The partition key is always bound; the `Sort*` flavors additionally
/// bind the sort key of the target index and reject keys that carry no
/// sort value.
///
/// ```rust
/// use dynamodb_mapper::common::key;
/// use dynamodb_mapper::read::query;
///
/// let same_day = query::QueryConditional::SortBeginsWith(
///     key::Key::with_sort("user-1", "2024-05-").unwrap(),
/// );
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum QueryConditional {
    /// Partition and sort key both equal the key's values.
    KeyEqualTo(Key),
    /// Sort key strictly greater than the key's sort value.
    SortGreaterThan(Key),
    /// Sort key greater than or equal to the key's sort value.
    SortGreaterThanOrEqualTo(Key),
    /// Sort key strictly less than the key's sort value.
    SortLessThan(Key),
    /// Sort key less than or equal to the key's sort value.
    SortLessThanOrEqualTo(Key),
    /// Sort key begins with the key's sort value (string sort keys only).
    SortBeginsWith(Key),
    /// Sort key between the two keys' sort values, inclusive.
    SortBetween(Key, Key),
}

fn attribute_clause(
    attribute: &str,
    text: impl FnOnce(&str) -> String,
    values: Vec<(String, types::AttributeValue)>,
) -> Expression {
    let placeholder = format!("#{attribute}");
    Expression {
        text: text(&placeholder),
        names: std::collections::HashMap::from([(placeholder, attribute.to_string())]),
        values: values.into_iter().collect(),
    }
}

impl QueryConditional {
    fn key(&self) -> &Key {
        match self {
            Self::KeyEqualTo(key)
            | Self::SortGreaterThan(key)
            | Self::SortGreaterThanOrEqualTo(key)
            | Self::SortLessThan(key)
            | Self::SortLessThanOrEqualTo(key)
            | Self::SortBeginsWith(key)
            | Self::SortBetween(key, _) => key,
        }
    }

    fn flavor(&self) -> &'static str {
        match self {
            Self::KeyEqualTo(_) => "key-equal-to",
            Self::SortGreaterThan(_) => "sort-greater-than",
            Self::SortGreaterThanOrEqualTo(_) => "sort-greater-than-or-equal-to",
            Self::SortLessThan(_) => "sort-less-than",
            Self::SortLessThanOrEqualTo(_) => "sort-less-than-or-equal-to",
            Self::SortBeginsWith(_) => "sort-begins-with",
            Self::SortBetween(_, _) => "sort-between",
        }
    }

    fn sort_value(&self, key: &Key) -> Result<types::AttributeValue> {
        key.sort_value.clone().ok_or_else(|| {
            Error::invalid_request(format!(
                "a {} query conditional requires a sort key value",
                self.flavor()
            ))
        })
    }

    fn sorted_index_keys<'a>(
        &self,
        metadata: &'a TableMetadata,
        index_name: &str,
    ) -> Result<(&'a str, &'a str)> {
        let mut keys = metadata.index_keys(index_name)?.into_iter();
        let partition_key = keys
            .next()
            .ok_or_else(|| Error::invalid_request("the target index declares no partition key"))?;
        let sort_key = keys.next().ok_or_else(|| {
            Error::invalid_request(format!(
                "a {} query conditional requires a sort key but the target index declares none",
                self.flavor()
            ))
        })?;
        Ok((partition_key, sort_key))
    }

    fn partition_clause(&self, partition_key: &str) -> Expression {
        let value_placeholder = format!(":{partition_key}_eq0");
        attribute_clause(
            partition_key,
            |placeholder| format!("{placeholder} = {value_placeholder}"),
            vec![(value_placeholder.clone(), self.key().partition_value.clone())],
        )
    }

    fn sort_comparison_clause(
        &self,
        sort_key: &str,
        operator: &str,
        suffix: &str,
        value: types::AttributeValue,
    ) -> Expression {
        let value_placeholder = format!(":{sort_key}_{suffix}1");
        attribute_clause(
            sort_key,
            |placeholder| format!("{placeholder} {operator} {value_placeholder}"),
            vec![(value_placeholder.clone(), value)],
        )
    }

    /// Produce the key-condition expression for the target index.
    pub fn expression(&self, metadata: &TableMetadata, index_name: &str) -> Result<Expression> {
        let sort_clause = match self {
            Self::KeyEqualTo(key) => {
                let mut keys = metadata.index_keys(index_name)?.into_iter();
                let partition_key = keys.next().ok_or_else(|| {
                    Error::invalid_request("the target index declares no partition key")
                })?;
                let partition_clause = self.partition_clause(partition_key);
                return match (keys.next(), &key.sort_value) {
                    (Some(sort_key), Some(sort_value)) => {
                        let sort_clause = self.sort_comparison_clause(
                            sort_key,
                            "=",
                            "eq",
                            sort_value.clone(),
                        );
                        partition_clause.join(sort_clause, " AND ")
                    }
                    (Some(sort_key), None) => Err(Error::invalid_request(format!(
                        "a key-equal-to query conditional against the sorted index requires a value for the sort key `{sort_key}`"
                    ))),
                    (None, Some(_)) => Err(Error::invalid_request(
                        "a sort key value was provided but the target index declares no sort key",
                    )),
                    (None, None) => Ok(partition_clause),
                };
            }
            Self::SortGreaterThan(key) => {
                let (_, sort_key) = self.sorted_index_keys(metadata, index_name)?;
                self.sort_comparison_clause(sort_key, ">", "gt", self.sort_value(key)?)
            }
            Self::SortGreaterThanOrEqualTo(key) => {
                let (_, sort_key) = self.sorted_index_keys(metadata, index_name)?;
                self.sort_comparison_clause(sort_key, ">=", "gte", self.sort_value(key)?)
            }
            Self::SortLessThan(key) => {
                let (_, sort_key) = self.sorted_index_keys(metadata, index_name)?;
                self.sort_comparison_clause(sort_key, "<", "lt", self.sort_value(key)?)
            }
            Self::SortLessThanOrEqualTo(key) => {
                let (_, sort_key) = self.sorted_index_keys(metadata, index_name)?;
                self.sort_comparison_clause(sort_key, "<=", "lte", self.sort_value(key)?)
            }
            Self::SortBeginsWith(key) => {
                let (_, sort_key) = self.sorted_index_keys(metadata, index_name)?;
                if let Some(types::ScalarAttributeType::N) = metadata.scalar_type(sort_key) {
                    return Err(Error::invalid_request(format!(
                        "a sort-begins-with query conditional cannot be used against the numeric sort key `{sort_key}`"
                    )));
                }
                let prefix = match self.sort_value(key)? {
                    value @ types::AttributeValue::S(_) => value,
                    _ => {
                        return Err(Error::invalid_request(
                            "a sort-begins-with query conditional requires a string sort key value",
                        ));
                    }
                };
                let value_placeholder = format!(":{sort_key}_begins_with1");
                attribute_clause(
                    sort_key,
                    |placeholder| format!("begins_with({placeholder}, {value_placeholder})"),
                    vec![(value_placeholder.clone(), prefix)],
                )
            }
            Self::SortBetween(from, to) => {
                let (_, sort_key) = self.sorted_index_keys(metadata, index_name)?;
                let from_value = self.sort_value(from)?;
                let to_value = self.sort_value(to)?;
                let from_placeholder = format!(":{sort_key}_between1");
                let to_placeholder = format!(":{sort_key}_between2");
                attribute_clause(
                    sort_key,
                    |placeholder| {
                        format!("{placeholder} BETWEEN {from_placeholder} AND {to_placeholder}")
                    },
                    vec![
                        (from_placeholder.clone(), from_value),
                        (to_placeholder.clone(), to_value),
                    ],
                )
            }
        };
        let (partition_key, _) = self.sorted_index_keys(metadata, index_name)?;
        self.partition_clause(partition_key)
            .join(sort_clause, " AND ")
    }
}

/// Query operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{context, key, schema};
/// use dynamodb_mapper::read::{self, query};
/// use serde_json::Value;
///
/// # async fn example(
/// #     client: &Client,
/// #     schema: &schema::StaticSchema<Value>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let query = query::Query::new(query::QueryConditional::KeyEqualTo(key::Key::new("1")?));
/// let context = context::OperationContext::new("users");
/// let page = query.send(client, schema, &context, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    /// The key condition selecting which items to return.
    pub conditional: QueryConditional,
    /// Filter applied server-side after the key condition.
    pub filter: Option<Expression>,
    /// Which attributes to return; all attributes when unset.
    pub projection: Option<SelectionMap>,
    /// Whether to use a strongly consistent read.
    pub consistent_read: Option<bool>,
    /// Pagination cursor from a previous page's `last_evaluated_key`.
    pub exclusive_start_key: Option<AttributeMap>,
    /// Maximum number of items to evaluate for this page.
    pub limit: Option<i32>,
    /// Sort direction: `false` for descending. Passed through verbatim.
    pub scan_index_forward: Option<bool>,
}

impl Query {
    /// Query with a key condition and the operation defaults.
    pub fn new(conditional: QueryConditional) -> Self {
        Self {
            conditional,
            filter: None,
            projection: None,
            consistent_read: None,
            exclusive_start_key: None,
            limit: None,
            scan_index_forward: None,
        }
    }

    /// Build the wire request. The key condition is validated against the
    /// target index; a placeholder collision between the filter and the
    /// key condition is rejected.
    pub fn generate_request<S: ItemSchema>(
        &self,
        schema: &S,
        context: &OperationContext,
    ) -> Result<operation::query::QueryInput> {
        let key_condition = self
            .conditional
            .expression(schema.metadata(), context.index_name())?;
        let mut expressions =
            read::common::ReadExpressions::shape(self.filter.clone(), self.projection.clone())?;
        let key_condition_expression = expressions.merge_key_condition(key_condition)?;
        let input = operation::query::QueryInput::builder()
            .table_name(context.table_name())
            .set_index_name(context.request_index_name())
            .key_condition_expression(key_condition_expression)
            .set_filter_expression(expressions.filter_expression)
            .set_projection_expression(expressions.projection_expression)
            .set_expression_attribute_names(expressions.names)
            .set_expression_attribute_values(expressions.values)
            .set_consistent_read(self.consistent_read)
            .set_exclusive_start_key(self.exclusive_start_key.clone())
            .set_limit(self.limit)
            .set_scan_index_forward(self.scan_index_forward)
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Convert one page of results, running the after-read hook per item
    /// in response order.
    pub fn transform_response<S: ItemSchema>(
        &self,
        output: operation::query::QueryOutput,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<read::common::Page<S::Item>> {
        let items = read::common::transform_items(
            output.items.unwrap_or_default(),
            schema,
            context,
            extension,
        )?;
        Ok(read::common::Page {
            items,
            last_evaluated_key: output.last_evaluated_key,
        })
    }

    /// Execute the query operation, returning one page.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.query", skip_all, err)
    )]
    pub async fn send<S: ItemSchema>(
        &self,
        client: &Client,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<read::common::Page<S::Item>> {
        let input = self.generate_request(schema, context)?;
        let output = client
            .query()
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_key_condition_expression(input.key_condition_expression)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_consistent_read(input.consistent_read)
            .set_exclusive_start_key(input.exclusive_start_key)
            .set_limit(input.limit)
            .set_scan_index_forward(input.scan_index_forward)
            .send()
            .await
            .map_err(Error::transport)?;
        self.transform_response(output, schema, context, extension)
    }
}
