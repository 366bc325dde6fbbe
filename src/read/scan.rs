use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::{AttributeMap, Expression};
use crate::common::extension::Extension;
use crate::common::schema::ItemSchema;
use crate::common::selection::SelectionMap;
use crate::read;

use aws_sdk_dynamodb::{Client, operation};

/// Scan operation.
///
/// Unlike the key-addressed operations, a scan may target a secondary
/// index through its [`OperationContext`].
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{context, schema};
/// use dynamodb_mapper::read::scan;
/// use serde_json::Value;
///
/// # async fn example(
/// #     client: &Client,
/// #     schema: &schema::StaticSchema<Value>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let scan = scan::Scan::default();
/// let context = context::OperationContext::new("users");
/// let page = scan.send(client, schema, &context, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// Filter applied server-side to every scanned item.
    pub filter: Option<Expression>,
    /// Which attributes to return; all attributes when unset.
    pub projection: Option<SelectionMap>,
    /// Whether to use a strongly consistent read.
    pub consistent_read: Option<bool>,
    /// Pagination cursor from a previous page's `last_evaluated_key`.
    pub exclusive_start_key: Option<AttributeMap>,
    /// Maximum number of items to evaluate for this page.
    pub limit: Option<i32>,
    /// The segment number for parallel scans (0-indexed).
    pub segment: Option<i32>,
    /// The total number of segments for parallel scans.
    pub total_segments: Option<i32>,
}

impl Scan {
    /// Build the wire request.
    pub fn generate_request(&self, context: &OperationContext) -> Result<operation::scan::ScanInput> {
        let expressions =
            read::common::ReadExpressions::shape(self.filter.clone(), self.projection.clone())?;
        let input = operation::scan::ScanInput::builder()
            .table_name(context.table_name())
            .set_index_name(context.request_index_name())
            .set_filter_expression(expressions.filter_expression)
            .set_projection_expression(expressions.projection_expression)
            .set_expression_attribute_names(expressions.names)
            .set_expression_attribute_values(expressions.values)
            .set_consistent_read(self.consistent_read)
            .set_exclusive_start_key(self.exclusive_start_key.clone())
            .set_limit(self.limit)
            .set_segment(self.segment)
            .set_total_segments(self.total_segments)
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Convert one page of results, running the after-read hook per item
    /// in response order.
    pub fn transform_response<S: ItemSchema>(
        &self,
        output: operation::scan::ScanOutput,
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

    /// Execute the scan operation, returning one page.
    pub async fn send<S: ItemSchema>(
        &self,
        client: &Client,
        schema: &S,
        context: &OperationContext,
        extension: Option<&dyn Extension>,
    ) -> Result<read::common::Page<S::Item>> {
        let input = self.generate_request(context)?;
        let output = client
            .scan()
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_consistent_read(input.consistent_read)
            .set_exclusive_start_key(input.exclusive_start_key)
            .set_limit(input.limit)
            .set_segment(input.segment)
            .set_total_segments(input.total_segments)
            .send()
            .await
            .map_err(Error::transport)?;
        self.transform_response(output, schema, context, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::schema::{StaticSchema, TableMetadata};

    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use serde_json::Value;
    use std::collections;

    fn schema() -> StaticSchema<Value> {
        StaticSchema::new(TableMetadata {
            partition_key: "id".to_string(),
            ..Default::default()
        })
    }

    #[rstest]
    #[case::empty(
        Scan::default(),
        OperationContext::new("users"),
        operation::scan::ScanInput::builder()
            .table_name("users")
            .build()
            .unwrap()
    )]
    #[case::index_with_segments(
        Scan {
            segment: Some(0),
            total_segments: Some(4),
            limit: Some(25),
            ..Default::default()
        },
        OperationContext::with_index("users", "email-index"),
        operation::scan::ScanInput::builder()
            .table_name("users")
            .index_name("email-index")
            .segment(0)
            .total_segments(4)
            .limit(25)
            .build()
            .unwrap()
    )]
    #[case::filter_and_projection(
        Scan {
            filter: Some(Expression {
                text: "#age > :age".to_string(),
                names: collections::HashMap::from([("#age".to_string(), "age".to_string())]),
                values: collections::HashMap::from([(
                    ":age".to_string(),
                    types::AttributeValue::N("21".to_string()),
                )]),
            }),
            projection: Some(SelectionMap::Leaves(vec!["name".to_string()])),
            ..Default::default()
        },
        OperationContext::new("users"),
        operation::scan::ScanInput::builder()
            .table_name("users")
            .filter_expression("#age > :age")
            .projection_expression("#name")
            .expression_attribute_names("#age", "age")
            .expression_attribute_names("#name", "name")
            .expression_attribute_values(":age", types::AttributeValue::N("21".to_string()))
            .build()
            .unwrap()
    )]
    fn test_generate_request(
        #[case] scan: Scan,
        #[case] context: OperationContext,
        #[case] expected: operation::scan::ScanInput,
    ) {
        let actual = scan.generate_request(&context).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_transform_response_without_extension_matches_schema_conversion() {
        let scan = Scan::default();
        let context = OperationContext::new("users");
        let raw = collections::HashMap::from([
            ("id".to_string(), types::AttributeValue::S("a".to_string())),
            ("age".to_string(), types::AttributeValue::N("30".to_string())),
        ]);
        let output = operation::scan::ScanOutput::builder()
            .items(raw.clone())
            .build();
        let page = scan
            .transform_response(output, &schema(), &context, None)
            .unwrap();
        assert_eq!(page.items, vec![schema().map_to_item(raw).unwrap()]);
        assert!(page.last_evaluated_key.is_none());
    }
}
