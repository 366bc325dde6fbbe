use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::{AttributeMap, Expression};
use crate::common::extension::{AfterRead, Extension};
use crate::common::schema::{ItemSchema, TableMetadata};
use crate::common::selection::SelectionMap;

use aws_sdk_dynamodb::types;
use std::collections;

/// One page of a Query or Scan result.
///
/// `last_evaluated_key` present means more pages exist; feed it back as
/// the next request's `exclusive_start_key` to resume. Items preserve
/// response order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page<T> {
    /// The items of this page, in response order.
    pub items: Vec<T>,
    /// The pagination cursor, absent on the final page.
    pub last_evaluated_key: Option<AttributeMap>,
}

/// Run the after-read hook on one returned item.
pub(crate) fn apply_after_read(
    item: AttributeMap,
    context: &OperationContext,
    metadata: &TableMetadata,
    extension: Option<&dyn Extension>,
) -> Result<AttributeMap> {
    let Some(extension) = extension else {
        return Ok(item);
    };
    let modification = extension
        .after_read(AfterRead {
            items: &item,
            operation_context: context,
            table_metadata: metadata,
        })
        .map_err(Error::extension)?;
    Ok(modification.transformed_item.unwrap_or(item))
}

/// Transform a list of returned attribute maps into typed items,
/// applying the after-read hook per item in response order.
pub(crate) fn transform_items<S: ItemSchema>(
    items: Vec<AttributeMap>,
    schema: &S,
    context: &OperationContext,
    extension: Option<&dyn Extension>,
) -> Result<Vec<S::Item>> {
    let mut transformed = Vec::with_capacity(items.len());
    for item in items {
        let item = apply_after_read(item, context, schema.metadata(), extension)?;
        transformed.push(schema.map_to_item(item)?);
    }
    Ok(transformed)
}

/// Expression fields shared by Query and Scan wire requests.
#[derive(Debug, Default)]
pub(crate) struct ReadExpressions {
    pub(crate) names: Option<collections::HashMap<String, String>>,
    pub(crate) values: Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) filter_expression: Option<String>,
    pub(crate) projection_expression: Option<String>,
}

impl ReadExpressions {
    /// Merge a caller filter and projection into one set of bindings.
    /// Placeholder collisions across the fragments are rejected.
    pub(crate) fn shape(
        filter: Option<Expression>,
        projection: Option<SelectionMap>,
    ) -> Result<Self> {
        let mut shaped = Self::default();
        if let Some(filter) = filter {
            let text = filter.merge_bindings_into(&mut shaped.names, &mut shaped.values)?;
            shaped.filter_expression = Some(text);
        }
        if let Some(projection) = projection {
            let projection: Expression = projection.into();
            let text = projection.merge_bindings_into(&mut shaped.names, &mut shaped.values)?;
            shaped.projection_expression = Some(text);
        }
        Ok(shaped)
    }

    /// Merge a key-condition expression's bindings in, returning its text.
    /// A collision with the filter or projection namespace is rejected.
    pub(crate) fn merge_key_condition(&mut self, key_condition: Expression) -> Result<String> {
        key_condition.merge_bindings_into(&mut self.names, &mut self.values)
    }
}
