use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::{AttributeMap, Expression, UpdateExpression};
use crate::common::extension::{BeforeWrite, Extension};
use crate::common::schema::TableMetadata;

/// Outcome of running the before-write hook on one item.
#[derive(Debug, Default)]
pub(crate) struct PreparedWrite {
    pub(crate) item: AttributeMap,
    pub(crate) condition: Option<Expression>,
    pub(crate) update_expression: Option<UpdateExpression>,
}

/// Run the before-write hook on an item about to be written and fold the
/// caller's condition with the extension's contribution.
pub(crate) fn apply_before_write(
    item: AttributeMap,
    caller_condition: Option<Expression>,
    context: &OperationContext,
    metadata: &TableMetadata,
    extension: Option<&dyn Extension>,
) -> Result<PreparedWrite> {
    let Some(extension) = extension else {
        return Ok(PreparedWrite {
            item,
            condition: caller_condition,
            update_expression: None,
        });
    };
    let modification = extension
        .before_write(BeforeWrite {
            items: &item,
            operation_context: context,
            table_metadata: metadata,
        })
        .map_err(Error::extension)?;
    let condition = Expression::join_optional(
        caller_condition,
        modification.additional_conditional_expression,
        " AND ",
    )?;
    Ok(PreparedWrite {
        item: modification.transformed_item.unwrap_or(item),
        condition,
        update_expression: modification.update_expression,
    })
}

/// Split a merged condition expression into the three wire request
/// fields, leaving empty binding maps unset.
pub(crate) fn split_condition(
    condition: Option<Expression>,
) -> (
    Option<String>,
    Option<std::collections::HashMap<String, String>>,
    Option<std::collections::HashMap<String, aws_sdk_dynamodb::types::AttributeValue>>,
) {
    match condition {
        None => (None, None, None),
        Some(condition) => (
            Some(condition.text),
            (!condition.names.is_empty()).then_some(condition.names),
            (!condition.values.is_empty()).then_some(condition.values),
        ),
    }
}

/// Reject items whose attribute map lacks the schema's partition key.
pub(crate) fn ensure_partition_key(item: &AttributeMap, metadata: &TableMetadata) -> Result<()> {
    if item.contains_key(&metadata.partition_key) {
        Ok(())
    } else {
        Err(Error::invalid_request(format!(
            "the item is missing the partition key `{}`",
            metadata.partition_key
        )))
    }
}
