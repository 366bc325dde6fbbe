use crate::common::context::OperationContext;
use crate::common::expression::{AttributeMap, Expression, UpdateExpression};
use crate::common::schema::TableMetadata;

use std::error;

/// Error type returned by extension hooks.
pub type BoxError = Box<dyn error::Error + Send + Sync>;

/// Context handed to [`Extension::before_write`].
///
/// Constructed fresh per item per operation invocation; read-only to the
/// extension.
#[derive(Clone, Copy, Debug)]
pub struct BeforeWrite<'a> {
    /// The item about to be written, as an attribute map.
    pub items: &'a AttributeMap,
    /// The table and index the operation targets.
    pub operation_context: &'a OperationContext,
    /// The target table's key structure.
    pub table_metadata: &'a TableMetadata,
}

/// Context handed to [`Extension::after_read`].
#[derive(Clone, Copy, Debug)]
pub struct AfterRead<'a> {
    /// The item just read, as an attribute map.
    pub items: &'a AttributeMap,
    /// The table and index the operation targets.
    pub operation_context: &'a OperationContext,
    /// The target table's key structure.
    pub table_metadata: &'a TableMetadata,
}

/// Side effects of a [`Extension::before_write`] invocation.
///
/// Every field is optional; absence means "no change".
#[derive(Debug, Default)]
pub struct WriteModification {
    /// A replacement for the item being written.
    pub transformed_item: Option<AttributeMap>,
    /// A condition to combine with the caller's condition expression.
    pub additional_conditional_expression: Option<Expression>,
    /// Update clauses to combine with a generated update expression.
    pub update_expression: Option<UpdateExpression>,
}

/// Side effects of a [`Extension::after_read`] invocation.
#[derive(Debug, Default)]
pub struct ReadModification {
    /// A replacement for the item that was read.
    pub transformed_item: Option<AttributeMap>,
}

/// A pluggable interceptor around item writes and reads.
///
/// `before_write` runs exactly once per logical item being written (puts,
/// updates, batch-write puts) and never for bare keys that only identify
/// an item. `after_read` runs exactly once per item returned by a read
/// operation, in response order, before conversion back to a typed item.
///
/// Both hooks default to no-ops, so an extension only implements the side
/// it cares about. A hook error fails the whole operation as an
/// extension failure; no partial application is retried.
pub trait Extension {
    /// Intercept an item about to be written.
    fn before_write(&self, context: BeforeWrite<'_>) -> Result<WriteModification, BoxError> {
        let _ = context;
        Ok(WriteModification::default())
    }

    /// Intercept an item just read.
    fn after_read(&self, context: AfterRead<'_>) -> Result<ReadModification, BoxError> {
        let _ = context;
        Ok(ReadModification::default())
    }
}

/// Composes several extensions into one.
///
/// Extensions run in registration order for both hooks. Each extension
/// sees the item as transformed by its predecessors; condition and
/// update-expression contributions accumulate independently, conditions
/// joined with ` AND `, update clauses appended group by group.
///
/// ```rust
/// use dynamodb_mapper::common::extension;
///
/// let chain = extension::ChainExtension::new(Vec::new());
/// ```
#[derive(Default)]
pub struct ChainExtension {
    extensions: Vec<Box<dyn Extension + Send + Sync>>,
}

impl ChainExtension {
    /// Build a chain from extensions in their registration order.
    pub fn new(extensions: Vec<Box<dyn Extension + Send + Sync>>) -> Self {
        Self { extensions }
    }

    /// Append an extension at the end of the chain.
    pub fn register(&mut self, extension: Box<dyn Extension + Send + Sync>) {
        self.extensions.push(extension);
    }
}

impl Extension for ChainExtension {
    fn before_write(&self, context: BeforeWrite<'_>) -> Result<WriteModification, BoxError> {
        let mut transformed_item: Option<AttributeMap> = None;
        let mut condition: Option<Expression> = None;
        let mut update_expression: Option<UpdateExpression> = None;
        for extension in &self.extensions {
            let items = transformed_item.as_ref().unwrap_or(context.items);
            let modification = extension.before_write(BeforeWrite {
                items,
                operation_context: context.operation_context,
                table_metadata: context.table_metadata,
            })?;
            if let Some(item) = modification.transformed_item {
                transformed_item = Some(item);
            }
            condition = Expression::join_optional(
                condition,
                modification.additional_conditional_expression,
                " AND ",
            )?;
            update_expression = match (update_expression, modification.update_expression) {
                (Some(current), Some(extra)) => Some(current.merge(extra)),
                (current, extra) => current.or(extra),
            };
        }
        Ok(WriteModification {
            transformed_item,
            additional_conditional_expression: condition,
            update_expression,
        })
    }

    fn after_read(&self, context: AfterRead<'_>) -> Result<ReadModification, BoxError> {
        let mut transformed_item: Option<AttributeMap> = None;
        for extension in &self.extensions {
            let items = transformed_item.as_ref().unwrap_or(context.items);
            let modification = extension.after_read(AfterRead {
                items,
                operation_context: context.operation_context,
                table_metadata: context.table_metadata,
            })?;
            if let Some(item) = modification.transformed_item {
                transformed_item = Some(item);
            }
        }
        Ok(ReadModification { transformed_item })
    }
}
