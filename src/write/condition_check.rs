use crate::common;
use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::expression::Expression;
use crate::common::key::Key;
use crate::common::schema::ItemSchema;
use crate::write::common::split_condition;

use aws_sdk_dynamodb::types;

/// Condition check, a transaction-only constituent.
///
/// Asserts a condition against an item without writing it; only
/// meaningful inside a transact-write call, so the single exposed
/// conversion is [`Self::generate_transact_write_item`]. No extension
/// hook runs: the check carries a bare key, not an item.
///
/// ```rust
/// use dynamodb_mapper::common::{expression, key};
/// use dynamodb_mapper::write::condition_check;
///
/// let check = condition_check::ConditionCheck::new(
///     key::Key::new("1").unwrap(),
///     expression::Expression::plain("attribute_exists(id)"),
/// );
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionCheck {
    /// The primary key of the item to check.
    pub key: Key,
    /// The condition that must hold for the transaction to commit.
    pub condition: Expression,
    /// Which item attributes to return if the condition check fails.
    pub return_values_on_condition_check_failure:
        Option<types::ReturnValuesOnConditionCheckFailure>,
}

impl ConditionCheck {
    /// Check a condition against the item identified by `key`.
    pub fn new(key: Key, condition: Expression) -> Self {
        Self {
            key,
            condition,
            return_values_on_condition_check_failure: None,
        }
    }

    /// Wrap the check into a transaction write envelope.
    pub fn generate_transact_write_item<S: ItemSchema>(
        &self,
        schema: &S,
        context: &OperationContext,
    ) -> Result<types::TransactWriteItem> {
        common::ensure_primary_index("ConditionCheck", context)?;
        let key = self.key.key_map(schema.metadata())?;
        let (condition_expression, names, values) = split_condition(Some(self.condition.clone()));
        let condition_check = types::ConditionCheck::builder()
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
        Ok(types::TransactWriteItem::builder()
            .condition_check(condition_check)
            .build())
    }
}
