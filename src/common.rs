//! Common building blocks shared by every operation.
//!
//! This module provides the expression machinery, the table schema
//! capability, the extension pipeline, and the key and selection types
//! used across read, write and table operations.

/// The (table, index) pair identifying an operation's target.
pub mod context;

/// The crate's error taxonomy.
pub mod error;

/// Expression fragments and their merge rules.
pub mod expression;

/// The before-write / after-read interception pipeline.
pub mod extension;

/// Key types for identifying items in DynamoDB tables.
pub mod key;

/// The item schema capability and table metadata descriptors.
pub mod schema;

/// Attribute selection for projection expressions.
pub mod selection;

use crate::common::error::{Error, Result};

pub(crate) fn add_placeholder(keys: &[String], identifier: &str) -> (String, Vec<String>) {
    let placeholder = format!("#{identifier}");
    let mut new_keys = Vec::with_capacity(keys.len() + 1);
    new_keys.extend_from_slice(keys);
    new_keys.push(placeholder.clone());
    (placeholder, new_keys)
}

/// Reject operations that only function on a table's primary index.
pub(crate) fn ensure_primary_index(
    operation: &str,
    context: &context::OperationContext,
) -> Result<()> {
    if context.is_primary_index() {
        Ok(())
    } else {
        Err(Error::invalid_request(format!(
            "{operation} cannot be executed against a secondary index"
        )))
    }
}
