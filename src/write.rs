//! Write operations for modifying data in DynamoDB tables.
//!
//! This module provides operations for writing data to DynamoDB:
//! - Putting new items or replacing existing ones
//! - Updating items from their typed representation
//! - Deleting items by key
//! - Batch writing multiple items
//! - Transactionally writing multiple items, including condition checks

/// Batch write item operation for writing multiple items efficiently.
pub mod batch_write_item;

/// Common utilities and types for write operations.
pub mod common;

/// Condition check constituent for transactional writes.
pub mod condition_check;

/// Delete item operation for removing an item by primary key.
pub mod delete_item;

/// Put item operation for creating or replacing an item.
pub mod put_item;

/// Transact write items operation for atomic multi-item writes.
pub mod transact_write_items;

/// Update item operation deriving update expressions from typed items.
pub mod update_item;
