//! Table-level operations.
//!
//! Structurally the simplest members of the operation family: request and
//! response shaping for creating, describing and deleting tables, and for
//! updating a table's time-to-live setting. They share the same context
//! and validation idioms as the item operations.

/// Create table operation deriving key schemas from table metadata.
pub mod create_table;

/// Delete table operation.
pub mod delete_table;

/// Describe table operation.
pub mod describe_table;

/// Update time to live operation.
pub mod update_time_to_live;
