#![deny(missing_docs)]
#![deny(warnings)]

//! # DynamoDB Mapper
//!
//! A type-safe, extensible operation layer for Amazon DynamoDB.
//!
//! ## Overview
//!
//! This library translates typed table operations (get, put, delete,
//! update, query, scan, batch and transact variants, plus table
//! management) into `aws-sdk-dynamodb` wire requests, and wire responses
//! back into typed items. Every read and write threads through a
//! pluggable item-modification pipeline:
//!
//! - An [`Extension`](common::extension::Extension) can transform items
//!   before they are written and after they are read, and contribute
//!   condition or update-expression fragments.
//! - Fragments combine through a deterministic
//!   [`Expression`](common::expression::Expression) join that coalesces
//!   identical placeholder bindings and rejects conflicting ones.
//! - An [`ItemSchema`](common::schema::ItemSchema) converts typed items
//!   to and from attribute maps; the serde-backed
//!   [`StaticSchema`](common::schema::StaticSchema) covers any
//!   `Serialize + Deserialize` type.
//!
//! ## Quick Example
//!
//! ```no_run
//! use aws_sdk_dynamodb::Client;
//! use dynamodb_mapper::common::{context, key, schema};
//! use dynamodb_mapper::{read, write};
//! use serde_json::{Value, json};
//!
//! # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
//! let schema: schema::StaticSchema<Value> = schema::StaticSchema::new(schema::TableMetadata {
//!     partition_key: "id".to_string(),
//!     ..Default::default()
//! });
//! let context = context::OperationContext::new("users");
//!
//! let put = write::put_item::PutItem::new(json!({"id": "1", "name": "Jane"}));
//! put.send(client, &schema, &context, None).await?;
//!
//! let get = read::get_item::GetItem::new(key::Key::new("1")?);
//! let item = get.send(client, &schema, &context, None).await?;
//! assert_eq!(item, Some(json!({"id": "1", "name": "Jane"})));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@common`] - Expressions, schemas, keys and the extension
//!   pipeline
//! - [`mod@read`] - Read operations (GetItem, Query, Scan, BatchGetItem,
//!   TransactGetItems)
//! - [`mod@write`] - Write operations (PutItem, UpdateItem, DeleteItem,
//!   BatchWriteItem, TransactWriteItems, ConditionCheck)
//! - [`mod@table`] - Table operations (CreateTable, DeleteTable,
//!   DescribeTable, UpdateTimeToLive)

/// Common building blocks: expressions, schemas, keys and the extension
/// pipeline.
pub mod common;

/// Read operations for retrieving data from DynamoDB tables.
pub mod read;

/// Table-level management operations.
pub mod table;

/// Write operations for modifying data in DynamoDB tables.
pub mod write;
