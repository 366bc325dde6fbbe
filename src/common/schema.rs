use crate::common::context;
use crate::common::error::{Error, Result};
use crate::common::expression::AttributeMap;

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_dynamo::{from_item, to_item};
use std::marker;

/// Key attribute names of a secondary index.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexKeys {
    /// The index partition key attribute name.
    pub partition_key: String,
    /// The index sort key attribute name, if the index is sorted.
    pub sort_key: Option<String>,
}

/// Statically-constructed description of a table's key structure.
///
/// Replaces runtime model discovery: callers declare the partition key,
/// the optional sort key, any secondary indexes, and the scalar type of
/// each key attribute (consumed when creating tables and when validating
/// query conditionals).
///
/// ```rust
/// use aws_sdk_dynamodb::types;
/// use dynamodb_mapper::common::schema;
/// use indexmap::IndexMap;
///
/// let metadata = schema::TableMetadata {
///     partition_key: "id".to_string(),
///     sort_key: Some("created_at".to_string()),
///     indexes: IndexMap::from([(
///         "email-index".to_string(),
///         schema::IndexKeys {
///             partition_key: "email".to_string(),
///             ..Default::default()
///         },
///     )]),
///     attribute_types: IndexMap::from([
///         ("id".to_string(), types::ScalarAttributeType::S),
///         ("created_at".to_string(), types::ScalarAttributeType::N),
///         ("email".to_string(), types::ScalarAttributeType::S),
///     ]),
///     ..Default::default()
/// };
/// assert_eq!(metadata.primary_keys(), vec!["id", "created_at"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableMetadata {
    /// The primary partition key attribute name.
    pub partition_key: String,
    /// The primary sort key attribute name, if the table is sorted.
    pub sort_key: Option<String>,
    /// Declared secondary indexes by name.
    pub indexes: IndexMap<String, IndexKeys>,
    /// Scalar type of each key attribute (primary and index keys).
    pub attribute_types: IndexMap<String, types::ScalarAttributeType>,
    /// The attribute holding item expiry epochs, if the table uses one.
    pub time_to_live_attribute: Option<String>,
}

impl TableMetadata {
    /// The primary key attribute names, partition key first.
    pub fn primary_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.partition_key.as_str()];
        if let Some(sort_key) = &self.sort_key {
            keys.push(sort_key);
        }
        keys
    }

    /// The key attribute names of the primary or a named secondary index.
    pub fn index_keys(&self, index_name: &str) -> Result<Vec<&str>> {
        if index_name == context::PRIMARY_INDEX {
            return Ok(self.primary_keys());
        }
        let index = self.index(index_name)?;
        let mut keys = vec![index.partition_key.as_str()];
        if let Some(sort_key) = &index.sort_key {
            keys.push(sort_key);
        }
        Ok(keys)
    }

    /// Look up a declared secondary index.
    pub fn index(&self, index_name: &str) -> Result<&IndexKeys> {
        self.indexes.get(index_name).ok_or_else(|| {
            Error::invalid_request(format!(
                "a secondary index named `{index_name}` is not declared on the table schema"
            ))
        })
    }

    /// The declared scalar type of a key attribute, if known.
    pub fn scalar_type(&self, attribute: &str) -> Option<&types::ScalarAttributeType> {
        self.attribute_types.get(attribute)
    }
}

/// Bidirectional converter between typed items and attribute maps.
///
/// Consumed by every operation as an opaque, side-effect-free capability;
/// [`StaticSchema`] is the serde-backed implementation shipped with the
/// crate, but any implementation works.
pub trait ItemSchema {
    /// The typed item this schema describes.
    type Item;

    /// Convert a typed item into an attribute map. With `key_fields_only`
    /// the map is restricted to the primary key attributes.
    fn item_to_map(&self, item: &Self::Item, key_fields_only: bool) -> Result<AttributeMap>;

    /// Convert an attribute map back into a typed item.
    fn map_to_item(&self, map: AttributeMap) -> Result<Self::Item>;

    /// The table's key structure.
    fn metadata(&self) -> &TableMetadata;
}

/// [`ItemSchema`] implementation backed by serde.
///
/// Items are any `Serialize + Deserialize` type; conversion goes through
/// `serde_dynamo`, and the key structure is the explicitly supplied
/// [`TableMetadata`].
///
/// ```rust
/// use dynamodb_mapper::common::schema;
/// use serde_json::Value;
///
/// let schema: schema::StaticSchema<Value> = schema::StaticSchema::new(schema::TableMetadata {
///     partition_key: "id".to_string(),
///     ..Default::default()
/// });
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticSchema<T> {
    metadata: TableMetadata,
    item: marker::PhantomData<T>,
}

impl<T> StaticSchema<T> {
    /// Build a schema from its table metadata.
    pub fn new(metadata: TableMetadata) -> Self {
        Self {
            metadata,
            item: marker::PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> ItemSchema for StaticSchema<T> {
    type Item = T;

    fn item_to_map(&self, item: &T, key_fields_only: bool) -> Result<AttributeMap> {
        let mut map: AttributeMap = to_item(item)?;
        if key_fields_only {
            let keys = self.metadata.primary_keys();
            map.retain(|attribute, _| keys.contains(&attribute.as_str()));
        }
        Ok(map)
    }

    fn map_to_item(&self, map: AttributeMap) -> Result<T> {
        Ok(from_item(map)?)
    }

    fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::{Value, json};
    use std::collections;

    fn metadata() -> TableMetadata {
        TableMetadata {
            partition_key: "id".to_string(),
            sort_key: Some("sort".to_string()),
            indexes: IndexMap::from([(
                "by-owner".to_string(),
                IndexKeys {
                    partition_key: "owner".to_string(),
                    sort_key: None,
                },
            )]),
            ..Default::default()
        }
    }

    #[rstest]
    #[case::full_item(
        json!({"id": "1", "sort": "a", "name": "first"}),
        false,
        collections::HashMap::from([
            ("id".to_string(), types::AttributeValue::S("1".to_string())),
            ("sort".to_string(), types::AttributeValue::S("a".to_string())),
            ("name".to_string(), types::AttributeValue::S("first".to_string())),
        ])
    )]
    #[case::key_fields_only(
        json!({"id": "1", "sort": "a", "name": "first"}),
        true,
        collections::HashMap::from([
            ("id".to_string(), types::AttributeValue::S("1".to_string())),
            ("sort".to_string(), types::AttributeValue::S("a".to_string())),
        ])
    )]
    fn test_item_to_map(
        #[case] item: Value,
        #[case] key_fields_only: bool,
        #[case] expected: AttributeMap,
    ) {
        let schema: StaticSchema<Value> = StaticSchema::new(metadata());
        let actual = schema.item_to_map(&item, key_fields_only).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_round_trip() {
        let schema: StaticSchema<Value> = StaticSchema::new(metadata());
        let item = json!({"id": "1", "sort": "a", "count": 3, "flag": true});
        let map = schema.item_to_map(&item, false).unwrap();
        assert_eq!(schema.map_to_item(map).unwrap(), item);
    }

    #[test]
    fn test_index_keys() {
        let metadata = metadata();
        assert_eq!(
            metadata.index_keys(context::PRIMARY_INDEX).unwrap(),
            vec!["id", "sort"]
        );
        assert_eq!(metadata.index_keys("by-owner").unwrap(), vec!["owner"]);
        assert!(matches!(
            metadata.index_keys("missing").unwrap_err(),
            Error::InvalidRequest { .. }
        ));
    }
}
