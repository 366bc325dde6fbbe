use crate::common::error::{Error, Result};
use crate::common::expression::AttributeMap;
use crate::common::schema;

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::to_attribute_value;

/// Primary key values of an item.
///
/// Carries only the values; the attribute names come from the table
/// schema's [metadata](schema::TableMetadata) when the key is paired into
/// an attribute map.
///
/// ```rust
/// use dynamodb_mapper::common::key;
///
/// let simple = key::Key::new("abc").unwrap();
/// let composite = key::Key::with_sort("abc", 42).unwrap();
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Key {
    /// The partition key value.
    pub partition_value: types::AttributeValue,
    /// The sort key value, for tables with composite primary keys.
    pub sort_value: Option<types::AttributeValue>,
}

impl Key {
    /// Key for a partition-only table.
    pub fn new<P: Serialize>(partition_value: P) -> Result<Self> {
        Ok(Self {
            partition_value: to_attribute_value(partition_value)?,
            sort_value: None,
        })
    }

    /// Key for a table with a composite primary key.
    pub fn with_sort<P: Serialize, S: Serialize>(partition_value: P, sort_value: S) -> Result<Self> {
        Ok(Self {
            partition_value: to_attribute_value(partition_value)?,
            sort_value: Some(to_attribute_value(sort_value)?),
        })
    }

    /// Pair the key values with the table's primary key attribute names.
    ///
    /// A sort value against a partition-only table is rejected; a missing
    /// sort value against a sorted table is rejected, since every
    /// key-addressed operation needs the full primary key.
    pub fn key_map(&self, metadata: &schema::TableMetadata) -> Result<AttributeMap> {
        let mut map = AttributeMap::from([(
            metadata.partition_key.clone(),
            self.partition_value.clone(),
        )]);
        match (&metadata.sort_key, &self.sort_value) {
            (Some(sort_key), Some(sort_value)) => {
                map.insert(sort_key.clone(), sort_value.clone());
            }
            (None, Some(_)) => {
                return Err(Error::invalid_request(
                    "a sort key value was provided but the table schema declares no sort key",
                ));
            }
            (Some(sort_key), None) => {
                return Err(Error::invalid_request(format!(
                    "the table schema declares the sort key `{sort_key}` but no sort key value was provided"
                )));
            }
            (None, None) => {}
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use std::collections;

    fn metadata(sort_key: Option<&str>) -> schema::TableMetadata {
        schema::TableMetadata {
            partition_key: "id".to_string(),
            sort_key: sort_key.map(str::to_string),
            ..Default::default()
        }
    }

    #[rstest]
    #[case::partition_only(
        Key::new("abc").unwrap(),
        metadata(None),
        collections::HashMap::from([(
            "id".to_string(),
            types::AttributeValue::S("abc".to_string()),
        )])
    )]
    #[case::composite(
        Key::with_sort("abc", 42).unwrap(),
        metadata(Some("version")),
        collections::HashMap::from([
            ("id".to_string(), types::AttributeValue::S("abc".to_string())),
            ("version".to_string(), types::AttributeValue::N("42".to_string())),
        ])
    )]
    fn test_key_map(
        #[case] key: Key,
        #[case] metadata: schema::TableMetadata,
        #[case] expected: AttributeMap,
    ) {
        let actual = key.key_map(&metadata).unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::missing_sort_value(Key::new("abc").unwrap(), metadata(Some("version")))]
    #[case::unexpected_sort_value(Key::with_sort("abc", 42).unwrap(), metadata(None))]
    fn test_key_map_mismatch(#[case] key: Key, #[case] metadata: schema::TableMetadata) {
        assert!(matches!(
            key.key_map(&metadata).unwrap_err(),
            Error::InvalidRequest { .. }
        ));
    }
}
