use crate::common;
use crate::common::expression::Expression;

use indexmap::IndexMap;
use std::{collections, hash};

/// Map for selecting attributes in projection expressions.
///
/// ```rust
/// use dynamodb_mapper::common::selection;
///
/// let selection = selection::SelectionMap::Leaves(vec![
///     "id".to_string(),
///     "name".to_string(),
/// ]);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectionMap {
    /// Leaf selection - a flat list of attribute names to select.
    Leaves(Vec<String>),
    /// Node selection - nested selection for hierarchical attribute paths.
    Node(IndexMap<String, SelectionMap>),
}

impl hash::Hash for SelectionMap {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Leaves(leaves) => leaves.hash(state),
            Self::Node(map) => map.iter().for_each(|(key, value)| {
                key.hash(state);
                value.hash(state);
            }),
        }
    }
}

impl From<SelectionMap> for Expression {
    fn from(selection_map: SelectionMap) -> Self {
        selection_map.get_selection_expression_recursive(&[])
    }
}

impl SelectionMap {
    pub(crate) fn get_selection_expression_recursive(self, keys: &[String]) -> Expression {
        let expressions: Vec<_> = match self {
            Self::Leaves(leaves) => leaves
                .into_iter()
                .map(|leaf| {
                    let (placeholder, new_keys) = common::add_placeholder(keys, &leaf);
                    Expression {
                        text: new_keys.join("."),
                        names: collections::HashMap::from([(placeholder, leaf)]),
                        ..Default::default()
                    }
                })
                .collect(),
            Self::Node(map) => map
                .into_iter()
                .map(|(key, value)| {
                    let (placeholder, new_keys) = common::add_placeholder(keys, &key);
                    let mut expression = value.get_selection_expression_recursive(&new_keys);
                    expression.names.insert(placeholder, key);
                    expression
                })
                .collect(),
        };
        // selections carry no values, so the merge cannot conflict
        Expression::merge(", ", expressions).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::leaves_multiple(
        SelectionMap::Leaves(vec!["a".to_string(), "b".to_string()]),
        Expression {
            text: "#a, #b".to_string(),
            names: collections::HashMap::from([
                ("#a".to_string(), "a".to_string()),
                ("#b".to_string(), "b".to_string()),
            ]),
            ..Default::default()
        }
    )]
    #[case::node_nested(
        SelectionMap::Node(IndexMap::from([
            (
                "a".to_string(),
                SelectionMap::Node(IndexMap::from([(
                    "b".to_string(),
                    SelectionMap::Leaves(vec!["c".to_string(), "d".to_string()])
                )]))
            ),
            (
                "b".to_string(),
                SelectionMap::Leaves(vec!["e".to_string(), "f".to_string()])
            ),
        ])),
        Expression {
            text: "#a.#b.#c, #a.#b.#d, #b.#e, #b.#f".to_string(),
            names: collections::HashMap::from([
                ("#a".to_string(), "a".to_string()),
                ("#b".to_string(), "b".to_string()),
                ("#c".to_string(), "c".to_string()),
                ("#d".to_string(), "d".to_string()),
                ("#e".to_string(), "e".to_string()),
                ("#f".to_string(), "f".to_string()),
            ]),
            ..Default::default()
        }
    )]
    fn test_selection_map_to_expression(
        #[case] selection_map: SelectionMap,
        #[case] expected: Expression,
    ) {
        let actual: Expression = selection_map.into();
        assert_eq!(actual, expected);
    }
}
