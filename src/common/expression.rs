use crate::common::error::{Error, Result};

use aws_sdk_dynamodb::types;
use std::collections;

/// Generic record exchanged with DynamoDB: attribute name to value.
pub type AttributeMap = collections::HashMap<String, types::AttributeValue>;

/// A condition, filter or update fragment: expression text plus the
/// placeholder bindings it references.
///
/// Placeholders are caller-chosen tokens (`#name` entries in `names`,
/// `:value` entries in `values`). Two expressions can be combined with
/// [`Expression::join`]; bindings that map the same placeholder to the
/// same payload coalesce, diverging payloads are rejected.
///
/// ```rust
/// use aws_sdk_dynamodb::types;
/// use dynamodb_mapper::common::expression;
/// use std::collections;
///
/// let condition = expression::Expression {
///     text: "#status = :status".to_string(),
///     names: collections::HashMap::from([("#status".to_string(), "status".to_string())]),
///     values: collections::HashMap::from([(
///         ":status".to_string(),
///         types::AttributeValue::S("active".to_string()),
///     )]),
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expression {
    /// The expression text, referencing entries of `names` and `values`.
    pub text: String,
    /// Attribute name placeholders (`#token` to attribute name).
    pub names: collections::HashMap<String, String>,
    /// Attribute value placeholders (`:token` to attribute value).
    pub values: collections::HashMap<String, types::AttributeValue>,
}

fn join_text(left: String, separator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{separator}{right}")
    }
}

pub(crate) fn merge_names(
    into: &mut collections::HashMap<String, String>,
    from: collections::HashMap<String, String>,
) -> Result<()> {
    for (placeholder, name) in from {
        match into.get(&placeholder) {
            Some(existing) if *existing != name => {
                return Err(Error::ConflictingExpression { placeholder });
            }
            _ => {
                into.insert(placeholder, name);
            }
        }
    }
    Ok(())
}

pub(crate) fn merge_values(
    into: &mut collections::HashMap<String, types::AttributeValue>,
    from: collections::HashMap<String, types::AttributeValue>,
) -> Result<()> {
    for (placeholder, value) in from {
        match into.get(&placeholder) {
            Some(existing) if *existing != value => {
                return Err(Error::ConflictingExpression { placeholder });
            }
            _ => {
                into.insert(placeholder, value);
            }
        }
    }
    Ok(())
}

impl Expression {
    /// Build an expression from bare text with no placeholder bindings.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Whether the expression carries no text and no bindings.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.names.is_empty() && self.values.is_empty()
    }

    /// Combine two expressions into one.
    ///
    /// The texts are joined by `separator` (an empty side contributes no
    /// separator). Bindings are merged: an identical placeholder bound to
    /// an identical payload on both sides coalesces silently, while a
    /// divergent payload fails with [`Error::ConflictingExpression`].
    pub fn join(mut self, other: Self, separator: &str) -> Result<Self> {
        merge_names(&mut self.names, other.names)?;
        merge_values(&mut self.values, other.values)?;
        self.text = join_text(self.text, separator, other.text);
        Ok(self)
    }

    /// Fold a sequence of expressions into one with [`Self::join`].
    pub fn merge(separator: &str, items: Vec<Self>) -> Result<Self> {
        let mut merged = Self::default();
        for item in items {
            merged = merged.join(item, separator)?;
        }
        Ok(merged)
    }

    /// Join two optional expressions, treating an absent side as identity.
    pub fn join_optional(
        left: Option<Self>,
        right: Option<Self>,
        separator: &str,
    ) -> Result<Option<Self>> {
        match (left, right) {
            (Some(left), Some(right)) => Ok(Some(left.join(right, separator)?)),
            (left, None) => Ok(left),
            (None, right) => Ok(right),
        }
    }

    pub(crate) fn merge_bindings_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> Result<String> {
        if !self.names.is_empty() {
            merge_names(names.get_or_insert_default(), self.names)?;
        }
        if !self.values.is_empty() {
            merge_values(values.get_or_insert_default(), self.values)?;
        }
        Ok(self.text)
    }
}

/// Update-expression fragments grouped by action keyword.
///
/// Each entry is one clause (for instance `#a = :a` under `set`, or `#a`
/// under `remove`) carrying its own placeholder bindings. [`Self::build`]
/// renders the groups into a single update expression string, each group
/// prefixed by its keyword and its clauses comma-joined.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateExpression {
    /// SET clauses (`path = operand`).
    pub set: Vec<Expression>,
    /// REMOVE clauses (attribute paths).
    pub remove: Vec<Expression>,
    /// ADD clauses (`path value`).
    pub add: Vec<Expression>,
    /// DELETE clauses (`path value`).
    pub delete: Vec<Expression>,
}

impl UpdateExpression {
    /// Whether no clause group carries any clause.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty() && self.add.is_empty() && self.delete.is_empty()
    }

    /// Append another update expression's clauses after this one's,
    /// group by group. Binding collisions are not checked here; they
    /// surface when the combined expression is [built](Self::build).
    pub fn merge(mut self, other: Self) -> Self {
        self.set.extend(other.set);
        self.remove.extend(other.remove);
        self.add.extend(other.add);
        self.delete.extend(other.delete);
        self
    }

    /// Render the clause groups into one expression.
    ///
    /// Clauses within a group are joined by `", "`, groups are prefixed
    /// by their keyword and joined by a single space. Placeholder
    /// collisions across clauses follow the [`Expression::join`] policy.
    pub fn build(self) -> Result<Expression> {
        let groups = [
            ("SET", self.set),
            ("REMOVE", self.remove),
            ("ADD", self.add),
            ("DELETE", self.delete),
        ];
        let mut expression = Expression::default();
        for (keyword, clauses) in groups {
            if clauses.is_empty() {
                continue;
            }
            let mut group = Expression::default();
            for clause in clauses {
                group = group.join(clause, ", ")?;
            }
            group.text = format!("{keyword} {}", group.text);
            expression = expression.join(group, " ")?;
        }
        Ok(expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use std::collections::HashMap;

    fn expression(
        text: &str,
        names: &[(&str, &str)],
        values: &[(&str, types::AttributeValue)],
    ) -> Expression {
        Expression {
            text: text.to_string(),
            names: names
                .iter()
                .map(|(placeholder, name)| (placeholder.to_string(), name.to_string()))
                .collect(),
            values: values
                .iter()
                .map(|(placeholder, value)| (placeholder.to_string(), value.clone()))
                .collect(),
        }
    }

    #[rstest]
    #[case::disjoint(
        expression("#a = :a", &[("#a", "a")], &[(":a", types::AttributeValue::N("1".to_string()))]),
        expression("#b = :b", &[("#b", "b")], &[(":b", types::AttributeValue::N("2".to_string()))]),
        expression(
            "#a = :a AND #b = :b",
            &[("#a", "a"), ("#b", "b")],
            &[
                (":a", types::AttributeValue::N("1".to_string())),
                (":b", types::AttributeValue::N("2".to_string())),
            ],
        )
    )]
    #[case::identical_bindings_coalesce(
        expression("#a = :a", &[("#a", "a")], &[(":a", types::AttributeValue::N("1".to_string()))]),
        expression("#a > :a", &[("#a", "a")], &[(":a", types::AttributeValue::N("1".to_string()))]),
        expression(
            "#a = :a AND #a > :a",
            &[("#a", "a")],
            &[(":a", types::AttributeValue::N("1".to_string()))],
        )
    )]
    #[case::left_empty(
        Expression::default(),
        expression("#a = :a", &[("#a", "a")], &[(":a", types::AttributeValue::N("1".to_string()))]),
        expression("#a = :a", &[("#a", "a")], &[(":a", types::AttributeValue::N("1".to_string()))])
    )]
    fn test_join(#[case] left: Expression, #[case] right: Expression, #[case] expected: Expression) {
        let actual = left.join(right, " AND ").unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::value_conflict(
        expression("#a = :v", &[("#a", "a")], &[(":v", types::AttributeValue::N("1".to_string()))]),
        expression("#b = :v", &[("#b", "b")], &[(":v", types::AttributeValue::N("2".to_string()))]),
        ":v"
    )]
    #[case::name_conflict(
        expression("#n = :a", &[("#n", "first")], &[(":a", types::AttributeValue::N("1".to_string()))]),
        expression("#n = :b", &[("#n", "second")], &[(":b", types::AttributeValue::N("2".to_string()))]),
        "#n"
    )]
    fn test_join_conflict(
        #[case] left: Expression,
        #[case] right: Expression,
        #[case] expected_placeholder: &str,
    ) {
        let error = left.join(right, " AND ").unwrap_err();
        match error {
            Error::ConflictingExpression { placeholder } => {
                assert_eq!(placeholder, expected_placeholder);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_join_associative_in_effect() {
        let a = expression(
            "#a = :a",
            &[("#a", "a")],
            &[(":a", types::AttributeValue::N("1".to_string()))],
        );
        let b = expression(
            "#b = :b",
            &[("#b", "b")],
            &[(":b", types::AttributeValue::N("2".to_string()))],
        );
        let c = expression(
            "#c = :c",
            &[("#c", "c")],
            &[(":c", types::AttributeValue::N("3".to_string()))],
        );
        let left = a
            .clone()
            .join(b.clone(), " AND ")
            .unwrap()
            .join(c.clone(), " AND ")
            .unwrap();
        let right = a.join(b.join(c, " AND ").unwrap(), " AND ").unwrap();
        assert_eq!(left.names, right.names);
        assert_eq!(left.values, right.values);
        assert_eq!(left.text, right.text);
    }

    #[rstest]
    #[case::set_and_remove(
        UpdateExpression {
            set: vec![
                expression("#a = :a", &[("#a", "a")], &[(":a", types::AttributeValue::S("x".to_string()))]),
                expression("#b = :b", &[("#b", "b")], &[(":b", types::AttributeValue::S("y".to_string()))]),
            ],
            remove: vec![expression("#c", &[("#c", "c")], &[])],
            ..Default::default()
        },
        expression(
            "SET #a = :a, #b = :b REMOVE #c",
            &[("#a", "a"), ("#b", "b"), ("#c", "c")],
            &[
                (":a", types::AttributeValue::S("x".to_string())),
                (":b", types::AttributeValue::S("y".to_string())),
            ],
        )
    )]
    #[case::add_and_delete(
        UpdateExpression {
            add: vec![expression("#n :n", &[("#n", "n")], &[(":n", types::AttributeValue::N("1".to_string()))])],
            delete: vec![expression(
                "#tags :tags",
                &[("#tags", "tags")],
                &[(":tags", types::AttributeValue::Ss(vec!["old".to_string()]))],
            )],
            ..Default::default()
        },
        expression(
            "ADD #n :n DELETE #tags :tags",
            &[("#n", "n"), ("#tags", "tags")],
            &[
                (":n", types::AttributeValue::N("1".to_string())),
                (":tags", types::AttributeValue::Ss(vec!["old".to_string()])),
            ],
        )
    )]
    fn test_update_expression_build(
        #[case] update: UpdateExpression,
        #[case] expected: Expression,
    ) {
        let actual = update.build().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_update_expression_merge_preserves_groups() {
        let generated = UpdateExpression {
            set: vec![expression("#a = :a", &[("#a", "a")], &[(":a", types::AttributeValue::N("1".to_string()))])],
            ..Default::default()
        };
        let contributed = UpdateExpression {
            set: vec![expression("#v = :v", &[("#v", "v")], &[(":v", types::AttributeValue::N("2".to_string()))])],
            remove: vec![expression("#gone", &[("#gone", "gone")], &[])],
            ..Default::default()
        };
        let built = generated.merge(contributed).build().unwrap();
        assert_eq!(built.text, "SET #a = :a, #v = :v REMOVE #gone");
    }

    #[test]
    fn test_merge_bindings_into() {
        let mut names = Some(HashMap::from([("#a".to_string(), "a".to_string())]));
        let mut values = None;
        let text = expression(
            "#b = :b",
            &[("#b", "b")],
            &[(":b", types::AttributeValue::N("2".to_string()))],
        )
        .merge_bindings_into(&mut names, &mut values)
        .unwrap();
        assert_eq!(text, "#b = :b");
        assert_eq!(
            names.unwrap(),
            HashMap::from([
                ("#a".to_string(), "a".to_string()),
                ("#b".to_string(), "b".to_string()),
            ])
        );
        assert_eq!(
            values.unwrap(),
            HashMap::from([(":b".to_string(), types::AttributeValue::N("2".to_string()))])
        );
    }
}
