/// Sentinel index name identifying a table's primary index.
pub const PRIMARY_INDEX: &str = "$PRIMARY_INDEX";

/// Identifies the table and index an operation targets.
///
/// Created once per operation invocation and consumed read-only; the
/// index name defaults to the [`PRIMARY_INDEX`] sentinel.
///
/// ```rust
/// use dynamodb_mapper::common::context;
///
/// let primary = context::OperationContext::new("users");
/// let by_email = context::OperationContext::with_index("users", "email-index");
/// assert!(primary.is_primary_index());
/// assert!(!by_email.is_primary_index());
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct OperationContext {
    table_name: String,
    index_name: String,
}

impl OperationContext {
    /// Context targeting a table's primary index.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            index_name: PRIMARY_INDEX.to_string(),
        }
    }

    /// Context targeting a named secondary index.
    pub fn with_index(table_name: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            index_name: index_name.into(),
        }
    }

    /// The target table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The target index name ([`PRIMARY_INDEX`] for the primary index).
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Whether the context targets the primary index.
    pub fn is_primary_index(&self) -> bool {
        self.index_name == PRIMARY_INDEX
    }

    /// The index name to place on a wire request: `None` for the primary
    /// index, which the service addresses implicitly.
    pub(crate) fn request_index_name(&self) -> Option<String> {
        (!self.is_primary_index()).then(|| self.index_name.clone())
    }
}
