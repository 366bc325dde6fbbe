use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::schema::{ItemSchema, TableMetadata};

use aws_sdk_dynamodb::{Client, operation, types};
use indexmap::IndexMap;

/// A local secondary index to create alongside the table.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalSecondaryIndex {
    /// The index name; must be declared on the table metadata.
    pub index_name: String,
    /// Which attributes the index projects; `ALL` when unset.
    pub projection: Option<types::Projection>,
}

/// A global secondary index to create alongside the table.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalSecondaryIndex {
    /// The index name; must be declared on the table metadata.
    pub index_name: String,
    /// Which attributes the index projects; `ALL` when unset.
    pub projection: Option<types::Projection>,
    /// Dedicated throughput for the index, for provisioned tables.
    pub provisioned_throughput: Option<types::ProvisionedThroughput>,
}

/// Create table operation.
///
/// Key schemas and attribute definitions are derived from the table
/// metadata: only the attributes actually referenced by the primary key
/// or a requested index surface as attribute definitions. Billing mode is
/// provisioned when a throughput is supplied, on-demand otherwise.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{context, schema};
/// use dynamodb_mapper::table::create_table;
/// use serde_json::Value;
///
/// # async fn example(
/// #     client: &Client,
/// #     schema: &schema::StaticSchema<Value>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let create_table = create_table::CreateTable::default();
/// let context = context::OperationContext::new("users");
/// create_table.send(client, schema, &context).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateTable {
    /// Throughput for the table; absent means on-demand billing.
    pub provisioned_throughput: Option<types::ProvisionedThroughput>,
    /// Local secondary indexes to create.
    pub local_secondary_indexes: Vec<LocalSecondaryIndex>,
    /// Global secondary indexes to create.
    pub global_secondary_indexes: Vec<GlobalSecondaryIndex>,
}

fn key_schema(partition_key: &str, sort_key: Option<&str>) -> Vec<types::KeySchemaElement> {
    let mut elements = vec![
        types::KeySchemaElement::builder()
            .attribute_name(partition_key)
            .key_type(types::KeyType::Hash)
            .build()
            .expect("attribute name and key type are set"),
    ];
    if let Some(sort_key) = sort_key {
        elements.push(
            types::KeySchemaElement::builder()
                .attribute_name(sort_key)
                .key_type(types::KeyType::Range)
                .build()
                .expect("attribute name and key type are set"),
        );
    }
    elements
}

fn projection(requested: Option<types::Projection>) -> types::Projection {
    requested.unwrap_or_else(|| {
        types::Projection::builder()
            .projection_type(types::ProjectionType::All)
            .build()
    })
}

impl CreateTable {
    fn collect_attribute<'a>(
        metadata: &'a TableMetadata,
        attribute: &'a str,
        referenced: &mut IndexMap<&'a str, types::ScalarAttributeType>,
    ) -> Result<()> {
        let scalar_type = metadata.scalar_type(attribute).ok_or_else(|| {
            Error::invalid_request(format!(
                "no attribute type is declared for the key attribute `{attribute}`"
            ))
        })?;
        referenced.insert(attribute, scalar_type.clone());
        Ok(())
    }

    /// Build the wire request.
    pub fn generate_request<S: ItemSchema>(
        &self,
        schema: &S,
        context: &OperationContext,
    ) -> Result<operation::create_table::CreateTableInput> {
        let metadata = schema.metadata();
        let mut referenced = IndexMap::new();
        Self::collect_attribute(metadata, &metadata.partition_key, &mut referenced)?;
        if let Some(sort_key) = &metadata.sort_key {
            Self::collect_attribute(metadata, sort_key, &mut referenced)?;
        }

        let mut local_secondary_indexes = Vec::with_capacity(self.local_secondary_indexes.len());
        for index in &self.local_secondary_indexes {
            let keys = metadata.index(&index.index_name)?;
            Self::collect_attribute(metadata, &keys.partition_key, &mut referenced)?;
            if let Some(sort_key) = &keys.sort_key {
                Self::collect_attribute(metadata, sort_key, &mut referenced)?;
            }
            local_secondary_indexes.push(
                types::LocalSecondaryIndex::builder()
                    .index_name(&index.index_name)
                    .set_key_schema(Some(key_schema(
                        &keys.partition_key,
                        keys.sort_key.as_deref(),
                    )))
                    .projection(projection(index.projection.clone()))
                    .build()
                    .map_err(|error| Error::invalid_request(error.to_string()))?,
            );
        }

        let mut global_secondary_indexes = Vec::with_capacity(self.global_secondary_indexes.len());
        for index in &self.global_secondary_indexes {
            let keys = metadata.index(&index.index_name)?;
            Self::collect_attribute(metadata, &keys.partition_key, &mut referenced)?;
            if let Some(sort_key) = &keys.sort_key {
                Self::collect_attribute(metadata, sort_key, &mut referenced)?;
            }
            global_secondary_indexes.push(
                types::GlobalSecondaryIndex::builder()
                    .index_name(&index.index_name)
                    .set_key_schema(Some(key_schema(
                        &keys.partition_key,
                        keys.sort_key.as_deref(),
                    )))
                    .projection(projection(index.projection.clone()))
                    .set_provisioned_throughput(index.provisioned_throughput.clone())
                    .build()
                    .map_err(|error| Error::invalid_request(error.to_string()))?,
            );
        }

        let attribute_definitions = referenced
            .into_iter()
            .map(|(attribute, scalar_type)| {
                types::AttributeDefinition::builder()
                    .attribute_name(attribute)
                    .attribute_type(scalar_type)
                    .build()
                    .expect("attribute name and type are set")
            })
            .collect();
        let billing_mode = if self.provisioned_throughput.is_some() {
            types::BillingMode::Provisioned
        } else {
            types::BillingMode::PayPerRequest
        };

        let input = operation::create_table::CreateTableInput::builder()
            .table_name(context.table_name())
            .set_key_schema(Some(key_schema(
                &metadata.partition_key,
                metadata.sort_key.as_deref(),
            )))
            .set_attribute_definitions(Some(attribute_definitions))
            .set_local_secondary_indexes(
                (!local_secondary_indexes.is_empty()).then_some(local_secondary_indexes),
            )
            .set_global_secondary_indexes(
                (!global_secondary_indexes.is_empty()).then_some(global_secondary_indexes),
            )
            .billing_mode(billing_mode)
            .set_provisioned_throughput(self.provisioned_throughput.clone())
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Execute the create table operation.
    pub async fn send<S: ItemSchema>(
        &self,
        client: &Client,
        schema: &S,
        context: &OperationContext,
    ) -> Result<Option<types::TableDescription>> {
        let input = self.generate_request(schema, context)?;
        let output = client
            .create_table()
            .set_table_name(input.table_name)
            .set_key_schema(input.key_schema)
            .set_attribute_definitions(input.attribute_definitions)
            .set_local_secondary_indexes(input.local_secondary_indexes)
            .set_global_secondary_indexes(input.global_secondary_indexes)
            .set_billing_mode(input.billing_mode)
            .set_provisioned_throughput(input.provisioned_throughput)
            .send()
            .await
            .map_err(Error::transport)?;
        Ok(output.table_description)
    }
}
