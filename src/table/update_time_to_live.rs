use crate::common;
use crate::common::context::OperationContext;
use crate::common::error::{Error, Result};
use crate::common::schema::ItemSchema;

use aws_sdk_dynamodb::{Client, operation, types};

/// Update time to live operation.
///
/// Enables or disables expiry on the attribute the table metadata
/// declares as its time-to-live attribute; a schema with no such
/// attribute is rejected before the network call.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::common::{context, schema};
/// use dynamodb_mapper::table::update_time_to_live;
/// use serde_json::Value;
///
/// # async fn example(
/// #     client: &Client,
/// #     schema: &schema::StaticSchema<Value>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let update_ttl = update_time_to_live::UpdateTimeToLive { enabled: true };
/// let context = context::OperationContext::new("users");
/// update_ttl.send(client, schema, &context).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpdateTimeToLive {
    /// Whether expiry is being turned on or off.
    pub enabled: bool,
}

impl UpdateTimeToLive {
    /// Build the wire request.
    pub fn generate_request<S: ItemSchema>(
        &self,
        schema: &S,
        context: &OperationContext,
    ) -> Result<operation::update_time_to_live::UpdateTimeToLiveInput> {
        common::ensure_primary_index("UpdateTimeToLive", context)?;
        let attribute = schema
            .metadata()
            .time_to_live_attribute
            .clone()
            .ok_or_else(|| {
                Error::invalid_request(
                    "the table schema declares no time to live attribute",
                )
            })?;
        let specification = types::TimeToLiveSpecification::builder()
            .enabled(self.enabled)
            .attribute_name(attribute)
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        let input = operation::update_time_to_live::UpdateTimeToLiveInput::builder()
            .table_name(context.table_name())
            .time_to_live_specification(specification)
            .build()
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        Ok(input)
    }

    /// Execute the update time to live operation.
    pub async fn send<S: ItemSchema>(
        &self,
        client: &Client,
        schema: &S,
        context: &OperationContext,
    ) -> Result<Option<types::TimeToLiveSpecification>> {
        let input = self.generate_request(schema, context)?;
        let output = client
            .update_time_to_live()
            .set_table_name(input.table_name)
            .set_time_to_live_specification(input.time_to_live_specification)
            .send()
            .await
            .map_err(Error::transport)?;
        Ok(output.time_to_live_specification)
    }
}
