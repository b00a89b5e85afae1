//! CloudFormation provisioning client implementation

use crate::convert;
use async_trait::async_trait;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::config::Region;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use stackwatch_cloud::{
    Capability, ProvisioningClient, ProvisioningError, Result, StackEvent, StackResource,
    StackStatus,
};
use tracing::debug;

/// CloudFormation backend
///
/// Wraps one SDK client. The SDK client is cheap to clone and safe to share,
/// so a single provisioner serves every stream session.
#[derive(Debug, Clone)]
pub struct CloudFormationProvisioner {
    client: Client,
}

impl CloudFormationProvisioner {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration
    ///
    /// Credentials and the default region come from the usual environment
    /// variables and profile files; `region` overrides the latter.
    pub async fn from_env(region: Option<String>) -> Self {
        let aws_config = if let Some(region) = region {
            aws_config::from_env().region(Region::new(region)).load().await
        } else {
            aws_config::load_from_env().await
        };
        Self::new(Client::new(&aws_config))
    }
}

fn api_error<E>(operation: &str, err: E) -> ProvisioningError
where
    E: std::error::Error + 'static,
{
    ProvisioningError::Api(format!("{}: {}", operation, DisplayErrorContext(&err)))
}

#[async_trait]
impl ProvisioningClient for CloudFormationProvisioner {
    fn name(&self) -> &str {
        "cloudformation"
    }

    async fn create_stack(
        &self,
        stack_name: &str,
        template_body: &str,
        capabilities: &[Capability],
    ) -> Result<()> {
        debug!(stack = %stack_name, "CreateStack");

        let capabilities = capabilities
            .iter()
            .copied()
            .map(convert::capability)
            .collect();

        self.client
            .create_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .set_capabilities(Some(capabilities))
            .send()
            .await
            .map_err(|e| api_error("CreateStack", e))?;

        Ok(())
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        debug!(stack = %stack_name, "DeleteStack");

        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| api_error("DeleteStack", e))?;

        Ok(())
    }

    async fn describe_status(&self, stack_name: &str) -> Result<StackStatus> {
        let resp = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .and_then(|se| se.message())
                    .is_some_and(convert::is_missing_stack_message);
                if missing {
                    ProvisioningError::StackNotFound(stack_name.to_string())
                } else {
                    api_error("DescribeStacks", e)
                }
            })?;

        resp.stacks()
            .first()
            .map(convert::stack_status)
            .ok_or_else(|| ProvisioningError::StackNotFound(stack_name.to_string()))
    }

    async fn list_events(&self, stack_name: &str) -> Result<Vec<StackEvent>> {
        // Only the first page: it holds the newest events, which is all a
        // poll cycle needs.
        let resp = self
            .client
            .describe_stack_events()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| api_error("DescribeStackEvents", e))?;

        Ok(resp
            .stack_events()
            .iter()
            .filter_map(convert::stack_event)
            .collect())
    }

    async fn list_resources(&self, stack_name: &str) -> Result<Vec<StackResource>> {
        let resp = self
            .client
            .describe_stack_resources()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| api_error("DescribeStackResources", e))?;

        Ok(resp
            .stack_resources()
            .iter()
            .map(convert::stack_resource)
            .collect())
    }
}
