//! Stack create / delete requests
//!
//! Thin synchronous passthroughs to the provisioning backend. Failures are
//! returned to the caller directly; they never travel over a stream.

use stackwatch_cloud::{Capability, ProvisioningClient, Result, TenantStack};
use std::sync::Arc;
use tracing::info;

/// Capabilities acknowledged for every tenant stack
const TENANT_CAPABILITIES: &[Capability] = &[Capability::NamedIam];

#[derive(Clone)]
pub struct LifecycleInitiator {
    client: Arc<dyn ProvisioningClient>,
}

impl LifecycleInitiator {
    pub fn new(client: Arc<dyn ProvisioningClient>) -> Self {
        Self { client }
    }

    /// Create the tenant's stack and return its name
    pub async fn request_create(&self, tenant: &str) -> Result<String> {
        let stack = TenantStack::new(tenant)?;

        self.client
            .create_stack(&stack.stack_name, &stack.template_body, TENANT_CAPABILITIES)
            .await?;

        info!(tenant = %stack.tenant, stack = %stack.stack_name, "Stack creation requested");
        Ok(stack.stack_name)
    }

    /// Start deleting a stack
    pub async fn request_delete(&self, stack_name: &str) -> Result<()> {
        self.client.delete_stack(stack_name).await?;

        info!(stack = %stack_name, "Stack deletion requested");
        Ok(())
    }
}
