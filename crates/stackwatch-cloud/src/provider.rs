//! Provisioning client trait definition

use crate::error::Result;
use crate::stack::{Capability, StackEvent, StackResource, StackStatus};
use async_trait::async_trait;

/// Provisioning backend abstraction trait
///
/// Backends (CloudFormation, the scripted test client, ...) implement this
/// trait so stream sessions and the lifecycle endpoints can share one
/// client. Implementations hold no per-session state and must be safe to
/// call from many sessions at once.
#[async_trait]
pub trait ProvisioningClient: Send + Sync {
    /// Returns the backend name (e.g., "cloudformation")
    fn name(&self) -> &str;

    /// Start provisioning a new stack from a template body
    async fn create_stack(
        &self,
        stack_name: &str,
        template_body: &str,
        capabilities: &[Capability],
    ) -> Result<()>;

    /// Start tearing down a stack
    async fn delete_stack(&self, stack_name: &str) -> Result<()>;

    /// Current status of a stack
    ///
    /// Fails when the stack does not exist or the backend call fails.
    async fn describe_status(&self, stack_name: &str) -> Result<StackStatus>;

    /// Lifecycle events of a stack, in backend order (newest first)
    async fn list_events(&self, stack_name: &str) -> Result<Vec<StackEvent>>;

    /// Point-in-time snapshot of the resources belonging to a stack
    async fn list_resources(&self, stack_name: &str) -> Result<Vec<StackResource>>;
}
