//! StackWatch Cloud
//!
//! This crate provides the provisioning backend abstraction for StackWatch:
//! the stack data model, the [`ProvisioningClient`] trait every backend
//! implements, and the tenant template used when a stack is requested.
//!
//! # Supported Backends
//!
//! - **AWS CloudFormation**: via `stackwatch-cloud-aws`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   stackwatchd                    │
//! │        (POST /stacks, GET .../events SSE)        │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               stackwatch-stream                  │
//! │        StreamController / SeenEvents             │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               stackwatch-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        Provisioning Abstraction           │   │
//! │  │  trait ProvisioningClient { ... }         │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Stack Model │  │   Template   │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼────────┐
//! │ cloudformation │
//! │    backend     │
//! └────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod stack;
pub mod template;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use error::{ProvisioningError, Result};
pub use provider::ProvisioningClient;
pub use stack::{Capability, StackEvent, StackResource, StackStatus};
pub use template::{TenantStack, render_tenant_template, stack_name_for, validate_tenant};
