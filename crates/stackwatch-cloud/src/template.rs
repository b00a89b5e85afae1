//! Tenant stack template
//!
//! Maps a tenant name to the stack name and the CloudFormation template
//! that provisions the tenant's storage bucket and message queue. Everything
//! here is pure: no backend calls, no shared state.

use crate::error::{ProvisioningError, Result};
use tera::{Context, Tera};
use tracing::debug;

/// Prefix of every tenant stack name
const STACK_PREFIX: &str = "stack-";

/// Prefix of the tenant's bucket name
const BUCKET_PREFIX: &str = "bucket-";

/// Longest bucket name S3 accepts
const MAX_BUCKET_NAME_LEN: usize = 63;

const TENANT_TEMPLATE: &str = r#"
AWSTemplateFormatVersion: '2010-09-09'
Description: Creates an S3 bucket and an SQS queue for tenant {{ tenant }}.

Resources:
  MyBucket:
    Type: AWS::S3::Bucket
    Properties:
      BucketName: bucket-{{ tenant }}

  MyQueue:
    Type: AWS::SQS::Queue
    Properties:
      QueueName: sqs-{{ tenant }}
"#;

/// Stack name for a tenant (`stack-<tenant>`)
pub fn stack_name_for(tenant: &str) -> String {
    format!("{}{}", STACK_PREFIX, tenant.trim())
}

/// Check that a tenant name can be used in stack and resource names
///
/// Tenant names are trimmed and must be non-empty. They become part of the
/// bucket name, so only lowercase ASCII letters, digits and `-` are allowed,
/// the name may not end with `-`, and `bucket-<tenant>` must fit S3's limit.
pub fn validate_tenant(tenant: &str) -> Result<()> {
    let tenant = tenant.trim();

    if tenant.is_empty() {
        return Err(ProvisioningError::InvalidTenant(
            "tenant name must not be empty".to_string(),
        ));
    }

    if let Some(c) = tenant
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(ProvisioningError::InvalidTenant(format!(
            "'{}' contains unsupported character '{}'",
            tenant, c
        )));
    }

    if tenant.ends_with('-') {
        return Err(ProvisioningError::InvalidTenant(format!(
            "'{}' must not end with '-'",
            tenant
        )));
    }

    if BUCKET_PREFIX.len() + tenant.len() > MAX_BUCKET_NAME_LEN {
        return Err(ProvisioningError::InvalidTenant(format!(
            "bucket name for '{}' exceeds {} characters",
            tenant, MAX_BUCKET_NAME_LEN
        )));
    }

    Ok(())
}

/// Render the CloudFormation template body for a tenant
pub fn render_tenant_template(tenant: &str) -> Result<String> {
    validate_tenant(tenant)?;
    debug!(tenant = %tenant.trim(), "Rendering tenant template");

    let mut context = Context::new();
    context.insert("tenant", tenant.trim());

    Tera::one_off(TENANT_TEMPLATE, &context, false)
        .map_err(|e| ProvisioningError::Template(e.to_string()))
}

/// Everything needed to request a tenant's stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantStack {
    pub tenant: String,
    pub stack_name: String,
    pub template_body: String,
}

impl TenantStack {
    pub fn new(tenant: &str) -> Result<Self> {
        let template_body = render_tenant_template(tenant)?;
        Ok(Self {
            tenant: tenant.trim().to_string(),
            stack_name: stack_name_for(tenant),
            template_body,
        })
    }
}
