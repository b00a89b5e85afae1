//! AWS CloudFormation backend for StackWatch
//!
//! This crate implements the `ProvisioningClient` trait on top of the
//! CloudFormation API, so stream sessions can follow real stacks.
//!
//! # Required IAM Permissions
//!
//! ```json
//! {
//!   "Effect": "Allow",
//!   "Action": [
//!     "cloudformation:CreateStack",
//!     "cloudformation:DeleteStack",
//!     "cloudformation:DescribeStacks",
//!     "cloudformation:DescribeStackEvents",
//!     "cloudformation:DescribeStackResources"
//!   ],
//!   "Resource": "*"
//! }
//! ```
//!
//! Creating the tenant template additionally needs S3 and SQS permissions.
//!
//! # Example
//!
//! ```ignore
//! use stackwatch_cloud::ProvisioningClient;
//! use stackwatch_cloud_aws::CloudFormationProvisioner;
//!
//! let client = CloudFormationProvisioner::from_env(Some("ap-northeast-1".into())).await;
//! let status = client.describe_status("stack-acme").await?;
//! ```

mod convert;
pub mod provider;

pub use provider::CloudFormationProvisioner;
