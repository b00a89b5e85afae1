//! Provisioning backend error types

use thiserror::Error;

/// Provisioning backend errors
#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid tenant name: {0}")]
    InvalidTenant(String),

    #[error("Template error: {0}")]
    Template(String),
}

impl ProvisioningError {
    /// Whether the backend reported the stack as absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProvisioningError::StackNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ProvisioningError>;
