use std::sync::Arc;

use account_model::AddedEmail;
use tracing::{error, info, warn};

use crate::error::{
    Field, GatewayError, ProfileError, ValidationError, ValidationIssue,
};
use crate::gateway::ProfileGateway;
use crate::messages::Notice;
use crate::validation::EmailAddress;

/// Backend-facing half of secondary email management: adding rows and
/// re-sending verification mail.
#[derive(Clone)]
pub struct SecondaryEmailLifecycle {
    gateway: Arc<dyn ProfileGateway>,
    email_max: usize,
}

impl std::fmt::Debug for SecondaryEmailLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondaryEmailLifecycle")
            .field("email_max", &self.email_max)
            .finish_non_exhaustive()
    }
}

impl SecondaryEmailLifecycle {
    pub fn new(gateway: Arc<dyn ProfileGateway>, email_max: usize) -> Self {
        Self { gateway, email_max }
    }

    /// Validate the address locally, then ask the backend to create the row.
    /// Failures are reported against [`Field::NewEmail`].
    pub async fn add(&self, address: &str) -> Result<AddedEmail, ProfileError> {
        let address = EmailAddress::parse(address, Field::NewEmail, self.email_max)?;

        match self.gateway.add_secondary_email(address.as_str()).await {
            Ok(added) => {
                info!(entry_id = %added.id, "secondary email added");
                Ok(added)
            }
            Err(GatewayError::Validation(message)) => {
                warn!(%message, "backend rejected secondary email");
                Err(ValidationError::new(
                    Field::NewEmail,
                    ValidationIssue::Rejected(message),
                )
                .into())
            }
            Err(err) => {
                warn!(error = %err, "failed to add secondary email");
                Err(err.into())
            }
        }
    }

    /// Fire-and-forget resend. The caller is told the mail was sent right
    /// away; a failed request is only visible in the logs.
    pub fn resend_verification(&self, address: String) -> Notice {
        let gateway = Arc::clone(&self.gateway);
        let task = async move {
            if let Err(err) = gateway.resend_verify_email(&address).await {
                error!(error = %err, "failed to resend verification email");
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(err) => {
                error!(error = %err, "no runtime available to resend verification email");
            }
        }

        Notice::VerificationSent
    }
}
