//! Backend port used by the editor
//!
//! Every call is a single async request/response. Implementations translate
//! their transport's failures into [`GatewayError`]; the editor never sees
//! transport details.

use account_model::{
    AccountSnapshot, AddedEmail, ProfilePatch, UnlinkOutcome,
    UpdateProfileOutcome,
};
use async_trait::async_trait;

use crate::credential::SecureCredential;
use crate::error::GatewayResult;

/// Remote mutations available to a profile editor session.
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    /// Read the account as the backend currently sees it
    async fn fetch_account(&self) -> GatewayResult<AccountSnapshot>;

    /// Commit profile fields and the email delta
    async fn update_profile(
        &self,
        patch: &ProfilePatch,
    ) -> GatewayResult<UpdateProfileOutcome>;

    /// Check the account's current password without changing anything
    async fn verify_password(
        &self,
        password: &SecureCredential,
    ) -> GatewayResult<()>;

    /// Delete a local account. `totp_code` is required when two-factor
    /// authentication is enabled.
    async fn delete_account(
        &self,
        password: &SecureCredential,
        totp_code: Option<&SecureCredential>,
    ) -> GatewayResult<()>;

    /// Delete a federated account; the provider already vouched for the user
    async fn delete_account_without_password(&self) -> GatewayResult<()>;

    /// Detach the federated identity so the account becomes local
    async fn unlink_connected_account(&self) -> GatewayResult<UnlinkOutcome>;

    /// Create a new unverified secondary email row
    async fn add_secondary_email(&self, address: &str)
    -> GatewayResult<AddedEmail>;

    /// Ask the backend to send another verification message
    async fn resend_verify_email(&self, address: &str) -> GatewayResult<()>;
}
