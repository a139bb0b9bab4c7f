//! Profile and account snapshot types
//!
//! `Profile` is the editable part of an account. `AccountSnapshot` is what the
//! backend hands over when an editor session starts: the profile plus the
//! identity facts the confirmation gates branch on.

use chrono::{DateTime, Utc};

use crate::email::StoredSecondaryEmail;
use crate::ids::UserId;
use crate::provider::IdentityProvider;

/// Opaque reference to an uploaded avatar (URL or storage key).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AvatarRef(pub String);

impl AvatarRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Editable profile fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    /// Markdown source; rendering is left to the caller
    pub bio: String,
    pub avatar: Option<AvatarRef>,
    pub primary_email: String,
}

/// Server-confirmed state of an account at the time it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountSnapshot {
    pub user_id: UserId,
    pub profile: Profile,
    pub primary_email_verified_at: Option<DateTime<Utc>>,
    /// Persisted secondary rows, excluding the primary address
    pub secondary_emails: Vec<StoredSecondaryEmail>,
    pub identity_provider: IdentityProvider,
    /// Whether a local password exists (federated accounts may have none)
    pub password_set: bool,
    pub two_factor_enabled: bool,
}

impl AccountSnapshot {
    pub fn primary_email(&self) -> &str {
        &self.profile.primary_email
    }

    /// True when the provider is federated and its external address differs
    /// from the primary email. Federated accounts whose external address is the
    /// primary email are merged on every login, so disconnecting them is moot.
    pub fn can_disconnect(&self) -> bool {
        self.identity_provider
            .can_disconnect(&self.profile.primary_email)
    }
}
