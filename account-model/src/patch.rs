//! Patches derived from the edited state and sent to the backend

use crate::email::EmailChange;
use crate::profile::{AvatarRef, Profile};

/// Minimal email delta produced by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmailPatch {
    /// Updates first (dirty order), then deletions (baseline order)
    pub changes: Vec<EmailChange>,
    pub primary_email: String,
}

impl EmailPatch {
    pub fn updates(&self) -> impl Iterator<Item = &EmailChange> {
        self.changes.iter().filter(|change| !change.deleted)
    }

    pub fn deletions(&self) -> impl Iterator<Item = &EmailChange> {
        self.changes.iter().filter(|change| change.deleted)
    }
}

/// Full update request: profile fields plus the email delta.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfilePatch {
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub avatar: Option<AvatarRef>,
    pub emails: EmailPatch,
}

impl ProfilePatch {
    pub fn primary_email(&self) -> &str {
        &self.emails.primary_email
    }

    /// Profile as it would look once this patch is committed
    pub fn to_profile(&self) -> Profile {
        Profile {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            bio: self.bio.clone(),
            avatar: self.avatar.clone(),
            primary_email: self.emails.primary_email.clone(),
        }
    }
}
