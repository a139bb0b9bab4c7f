use crate::ids::EmailId;

/// Backend response to a committed profile update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdateProfileOutcome {
    pub has_email_changed: bool,
    /// The new primary email must be verified before it takes effect
    pub requires_verification: bool,
}

impl UpdateProfileOutcome {
    pub fn email_change_pending(&self) -> bool {
        self.has_email_changed && self.requires_verification
    }
}

/// Row created by a successful secondary-email add.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddedEmail {
    pub id: EmailId,
    pub address: String,
}

/// Backend response to unlinking the federated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnlinkOutcome {
    /// Message key describing the result
    pub message: String,
}
