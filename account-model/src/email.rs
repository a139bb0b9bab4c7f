use chrono::{DateTime, Utc};

use crate::ids::EmailId;

/// A secondary email row as persisted by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredSecondaryEmail {
    pub id: EmailId,
    pub address: String,
    pub verified_at: Option<DateTime<Utc>>,
}

/// One entry of the editable email list.
///
/// The entry carrying [`EmailId::PLACEHOLDER`] mirrors the primary email; every
/// other entry corresponds to a persisted row. Which entry is primary is
/// tracked by `is_primary`, not by id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SecondaryEmailEntry {
    pub id: EmailId,
    pub address: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub is_primary: bool,
}

impl SecondaryEmailEntry {
    /// Placeholder entry for the primary address
    pub fn primary_placeholder(
        address: impl Into<String>,
        verified_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: EmailId::PLACEHOLDER,
            address: address.into(),
            verified_at,
            is_primary: true,
        }
    }

    /// Entry for a persisted secondary row, never primary at load time
    pub fn from_stored(stored: &StoredSecondaryEmail) -> Self {
        Self {
            id: stored.id,
            address: stored.address.clone(),
            verified_at: stored.verified_at,
            is_primary: false,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }
}

/// A single row-level change sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmailChange {
    pub id: EmailId,
    pub address: String,
    pub deleted: bool,
}

impl EmailChange {
    pub fn updated(id: EmailId, address: impl Into<String>) -> Self {
        Self {
            id,
            address: address.into(),
            deleted: false,
        }
    }

    pub fn deleted(id: EmailId, address: impl Into<String>) -> Self {
        Self {
            id,
            address: address.into(),
            deleted: true,
        }
    }
}
