//! Core data model definitions shared across the account editor crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod codes;
pub mod email;
pub mod ids;
pub mod outcome;
pub mod patch;
pub mod profile;
pub mod provider;

pub use codes::ErrorCode;
pub use email::{EmailChange, SecondaryEmailEntry, StoredSecondaryEmail};
pub use ids::{EmailId, UserId};
pub use outcome::{AddedEmail, UnlinkOutcome, UpdateProfileOutcome};
pub use patch::{EmailPatch, ProfilePatch};
pub use profile::{AccountSnapshot, AvatarRef, Profile};
pub use provider::{FederatedKind, IdentityProvider};
