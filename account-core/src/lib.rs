//! Account profile editor core
//!
//! Computes minimal profile patches from an edited email list, gates
//! identity-sensitive mutations (primary email change, account deletion,
//! disconnecting a federated identity) behind credential confirmation, and
//! keeps a [`FormSession`] consistent while backend calls are in flight.
//!
//! The backend is reached through the [`ProfileGateway`] port and the host
//! application's caches through [`SessionSync`].
#![allow(missing_docs)]

pub mod confirmation;
pub mod credential;
pub mod draft;
pub mod emails;
pub mod error;
pub mod gateway;
pub mod messages;
pub mod reconcile;
pub mod session;
pub mod sync;
pub mod validation;

pub use account_model as model;

pub use confirmation::{
    AccountFacts, Command, ConfirmationEvent, ConfirmationMachine,
    ConfirmationState, GateKind, GateTicket, PendingPatch, Resolution, Step,
};
pub use credential::{DeletionCredentials, SecureCredential};
pub use draft::{ProfileDraft, project_committed};
pub use emails::{EditedEmailList, SecondaryEmailLifecycle};
pub use error::{
    Field, GatewayError, GatewayResult, MutationKind, ProfileError, StateError,
    ValidationError, ValidationIssue,
};
pub use gateway::ProfileGateway;
pub use messages::Notice;
pub use reconcile::reconcile;
pub use session::{DeletionOutcome, DisconnectOutcome, FormSession, SubmitOutcome};
pub use sync::{SessionContext, SessionSync, SignOutTarget};
