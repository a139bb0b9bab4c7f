//! Confirmation state machine for identity-sensitive mutations
//!
//! Email changes on local accounts, account deletion and disconnecting a
//! federated identity all pass through a gate that asks the user for
//! credentials or an explicit confirmation. The machine is pure: it never
//! performs I/O. Each transition hands back a [`Step`] telling the caller
//! which gateway call to run, and the call's result is fed back through
//! [`ConfirmationMachine::resolve`] together with the ticket of the gate it
//! was issued under.

use std::ops::Deref;
use std::sync::Arc;

use account_model::{IdentityProvider, ProfilePatch, UnlinkOutcome};
use tracing::{debug, warn};

use crate::credential::{DeletionCredentials, SecureCredential};
use crate::error::{Field, ProfileError, StateError, ValidationError};

/// Patch captured when a gate opened. Cannot be modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPatch(Arc<ProfilePatch>);

impl PendingPatch {
    pub fn new(patch: ProfilePatch) -> Self {
        Self(Arc::new(patch))
    }
}

impl Deref for PendingPatch {
    type Target = ProfilePatch;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Identifies one opening of a gate. Results carrying an older ticket are
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GateTicket(u64);

impl GateTicket {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Facts about the account that decide which gate applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFacts {
    pub provider: IdentityProvider,
    pub password_set: bool,
    pub two_factor_enabled: bool,
    /// Primary email as last confirmed by the backend
    pub baseline_email: String,
}

impl AccountFacts {
    pub fn can_disconnect(&self) -> bool {
        self.provider.can_disconnect(&self.baseline_email)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfirmationState {
    /// No gate open
    #[default]
    Idle,

    /// Local account changing its primary email; current password required
    AwaitingPasswordForEmailChange { pending: PendingPatch },

    /// Local account deletion; TOTP bundled when two-factor is enabled
    AwaitingPasswordForDeletion { totp_required: bool },

    AwaitingDisconnectConfirmation,

    /// Federated account without a local password must create one first
    AwaitingPasswordCreationBeforeDisconnect,
}

/// Which gate is open, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    PasswordForEmailChange,
    PasswordForDeletion { totp_required: bool },
    DisconnectConfirmation,
    PasswordCreationBeforeDisconnect,
}

impl ConfirmationState {
    pub fn gate(&self) -> Option<GateKind> {
        match self {
            ConfirmationState::Idle => None,
            ConfirmationState::AwaitingPasswordForEmailChange { .. } => {
                Some(GateKind::PasswordForEmailChange)
            }
            ConfirmationState::AwaitingPasswordForDeletion { totp_required } => {
                Some(GateKind::PasswordForDeletion {
                    totp_required: *totp_required,
                })
            }
            ConfirmationState::AwaitingDisconnectConfirmation => {
                Some(GateKind::DisconnectConfirmation)
            }
            ConfirmationState::AwaitingPasswordCreationBeforeDisconnect => {
                Some(GateKind::PasswordCreationBeforeDisconnect)
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ConfirmationState::Idle)
    }

    /// Get a human-readable description of the current state
    pub fn description(&self) -> &'static str {
        match self {
            ConfirmationState::Idle => "idle",
            ConfirmationState::AwaitingPasswordForEmailChange { .. } => {
                "awaiting password for email change"
            }
            ConfirmationState::AwaitingPasswordForDeletion { .. } => {
                "awaiting password for deletion"
            }
            ConfirmationState::AwaitingDisconnectConfirmation => {
                "awaiting disconnect confirmation"
            }
            ConfirmationState::AwaitingPasswordCreationBeforeDisconnect => {
                "awaiting password creation before disconnect"
            }
        }
    }
}

/// User-driven inputs
#[derive(Debug, Clone)]
pub enum ConfirmationEvent {
    Submit(PendingPatch),
    PasswordConfirmed(SecureCredential),
    InitiateDeletion,
    DeletionConfirmed(DeletionCredentials),
    InitiateDisconnect,
    /// The account now has a local password
    PasswordEstablished,
    DisconnectConfirmed,
    Cancel,
}

impl ConfirmationEvent {
    fn name(&self) -> &'static str {
        match self {
            ConfirmationEvent::Submit(_) => "submit",
            ConfirmationEvent::PasswordConfirmed(_) => "password_confirmed",
            ConfirmationEvent::InitiateDeletion => "initiate_deletion",
            ConfirmationEvent::DeletionConfirmed(_) => "deletion_confirmed",
            ConfirmationEvent::InitiateDisconnect => "initiate_disconnect",
            ConfirmationEvent::PasswordEstablished => "password_established",
            ConfirmationEvent::DisconnectConfirmed => "disconnect_confirmed",
            ConfirmationEvent::Cancel => "cancel",
        }
    }
}

/// Gateway call the caller must run next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    UpdateProfile(PendingPatch),
    VerifyPassword {
        ticket: GateTicket,
        password: SecureCredential,
    },
    DeleteAccount {
        ticket: GateTicket,
        password: SecureCredential,
        totp_code: Option<SecureCredential>,
    },
    /// Not issued under a gate, so it cannot be cancelled
    DeleteAccountWithoutPassword,
    UnlinkConnectedAccount { ticket: GateTicket },
}

impl Command {
    pub fn ticket(&self) -> Option<GateTicket> {
        match self {
            Command::VerifyPassword { ticket, .. }
            | Command::DeleteAccount { ticket, .. }
            | Command::UnlinkConnectedAccount { ticket } => Some(*ticket),
            Command::UpdateProfile(_) | Command::DeleteAccountWithoutPassword => {
                None
            }
        }
    }
}

/// Result of a gateway call issued by a [`Command`].
#[derive(Debug, Clone)]
pub enum Resolution {
    PasswordVerified,
    PasswordRejected(ProfileError),
    AccountDeleted,
    DeletionFailed(ProfileError),
    Unlinked(UnlinkOutcome),
    UnlinkFailed(ProfileError),
}

/// What a transition asks of its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to do
    NoOp,
    GateOpened(GateKind),
    Run(Command),
    Cancelled,
    /// Result arrived for a gate that has since been cancelled
    Discarded,
    Disconnected(UnlinkOutcome),
    /// Account is gone; end the session
    Terminate,
}

/// Owns the confirmation state and the ticket of the open gate.
#[derive(Debug, Default)]
pub struct ConfirmationMachine {
    state: ConfirmationState,
    ticket: Option<GateTicket>,
    issued: u64,
    last_error: Option<ProfileError>,
}

impl ConfirmationMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    pub fn ticket(&self) -> Option<GateTicket> {
        self.ticket
    }

    /// Error from the last failed call under the open gate
    pub fn last_error(&self) -> Option<&ProfileError> {
        self.last_error.as_ref()
    }

    pub fn pending_patch(&self) -> Option<&PendingPatch> {
        match &self.state {
            ConfirmationState::AwaitingPasswordForEmailChange { pending } => {
                Some(pending)
            }
            _ => None,
        }
    }

    fn open(&mut self, state: ConfirmationState) -> Step {
        self.issued += 1;
        let ticket = GateTicket(self.issued);
        let gate = state.gate();
        debug!(ticket = ticket.get(), state = state.description(), "gate opened");
        self.state = state;
        self.ticket = Some(ticket);
        self.last_error = None;
        gate.map_or(Step::NoOp, Step::GateOpened)
    }

    fn close(&mut self) {
        self.state = ConfirmationState::Idle;
        self.ticket = None;
        self.last_error = None;
    }

    /// The account is gone: close whatever gate is open, regardless of
    /// which ticket the deletion ran under.
    pub fn terminate(&mut self) -> Step {
        debug!(state = self.state.description(), "terminating after account deletion");
        self.close();
        Step::Terminate
    }

    fn current_ticket(&self) -> Result<GateTicket, StateError> {
        self.ticket.ok_or(StateError::NoGateOpen)
    }

    /// Apply a user event.
    pub fn handle(
        &mut self,
        event: ConfirmationEvent,
        facts: &AccountFacts,
    ) -> Result<Step, ProfileError> {
        let name = event.name();
        let result = self.apply(event, facts);
        match &result {
            Ok(step) => {
                debug!(event = name, state = self.state.description(), ?step, "transition");
            }
            Err(err) => {
                warn!(event = name, state = self.state.description(), error = %err, "transition rejected");
            }
        }
        result
    }

    fn apply(
        &mut self,
        event: ConfirmationEvent,
        facts: &AccountFacts,
    ) -> Result<Step, ProfileError> {
        match (&self.state, event) {
            (_, ConfirmationEvent::Cancel) => {
                if self.state.is_idle() {
                    return Ok(Step::NoOp);
                }
                self.close();
                Ok(Step::Cancelled)
            }

            (ConfirmationState::Idle, ConfirmationEvent::Submit(patch)) => {
                let email_changed =
                    patch.primary_email() != facts.baseline_email;
                if email_changed && facts.provider.is_local() {
                    Ok(self.open(
                        ConfirmationState::AwaitingPasswordForEmailChange {
                            pending: patch,
                        },
                    ))
                } else {
                    Ok(Step::Run(Command::UpdateProfile(patch)))
                }
            }

            (
                ConfirmationState::AwaitingPasswordForEmailChange { .. },
                ConfirmationEvent::PasswordConfirmed(password),
            ) => {
                if password.is_blank() {
                    return Err(ValidationError::required(Field::Password).into());
                }
                Ok(Step::Run(Command::VerifyPassword {
                    ticket: self.current_ticket()?,
                    password,
                }))
            }

            (ConfirmationState::Idle, ConfirmationEvent::InitiateDeletion) => {
                match facts.provider {
                    IdentityProvider::Local => Ok(self.open(
                        ConfirmationState::AwaitingPasswordForDeletion {
                            totp_required: facts.two_factor_enabled,
                        },
                    )),
                    IdentityProvider::Federated { .. } => {
                        Ok(Step::Run(Command::DeleteAccountWithoutPassword))
                    }
                }
            }

            (
                ConfirmationState::AwaitingPasswordForDeletion { totp_required },
                ConfirmationEvent::DeletionConfirmed(credentials),
            ) => {
                if !credentials.password_present() {
                    return Err(ValidationError::required(Field::Password).into());
                }
                if *totp_required && !credentials.totp_present() {
                    return Err(ValidationError::required(Field::TotpCode).into());
                }
                let DeletionCredentials {
                    password,
                    totp_code,
                } = credentials;
                let password = password.ok_or(ValidationError::required(Field::Password))?;
                Ok(Step::Run(Command::DeleteAccount {
                    ticket: self.current_ticket()?,
                    password,
                    totp_code: totp_code.filter(|code| !code.is_blank()),
                }))
            }

            // Retrying a federated deletion; there is nothing to confirm
            (ConfirmationState::Idle, ConfirmationEvent::DeletionConfirmed(_))
                if !facts.provider.is_local() =>
            {
                Ok(Step::Run(Command::DeleteAccountWithoutPassword))
            }

            (_, ConfirmationEvent::InitiateDisconnect)
                if !facts.can_disconnect() =>
            {
                Ok(Step::NoOp)
            }

            (ConfirmationState::Idle, ConfirmationEvent::InitiateDisconnect) => {
                if facts.password_set {
                    Ok(self.open(ConfirmationState::AwaitingDisconnectConfirmation))
                } else {
                    Ok(self.open(
                        ConfirmationState::AwaitingPasswordCreationBeforeDisconnect,
                    ))
                }
            }

            (
                ConfirmationState::AwaitingPasswordCreationBeforeDisconnect,
                ConfirmationEvent::PasswordEstablished,
            ) => {
                self.state = ConfirmationState::AwaitingDisconnectConfirmation;
                Ok(Step::GateOpened(GateKind::DisconnectConfirmation))
            }

            (_, ConfirmationEvent::PasswordEstablished) => Ok(Step::NoOp),

            (
                ConfirmationState::AwaitingDisconnectConfirmation,
                ConfirmationEvent::DisconnectConfirmed,
            ) => Ok(Step::Run(Command::UnlinkConnectedAccount {
                ticket: self.current_ticket()?,
            })),

            (
                ConfirmationState::AwaitingPasswordCreationBeforeDisconnect,
                ConfirmationEvent::DisconnectConfirmed,
            ) => Err(StateError::PasswordNotEstablished.into()),

            (
                _,
                ConfirmationEvent::Submit(_)
                | ConfirmationEvent::InitiateDeletion
                | ConfirmationEvent::InitiateDisconnect,
            ) => Err(StateError::GateAlreadyOpen.into()),

            (
                ConfirmationState::Idle,
                ConfirmationEvent::PasswordConfirmed(_)
                | ConfirmationEvent::DeletionConfirmed(_)
                | ConfirmationEvent::DisconnectConfirmed,
            ) => Err(StateError::NoGateOpen.into()),

            (_, _) => Err(StateError::UnexpectedGate.into()),
        }
    }

    /// Feed back the result of a gateway call.
    ///
    /// `ticket` is the ticket the command carried. A ticket that no longer
    /// matches the open gate means the user cancelled meanwhile; the result
    /// is dropped and the state left alone.
    pub fn resolve(
        &mut self,
        ticket: Option<GateTicket>,
        resolution: Resolution,
    ) -> Result<Step, ProfileError> {
        if ticket.is_some() && ticket != self.ticket {
            debug!(
                ticket = ticket.map(|t| t.get()),
                current = self.ticket.map(|t| t.get()),
                "discarding result for a cancelled gate"
            );
            return Ok(Step::Discarded);
        }

        match resolution {
            Resolution::PasswordVerified => {
                let state = std::mem::take(&mut self.state);
                match state {
                    ConfirmationState::AwaitingPasswordForEmailChange { pending } => {
                        self.close();
                        Ok(Step::Run(Command::UpdateProfile(pending)))
                    }
                    other => {
                        self.state = other;
                        Err(StateError::UnexpectedGate.into())
                    }
                }
            }
            Resolution::AccountDeleted => {
                self.close();
                Ok(Step::Terminate)
            }
            Resolution::Unlinked(outcome) => {
                self.close();
                Ok(Step::Disconnected(outcome))
            }
            Resolution::PasswordRejected(err)
            | Resolution::DeletionFailed(err)
            | Resolution::UnlinkFailed(err) => {
                if !self.state.is_idle() {
                    self.last_error = Some(err.clone());
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use account_model::{EmailPatch, ErrorCode, FederatedKind};

    fn local(two_factor_enabled: bool) -> AccountFacts {
        AccountFacts {
            provider: IdentityProvider::Local,
            password_set: true,
            two_factor_enabled,
            baseline_email: "ada@example.com".into(),
        }
    }

    fn federated(password_set: bool) -> AccountFacts {
        AccountFacts {
            provider: IdentityProvider::Federated {
                kind: FederatedKind::Google,
                external_email: Some("ada@gmail.com".into()),
            },
            password_set,
            two_factor_enabled: false,
            baseline_email: "ada@example.com".into(),
        }
    }

    fn patch(primary: &str) -> PendingPatch {
        PendingPatch::new(ProfilePatch {
            username: "ada".into(),
            display_name: "Ada".into(),
            bio: String::new(),
            avatar: None,
            emails: EmailPatch {
                changes: Vec::new(),
                primary_email: primary.into(),
            },
        })
    }

    #[test]
    fn unchanged_primary_submits_directly() {
        let mut machine = ConfirmationMachine::new();
        let step = machine
            .handle(ConfirmationEvent::Submit(patch("ada@example.com")), &local(false))
            .unwrap();
        assert_eq!(step, Step::Run(Command::UpdateProfile(patch("ada@example.com"))));
        assert!(machine.state().is_idle());
    }

    #[test]
    fn email_change_on_local_account_requires_password() {
        let mut machine = ConfirmationMachine::new();
        let step = machine
            .handle(ConfirmationEvent::Submit(patch("new@example.com")), &local(false))
            .unwrap();
        assert_eq!(step, Step::GateOpened(GateKind::PasswordForEmailChange));
        assert_eq!(machine.pending_patch().unwrap().primary_email(), "new@example.com");

        let Step::Run(Command::VerifyPassword { ticket, .. }) = machine
            .handle(ConfirmationEvent::PasswordConfirmed("secret".into()), &local(false))
            .unwrap()
        else {
            panic!("expected password verification");
        };

        let step = machine
            .resolve(Some(ticket), Resolution::PasswordVerified)
            .unwrap();
        assert_eq!(step, Step::Run(Command::UpdateProfile(patch("new@example.com"))));
        assert!(machine.state().is_idle());
        assert!(machine.pending_patch().is_none());
    }

    #[test]
    fn email_change_on_federated_account_skips_gate() {
        let mut machine = ConfirmationMachine::new();
        let step = machine
            .handle(ConfirmationEvent::Submit(patch("new@example.com")), &federated(true))
            .unwrap();
        assert!(matches!(step, Step::Run(Command::UpdateProfile(_))));
    }

    #[test]
    fn rejected_password_keeps_pending_patch() {
        let mut machine = ConfirmationMachine::new();
        machine
            .handle(ConfirmationEvent::Submit(patch("new@example.com")), &local(false))
            .unwrap();
        let ticket = machine.ticket();

        let err = machine
            .resolve(
                ticket,
                Resolution::PasswordRejected(ProfileError::Authentication(
                    ErrorCode::IncorrectPassword,
                )),
            )
            .unwrap_err();

        assert_eq!(err, ProfileError::Authentication(ErrorCode::IncorrectPassword));
        assert_eq!(machine.state().gate(), Some(GateKind::PasswordForEmailChange));
        assert_eq!(machine.pending_patch(), Some(&patch("new@example.com")));
        assert_eq!(machine.last_error(), Some(&err));
    }

    #[test]
    fn blank_password_is_rejected_locally() {
        let mut machine = ConfirmationMachine::new();
        machine
            .handle(ConfirmationEvent::Submit(patch("new@example.com")), &local(false))
            .unwrap();
        let err = machine
            .handle(ConfirmationEvent::PasswordConfirmed("  ".into()), &local(false))
            .unwrap_err();
        assert_eq!(err, ProfileError::from(ValidationError::required(Field::Password)));
    }

    #[test]
    fn local_deletion_with_two_factor_needs_both_credentials() {
        let facts = local(true);
        let mut machine = ConfirmationMachine::new();
        let step = machine.handle(ConfirmationEvent::InitiateDeletion, &facts).unwrap();
        assert_eq!(
            step,
            Step::GateOpened(GateKind::PasswordForDeletion { totp_required: true })
        );

        let err = machine
            .handle(
                ConfirmationEvent::DeletionConfirmed(DeletionCredentials::new("pw")),
                &facts,
            )
            .unwrap_err();
        assert_eq!(err, ProfileError::from(ValidationError::required(Field::TotpCode)));

        let err = machine
            .handle(
                ConfirmationEvent::DeletionConfirmed(
                    DeletionCredentials::none().with_totp("123456"),
                ),
                &facts,
            )
            .unwrap_err();
        assert_eq!(err, ProfileError::from(ValidationError::required(Field::Password)));

        let step = machine
            .handle(
                ConfirmationEvent::DeletionConfirmed(
                    DeletionCredentials::new("pw").with_totp("123456"),
                ),
                &facts,
            )
            .unwrap();
        assert!(matches!(
            step,
            Step::Run(Command::DeleteAccount { totp_code: Some(_), .. })
        ));
    }

    #[test]
    fn federated_deletion_needs_no_credentials() {
        let mut machine = ConfirmationMachine::new();
        let step = machine
            .handle(ConfirmationEvent::InitiateDeletion, &federated(false))
            .unwrap();
        assert_eq!(step, Step::Run(Command::DeleteAccountWithoutPassword));
        assert!(machine.state().is_idle());

        let step = machine
            .handle(
                ConfirmationEvent::DeletionConfirmed(DeletionCredentials::none()),
                &federated(false),
            )
            .unwrap();
        assert_eq!(step, Step::Run(Command::DeleteAccountWithoutPassword));
    }

    #[test]
    fn failed_deletion_stays_in_gate() {
        let facts = local(false);
        let mut machine = ConfirmationMachine::new();
        machine.handle(ConfirmationEvent::InitiateDeletion, &facts).unwrap();
        let ticket = machine.ticket();

        let err = machine
            .resolve(
                ticket,
                Resolution::DeletionFailed(ProfileError::Fatal(
                    ErrorCode::InternalServerError,
                )),
            )
            .unwrap_err();
        assert_eq!(err, ProfileError::Fatal(ErrorCode::InternalServerError));
        assert_eq!(
            machine.state().gate(),
            Some(GateKind::PasswordForDeletion { totp_required: false })
        );

        let step = machine.resolve(ticket, Resolution::AccountDeleted).unwrap();
        assert_eq!(step, Step::Terminate);
        assert!(machine.state().is_idle());
    }

    #[test]
    fn terminate_closes_a_cancelled_or_open_gate() {
        let facts = local(true);
        let mut machine = ConfirmationMachine::new();
        assert_eq!(machine.terminate(), Step::Terminate);
        assert!(machine.state().is_idle());

        machine.handle(ConfirmationEvent::InitiateDeletion, &facts).unwrap();
        assert!(machine.ticket().is_some());
        assert_eq!(machine.terminate(), Step::Terminate);
        assert!(machine.state().is_idle());
        assert!(machine.ticket().is_none());
        assert!(machine.last_error().is_none());
    }

    #[test]
    fn disconnect_without_password_asks_for_one_first() {
        let mut facts = federated(false);
        let mut machine = ConfirmationMachine::new();
        let step = machine
            .handle(ConfirmationEvent::InitiateDisconnect, &facts)
            .unwrap();
        assert_eq!(step, Step::GateOpened(GateKind::PasswordCreationBeforeDisconnect));

        let err = machine
            .handle(ConfirmationEvent::DisconnectConfirmed, &facts)
            .unwrap_err();
        assert_eq!(err, ProfileError::State(StateError::PasswordNotEstablished));

        facts.password_set = true;
        let step = machine
            .handle(ConfirmationEvent::PasswordEstablished, &facts)
            .unwrap();
        assert_eq!(step, Step::GateOpened(GateKind::DisconnectConfirmation));

        let step = machine
            .handle(ConfirmationEvent::DisconnectConfirmed, &facts)
            .unwrap();
        let ticket = machine.ticket().unwrap();
        assert_eq!(step, Step::Run(Command::UnlinkConnectedAccount { ticket }));

        let outcome = UnlinkOutcome {
            message: "account_disconnected".into(),
        };
        let step = machine
            .resolve(Some(ticket), Resolution::Unlinked(outcome.clone()))
            .unwrap();
        assert_eq!(step, Step::Disconnected(outcome));
        assert!(machine.state().is_idle());
    }

    #[test]
    fn disconnect_is_noop_for_local_or_merged_accounts() {
        let mut machine = ConfirmationMachine::new();
        assert_eq!(
            machine.handle(ConfirmationEvent::InitiateDisconnect, &local(false)).unwrap(),
            Step::NoOp
        );

        let mut merged = federated(true);
        merged.baseline_email = "ada@gmail.com".into();
        assert_eq!(
            machine.handle(ConfirmationEvent::InitiateDisconnect, &merged).unwrap(),
            Step::NoOp
        );
        assert!(machine.state().is_idle());
    }

    #[test]
    fn only_one_gate_at_a_time() {
        let facts = federated(true);
        let mut machine = ConfirmationMachine::new();
        machine.handle(ConfirmationEvent::InitiateDisconnect, &facts).unwrap();

        for event in [
            ConfirmationEvent::InitiateDeletion,
            ConfirmationEvent::InitiateDisconnect,
            ConfirmationEvent::Submit(patch("ada@example.com")),
        ] {
            let err = machine.handle(event, &facts).unwrap_err();
            assert_eq!(err, ProfileError::State(StateError::GateAlreadyOpen));
        }
        assert_eq!(machine.state().gate(), Some(GateKind::DisconnectConfirmation));
    }

    #[test]
    fn confirmations_without_gate_are_rejected() {
        let mut machine = ConfirmationMachine::new();
        let err = machine
            .handle(ConfirmationEvent::DisconnectConfirmed, &federated(true))
            .unwrap_err();
        assert_eq!(err, ProfileError::State(StateError::NoGateOpen));

        let err = machine
            .handle(ConfirmationEvent::PasswordConfirmed("pw".into()), &local(false))
            .unwrap_err();
        assert_eq!(err, ProfileError::State(StateError::NoGateOpen));
    }

    #[test]
    fn cancel_discards_pending_patch_and_late_results() {
        let facts = local(false);
        let mut machine = ConfirmationMachine::new();
        machine
            .handle(ConfirmationEvent::Submit(patch("new@example.com")), &facts)
            .unwrap();
        let Step::Run(command) = machine
            .handle(ConfirmationEvent::PasswordConfirmed("pw".into()), &facts)
            .unwrap()
        else {
            panic!("expected a command");
        };

        assert_eq!(
            machine.handle(ConfirmationEvent::Cancel, &facts).unwrap(),
            Step::Cancelled
        );
        assert!(machine.pending_patch().is_none());

        let step = machine
            .resolve(command.ticket(), Resolution::PasswordVerified)
            .unwrap();
        assert_eq!(step, Step::Discarded);
        assert!(machine.state().is_idle());

        assert_eq!(
            machine.handle(ConfirmationEvent::Cancel, &facts).unwrap(),
            Step::NoOp
        );
    }

    #[test]
    fn reopened_gate_ignores_results_from_previous_opening() {
        let facts = local(false);
        let mut machine = ConfirmationMachine::new();
        machine.handle(ConfirmationEvent::InitiateDeletion, &facts).unwrap();
        let first = machine.ticket();
        machine.handle(ConfirmationEvent::Cancel, &facts).unwrap();
        machine.handle(ConfirmationEvent::InitiateDeletion, &facts).unwrap();
        assert!(machine.ticket() > first);

        let step = machine.resolve(first, Resolution::AccountDeleted).unwrap();
        assert_eq!(step, Step::Discarded);
        assert!(!machine.state().is_idle());
    }
}
