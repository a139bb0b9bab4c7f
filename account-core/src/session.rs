//! Profile editor session
//!
//! `FormSession` owns the baseline, the draft being edited, the confirmation
//! machine and one in-flight slot per mutation kind. All state sits behind a
//! lock that is never held across an `.await`, so concurrent callers observe
//! in-flight calls and get rejected instead of queued.

use std::collections::HashSet;
use std::sync::Arc;

use account_config::{EditorConfig, ProfileLimits};
use account_model::{
    AccountSnapshot, AddedEmail, AvatarRef, EmailId, SecondaryEmailEntry,
    StoredSecondaryEmail, UpdateProfileOutcome,
};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::confirmation::{
    AccountFacts, Command, ConfirmationEvent, ConfirmationMachine,
    ConfirmationState, GateKind, PendingPatch, Resolution, Step,
};
use crate::credential::{DeletionCredentials, SecureCredential};
use crate::draft::{ProfileDraft, project_committed};
use crate::emails::SecondaryEmailLifecycle;
use crate::error::{MutationKind, ProfileError, StateError};
use crate::gateway::ProfileGateway;
use crate::messages::Notice;
use crate::sync::{SessionContext, SessionSync, SignOutTarget};

/// Result of [`FormSession::submit`] and [`FormSession::confirm_password`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Committed {
        outcome: UpdateProfileOutcome,
        notice: Notice,
    },
    /// The primary email changed; confirm the current password to continue
    AwaitingPassword,
    /// The gate was cancelled while the password was being checked
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    AwaitingCredentials { totp_required: bool },
    Deleted { sign_out: SignOutTarget },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// Nothing to disconnect for this account
    Unavailable,
    AwaitingPasswordCreation,
    AwaitingConfirmation,
    Disconnected(Notice),
}

struct SessionInner {
    baseline: AccountSnapshot,
    draft: ProfileDraft,
    machine: ConfirmationMachine,
    notice: Option<Notice>,
    closed: bool,
}

impl SessionInner {
    fn facts(&self) -> AccountFacts {
        AccountFacts {
            provider: self.baseline.identity_provider.clone(),
            password_set: self.baseline.password_set,
            two_factor_enabled: self.baseline.two_factor_enabled,
            baseline_email: self.baseline.primary_email().to_string(),
        }
    }

    fn ensure_open(&self) -> Result<(), StateError> {
        if self.closed {
            return Err(StateError::SessionClosed);
        }
        Ok(())
    }
}

/// Releases its mutation slot when dropped, including when the owning future
/// is dropped mid-call.
struct InFlightSlot<'a> {
    slots: &'a Mutex<HashSet<MutationKind>>,
    kind: MutationKind,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.slots.lock().remove(&self.kind);
    }
}

/// One user's profile editor.
pub struct FormSession {
    gateway: Arc<dyn ProfileGateway>,
    emails: SecondaryEmailLifecycle,
    context: SessionContext,
    limits: ProfileLimits,
    inner: Mutex<SessionInner>,
    in_flight: Mutex<HashSet<MutationKind>>,
}

impl std::fmt::Debug for FormSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FormSession")
            .field("user_id", &inner.baseline.user_id)
            .field("state", &inner.machine.state().description())
            .field("closed", &inner.closed)
            .field("in_flight", &*self.in_flight.lock())
            .finish_non_exhaustive()
    }
}

impl FormSession {
    /// Load the account and start editing it.
    #[instrument(skip_all)]
    pub async fn open(
        gateway: Arc<dyn ProfileGateway>,
        sync: Arc<dyn SessionSync>,
        config: &EditorConfig,
    ) -> Result<Self, ProfileError> {
        let snapshot = gateway.fetch_account().await.map_err(|err| {
            warn!(error = %err, "failed to load account");
            ProfileError::from(err)
        })?;
        info!(user_id = %snapshot.user_id.as_uuid(), "profile editor session opened");
        Ok(Self::new(snapshot, gateway, sync, config))
    }

    pub fn new(
        snapshot: AccountSnapshot,
        gateway: Arc<dyn ProfileGateway>,
        sync: Arc<dyn SessionSync>,
        config: &EditorConfig,
    ) -> Self {
        let context = SessionContext::new(
            sync,
            SignOutTarget::from_config(&config.sign_out),
        );
        Self {
            emails: SecondaryEmailLifecycle::new(
                Arc::clone(&gateway),
                config.limits.email_max,
            ),
            gateway,
            context,
            limits: config.limits,
            inner: Mutex::new(SessionInner {
                draft: ProfileDraft::from_snapshot(&snapshot),
                baseline: snapshot,
                machine: ConfirmationMachine::new(),
                notice: None,
                closed: false,
            }),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn claim(&self, kind: MutationKind) -> Result<InFlightSlot<'_>, StateError> {
        let mut slots = self.in_flight.lock();
        if !slots.insert(kind) {
            return Err(match kind {
                MutationKind::UpdateProfile => StateError::SubmitInFlight,
                other => StateError::MutationInFlight(other),
            });
        }
        Ok(InFlightSlot {
            slots: &self.in_flight,
            kind,
        })
    }

    fn ensure_idle_slot(&self, kind: MutationKind) -> Result<(), StateError> {
        if self.in_flight.lock().contains(&kind) {
            return Err(match kind {
                MutationKind::UpdateProfile => StateError::SubmitInFlight,
                other => StateError::MutationInFlight(other),
            });
        }
        Ok(())
    }

    // ---- reads ----

    pub fn baseline(&self) -> AccountSnapshot {
        self.inner.lock().baseline.clone()
    }

    pub fn draft(&self) -> ProfileDraft {
        self.inner.lock().draft.clone()
    }

    pub fn email_entries(&self) -> Vec<SecondaryEmailEntry> {
        self.inner.lock().draft.emails.entries().to_vec()
    }

    pub fn confirmation_state(&self) -> ConfirmationState {
        self.inner.lock().machine.state().clone()
    }

    pub fn gate(&self) -> Option<GateKind> {
        self.inner.lock().machine.state().gate()
    }

    pub fn pending_patch(&self) -> Option<PendingPatch> {
        self.inner.lock().machine.pending_patch().cloned()
    }

    /// Error from the last failed call under the open gate
    pub fn gate_error(&self) -> Option<ProfileError> {
        self.inner.lock().machine.last_error().cloned()
    }

    pub fn is_dirty(&self) -> bool {
        let inner = self.inner.lock();
        inner.draft.is_dirty_against(&inner.baseline)
    }

    pub fn is_in_flight(&self, kind: MutationKind) -> bool {
        self.in_flight.lock().contains(&kind)
    }

    pub fn is_submitting(&self) -> bool {
        self.is_in_flight(MutationKind::UpdateProfile)
    }

    /// Save is enabled only for a dirty, idle, open session
    pub fn can_submit(&self) -> bool {
        let inner = self.inner.lock();
        !inner.closed
            && inner.machine.state().is_idle()
            && inner.draft.is_dirty_against(&inner.baseline)
            && !self.is_submitting()
    }

    /// Whether the connected-account section should offer a disconnect
    pub fn can_disconnect(&self) -> bool {
        self.inner.lock().baseline.can_disconnect()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.inner.lock().notice.clone()
    }

    pub fn take_notice(&self) -> Option<Notice> {
        self.inner.lock().notice.take()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    // ---- edits ----

    fn edit<T>(
        &self,
        apply: impl FnOnce(&mut ProfileDraft) -> Result<T, StateError>,
    ) -> Result<T, ProfileError> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(apply(&mut inner.draft)?)
    }

    pub fn set_username(&self, username: impl Into<String>) -> Result<(), ProfileError> {
        let username = username.into();
        self.edit(|draft| {
            draft.username = username;
            Ok(())
        })
    }

    pub fn set_display_name(
        &self,
        display_name: impl Into<String>,
    ) -> Result<(), ProfileError> {
        let display_name = display_name.into();
        self.edit(|draft| {
            draft.display_name = display_name;
            Ok(())
        })
    }

    pub fn set_bio(&self, bio: impl Into<String>) -> Result<(), ProfileError> {
        let bio = bio.into();
        self.edit(|draft| {
            draft.bio = bio;
            Ok(())
        })
    }

    /// Replace the avatar, or remove it with `None`
    pub fn set_avatar(&self, avatar: Option<AvatarRef>) -> Result<(), ProfileError> {
        self.edit(|draft| {
            draft.avatar = avatar;
            Ok(())
        })
    }

    pub fn edit_email(
        &self,
        index: usize,
        address: impl Into<String>,
    ) -> Result<(), ProfileError> {
        let address = address.into();
        self.edit(|draft| draft.emails.edit(index, address))
    }

    pub fn promote_email(&self, index: usize) -> Result<(), ProfileError> {
        self.edit(|draft| draft.emails.promote(index))
    }

    pub fn remove_email(
        &self,
        index: usize,
    ) -> Result<SecondaryEmailEntry, ProfileError> {
        self.edit(|draft| draft.emails.remove(index))
    }

    /// Drop every unsaved edit
    pub fn reset(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.draft = ProfileDraft::from_snapshot(&inner.baseline);
    }

    // ---- profile update ----

    /// Validate the draft, compute its patch and either commit it or open the
    /// password gate when a local account changes its primary email.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SubmitOutcome, ProfileError> {
        let (patch, slot) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            inner.ensure_open()?;
            self.ensure_idle_slot(MutationKind::UpdateProfile)?;
            if !inner.machine.state().is_idle() {
                return Err(StateError::GateAlreadyOpen.into());
            }
            if !inner.draft.is_dirty_against(&inner.baseline) {
                return Err(StateError::NothingToSubmit.into());
            }

            let patch = inner.draft.build_patch(&inner.baseline, &self.limits)?;
            let facts = inner.facts();
            match inner
                .machine
                .handle(ConfirmationEvent::Submit(PendingPatch::new(patch)), &facts)?
            {
                Step::GateOpened(_) => {
                    info!("primary email change requires password confirmation");
                    return Ok(SubmitOutcome::AwaitingPassword);
                }
                Step::Run(Command::UpdateProfile(patch)) => {
                    (patch, self.claim(MutationKind::UpdateProfile)?)
                }
                other => return Err(unexpected(other)),
            }
        };

        self.commit(patch, slot).await
    }

    /// Confirm the current password for a pending primary email change.
    #[instrument(skip_all)]
    pub async fn confirm_password(
        &self,
        password: impl Into<SecureCredential>,
    ) -> Result<SubmitOutcome, ProfileError> {
        let (ticket, password, slot) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            inner.ensure_open()?;
            self.ensure_idle_slot(MutationKind::VerifyPassword)?;
            let facts = inner.facts();
            match inner
                .machine
                .handle(ConfirmationEvent::PasswordConfirmed(password.into()), &facts)?
            {
                Step::Run(Command::VerifyPassword { ticket, password }) => {
                    (ticket, password, self.claim(MutationKind::VerifyPassword)?)
                }
                other => return Err(unexpected(other)),
            }
        };

        let resolution = match self.gateway.verify_password(&password).await {
            Ok(()) => Resolution::PasswordVerified,
            Err(err) => {
                warn!(error = %err, "password verification failed");
                Resolution::PasswordRejected(err.into())
            }
        };
        drop(password);

        // update slot is claimed under the lock that closes the gate
        let next = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            let update_slot = if matches!(resolution, Resolution::PasswordVerified)
                && inner.machine.ticket() == Some(ticket)
            {
                Some(self.claim(MutationKind::UpdateProfile)?)
            } else {
                None
            };
            match (inner.machine.resolve(Some(ticket), resolution)?, update_slot) {
                (Step::Run(Command::UpdateProfile(patch)), Some(update_slot)) => {
                    Some((patch, update_slot))
                }
                (Step::Discarded, _) => None,
                (other, _) => return Err(unexpected(other)),
            }
        };
        drop(slot);

        match next {
            Some((patch, update_slot)) => self.commit(patch, update_slot).await,
            None => Ok(SubmitOutcome::Cancelled),
        }
    }

    async fn commit(
        &self,
        patch: PendingPatch,
        _slot: InFlightSlot<'_>,
    ) -> Result<SubmitOutcome, ProfileError> {
        let outcome = self.gateway.update_profile(&patch).await.map_err(|err| {
            warn!(error = %err, "profile update failed");
            ProfileError::from(err)
        })?;

        let notice = if outcome.email_change_pending() {
            Notice::EmailChangePendingVerification {
                new_email: patch.primary_email().to_string(),
            }
        } else {
            Notice::SettingsUpdated
        };

        let profile = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            inner.baseline = project_committed(&inner.baseline, &patch, &outcome);
            inner.draft = ProfileDraft::from_snapshot(&inner.baseline);
            inner.notice = Some(notice.clone());
            inner.baseline.profile.clone()
        };
        info!(
            email_changes = patch.emails.changes.len(),
            email_change_pending = outcome.email_change_pending(),
            "profile updated"
        );

        self.context.settle_profile_update(&profile).await;
        self.rebase().await;

        Ok(SubmitOutcome::Committed { outcome, notice })
    }

    /// Re-read the account after a mutation. Unsaved edits are kept.
    async fn rebase(&self) {
        match self.gateway.fetch_account().await {
            Ok(snapshot) => {
                let mut guard = self.inner.lock();
                let inner = &mut *guard;
                if inner.closed {
                    return;
                }
                let clean = !inner.draft.is_dirty_against(&inner.baseline);
                inner.baseline = snapshot;
                if clean {
                    inner.draft = ProfileDraft::from_snapshot(&inner.baseline);
                }
                debug!(draft_kept = !clean, "baseline refreshed");
            }
            Err(err) => {
                warn!(error = %err, "failed to refresh account; keeping local projection");
            }
        }
    }

    // ---- deletion ----

    #[instrument(skip(self))]
    pub async fn initiate_deletion(&self) -> Result<DeletionOutcome, ProfileError> {
        self.deletion_step(ConfirmationEvent::InitiateDeletion).await
    }

    #[instrument(skip_all)]
    pub async fn confirm_deletion(
        &self,
        credentials: DeletionCredentials,
    ) -> Result<DeletionOutcome, ProfileError> {
        self.deletion_step(ConfirmationEvent::DeletionConfirmed(credentials))
            .await
    }

    async fn deletion_step(
        &self,
        event: ConfirmationEvent,
    ) -> Result<DeletionOutcome, ProfileError> {
        let (command, slot) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            inner.ensure_open()?;
            self.ensure_idle_slot(MutationKind::DeleteAccount)?;
            let facts = inner.facts();
            match inner.machine.handle(event, &facts)? {
                Step::GateOpened(GateKind::PasswordForDeletion { totp_required }) => {
                    return Ok(DeletionOutcome::AwaitingCredentials { totp_required });
                }
                Step::Run(
                    command @ (Command::DeleteAccount { .. }
                    | Command::DeleteAccountWithoutPassword),
                ) => (command, self.claim(MutationKind::DeleteAccount)?),
                other => return Err(unexpected(other)),
            }
        };

        self.run_deletion(command, slot).await
    }

    async fn run_deletion(
        &self,
        command: Command,
        _slot: InFlightSlot<'_>,
    ) -> Result<DeletionOutcome, ProfileError> {
        let ticket = command.ticket();
        let result = match &command {
            Command::DeleteAccount {
                password,
                totp_code,
                ..
            } => {
                self.gateway
                    .delete_account(password, totp_code.as_ref())
                    .await
            }
            Command::DeleteAccountWithoutPassword => {
                self.gateway.delete_account_without_password().await
            }
            other => return Err(unexpected(Step::Run(other.clone()))),
        };
        drop(command);

        // settles on success and on failure alike
        self.context.settle().await;

        match result {
            Ok(()) => {
                {
                    let mut inner = self.inner.lock();
                    // the account is gone even if the gate was cancelled
                    inner.machine.terminate();
                    inner.closed = true;
                }
                info!("account deleted; terminating session");
                self.context.terminate().await;
                Ok(DeletionOutcome::Deleted {
                    sign_out: self.context.sign_out_target().clone(),
                })
            }
            Err(err) => {
                let err = ProfileError::from(err);
                warn!(error = %err, "account deletion failed");
                let resolved = self
                    .inner
                    .lock()
                    .machine
                    .resolve(ticket, Resolution::DeletionFailed(err.clone()));
                match resolved {
                    Err(mapped) => Err(mapped),
                    Ok(_) => Err(err),
                }
            }
        }
    }

    // ---- connected account ----

    #[instrument(skip(self))]
    pub fn initiate_disconnect(&self) -> Result<DisconnectOutcome, ProfileError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.ensure_open()?;
        let facts = inner.facts();
        match inner.machine.handle(ConfirmationEvent::InitiateDisconnect, &facts)? {
            Step::NoOp => Ok(DisconnectOutcome::Unavailable),
            Step::GateOpened(GateKind::DisconnectConfirmation) => {
                Ok(DisconnectOutcome::AwaitingConfirmation)
            }
            Step::GateOpened(GateKind::PasswordCreationBeforeDisconnect) => {
                Ok(DisconnectOutcome::AwaitingPasswordCreation)
            }
            other => Err(unexpected(other)),
        }
    }

    /// Record that the user created a local password. Returns the gate that
    /// is open afterwards.
    pub fn password_established(&self) -> Result<Option<GateKind>, ProfileError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.ensure_open()?;
        inner.baseline.password_set = true;
        let facts = inner.facts();
        inner
            .machine
            .handle(ConfirmationEvent::PasswordEstablished, &facts)?;
        Ok(inner.machine.state().gate())
    }

    #[instrument(skip(self))]
    pub async fn confirm_disconnect(&self) -> Result<DisconnectOutcome, ProfileError> {
        let (ticket, slot) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            inner.ensure_open()?;
            self.ensure_idle_slot(MutationKind::UnlinkAccount)?;
            let facts = inner.facts();
            if inner.machine.state().is_idle() && !facts.can_disconnect() {
                return Err(StateError::DisconnectUnavailable.into());
            }
            match inner
                .machine
                .handle(ConfirmationEvent::DisconnectConfirmed, &facts)?
            {
                Step::Run(Command::UnlinkConnectedAccount { ticket }) => {
                    (ticket, self.claim(MutationKind::UnlinkAccount)?)
                }
                other => return Err(unexpected(other)),
            }
        };

        let result = self.gateway.unlink_connected_account().await;
        let _slot = slot;

        match result {
            Ok(outcome) => {
                let notice = Notice::Disconnected(outcome.message.clone());
                {
                    let mut inner = self.inner.lock();
                    let step = inner
                        .machine
                        .resolve(Some(ticket), Resolution::Unlinked(outcome))?;
                    if step == Step::Discarded {
                        debug!("disconnect completed after its dialog was closed");
                    } else {
                        inner.notice = Some(notice.clone());
                    }
                }
                info!("connected account disconnected");
                self.context.settle().await;
                self.rebase().await;
                Ok(DisconnectOutcome::Disconnected(notice))
            }
            Err(err) => {
                let err = ProfileError::from(err);
                warn!(error = %err, "disconnect failed");
                let resolved = self
                    .inner
                    .lock()
                    .machine
                    .resolve(Some(ticket), Resolution::UnlinkFailed(err.clone()));
                match resolved {
                    Err(mapped) => Err(mapped),
                    Ok(_) => Err(err),
                }
            }
        }
    }

    /// Close whichever dialog is open. No backend call is made and any
    /// captured patch is dropped. Returns whether a gate was open.
    pub fn cancel(&self) -> bool {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let facts = inner.facts();
        matches!(
            inner.machine.handle(ConfirmationEvent::Cancel, &facts),
            Ok(Step::Cancelled)
        )
    }

    // ---- secondary emails ----

    /// Create a secondary email row and append it to the list. The draft and
    /// baseline both gain the row, so adding never makes the form dirty.
    #[instrument(skip(self))]
    pub async fn add_secondary_email(
        &self,
        address: &str,
    ) -> Result<AddedEmail, ProfileError> {
        let _slot = {
            let inner = self.inner.lock();
            inner.ensure_open()?;
            self.claim(MutationKind::AddSecondaryEmail)?
        };

        let added = self.emails.add(address).await?;

        {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            inner.draft.emails.append_added(&added)?;
            inner.baseline.secondary_emails.push(StoredSecondaryEmail {
                id: added.id,
                address: added.address.clone(),
                verified_at: None,
            });
            inner.notice = Some(Notice::VerificationPending(added.address.clone()));
        }

        self.context.settle().await;
        Ok(added)
    }

    /// Dismiss the "check your inbox" notice raised by an add
    pub fn acknowledge_new_email(&self) {
        let mut inner = self.inner.lock();
        if matches!(inner.notice, Some(Notice::VerificationPending(_))) {
            inner.notice = None;
        }
    }

    /// Ask for another verification mail for an entry. Reports success
    /// immediately; delivery failures are only logged.
    pub fn resend_verification(&self, id: EmailId) -> Result<Notice, ProfileError> {
        let address = {
            let inner = self.inner.lock();
            inner.ensure_open()?;
            inner
                .draft
                .emails
                .find(id)
                .map(|entry| entry.address.clone())
                .ok_or(StateError::UnknownEntry { id: id.get() })?
        };

        debug!(entry_id = %id, "resending verification email");
        let notice = self.emails.resend_verification(address);
        self.inner.lock().notice = Some(notice.clone());
        Ok(notice)
    }
}

fn unexpected(step: Step) -> ProfileError {
    warn!(?step, "confirmation machine returned an unexpected step");
    StateError::UnexpectedGate.into()
}
