use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use account_core::model::{
    AccountSnapshot, AddedEmail, EmailId, IdentityProvider, ProfilePatch,
    StoredSecondaryEmail, UnlinkOutcome, UpdateProfileOutcome,
};
use account_core::{
    GatewayError, GatewayResult, ProfileGateway, SecureCredential,
    project_committed,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Gateway operations a test can script or hold open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FetchAccount,
    UpdateProfile,
    VerifyPassword,
    DeleteAccount,
    DeleteAccountWithoutPassword,
    Unlink,
    AddSecondaryEmail,
    ResendVerifyEmail,
}

/// One recorded gateway call, with secrets exposed for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    FetchAccount,
    UpdateProfile(ProfilePatch),
    VerifyPassword(String),
    DeleteAccount {
        password: String,
        totp_code: Option<String>,
    },
    DeleteAccountWithoutPassword,
    Unlink,
    AddSecondaryEmail(String),
    ResendVerifyEmail(String),
}

impl GatewayCall {
    pub fn op(&self) -> Op {
        match self {
            GatewayCall::FetchAccount => Op::FetchAccount,
            GatewayCall::UpdateProfile(_) => Op::UpdateProfile,
            GatewayCall::VerifyPassword(_) => Op::VerifyPassword,
            GatewayCall::DeleteAccount { .. } => Op::DeleteAccount,
            GatewayCall::DeleteAccountWithoutPassword => {
                Op::DeleteAccountWithoutPassword
            }
            GatewayCall::Unlink => Op::Unlink,
            GatewayCall::AddSecondaryEmail(_) => Op::AddSecondaryEmail,
            GatewayCall::ResendVerifyEmail(_) => Op::ResendVerifyEmail,
        }
    }
}

/// Keeps a call open until the test releases it.
#[derive(Debug, Default)]
pub struct Hold {
    entered: Notify,
    release: Notify,
}

impl Hold {
    /// Wait until the held call has started
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct Script {
    account: Option<AccountSnapshot>,
    failures: HashMap<Op, VecDeque<GatewayError>>,
    update_outcomes: VecDeque<UpdateProfileOutcome>,
    holds: HashMap<Op, Arc<Hold>>,
    calls: Vec<GatewayCall>,
    next_email_id: i64,
    deleted: bool,
}

/// In-memory backend. Successful mutations are applied to its own copy of
/// the account, so re-fetches observe them.
#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
    resend_done: Notify,
}

impl ScriptedGateway {
    pub fn new(account: AccountSnapshot) -> Self {
        let next_email_id = account
            .secondary_emails
            .iter()
            .map(|row| row.id.get())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            script: Mutex::new(Script {
                account: Some(account),
                next_email_id,
                ..Script::default()
            }),
            resend_done: Notify::new(),
        }
    }

    /// Fail the next call of `op` with `error`
    pub fn fail_next(&self, op: Op, error: GatewayError) {
        self.script
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Outcome returned by the next successful update
    pub fn next_update_outcome(&self, outcome: UpdateProfileOutcome) {
        self.script.lock().update_outcomes.push_back(outcome);
    }

    /// Hold the next call of `op` open
    pub fn hold(&self, op: Op) -> Arc<Hold> {
        let hold = Arc::new(Hold::default());
        self.script.lock().holds.insert(op, Arc::clone(&hold));
        hold
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.script.lock().calls.clone()
    }

    pub fn calls_to(&self, op: Op) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.op() == op)
            .collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls_to(op).len()
    }

    pub fn account(&self) -> Option<AccountSnapshot> {
        self.script.lock().account.clone()
    }

    pub fn is_deleted(&self) -> bool {
        self.script.lock().deleted
    }

    /// Resolves once a background resend has finished
    pub async fn resend_finished(&self) {
        self.resend_done.notified().await;
    }

    async fn enter(&self, call: GatewayCall) -> GatewayResult<()> {
        let op = call.op();
        let hold = {
            let mut script = self.script.lock();
            script.calls.push(call);
            script.holds.remove(&op)
        };
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        let mut script = self.script.lock();
        if let Some(err) = script.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        if script.deleted {
            return Err(GatewayError::SessionExpired);
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileGateway for ScriptedGateway {
    async fn fetch_account(&self) -> GatewayResult<AccountSnapshot> {
        self.enter(GatewayCall::FetchAccount).await?;
        self.script
            .lock()
            .account
            .clone()
            .ok_or(GatewayError::Transport("no account scripted".into()))
    }

    async fn update_profile(
        &self,
        patch: &ProfilePatch,
    ) -> GatewayResult<UpdateProfileOutcome> {
        self.enter(GatewayCall::UpdateProfile(patch.clone())).await?;
        let mut script = self.script.lock();
        let outcome = script.update_outcomes.pop_front().unwrap_or_default();
        if let Some(account) = script.account.take() {
            script.account = Some(project_committed(&account, patch, &outcome));
        }
        Ok(outcome)
    }

    async fn verify_password(
        &self,
        password: &SecureCredential,
    ) -> GatewayResult<()> {
        self.enter(GatewayCall::VerifyPassword(password.expose().to_string()))
            .await
    }

    async fn delete_account(
        &self,
        password: &SecureCredential,
        totp_code: Option<&SecureCredential>,
    ) -> GatewayResult<()> {
        self.enter(GatewayCall::DeleteAccount {
            password: password.expose().to_string(),
            totp_code: totp_code.map(|code| code.expose().to_string()),
        })
        .await?;
        self.script.lock().deleted = true;
        Ok(())
    }

    async fn delete_account_without_password(&self) -> GatewayResult<()> {
        self.enter(GatewayCall::DeleteAccountWithoutPassword).await?;
        self.script.lock().deleted = true;
        Ok(())
    }

    async fn unlink_connected_account(&self) -> GatewayResult<UnlinkOutcome> {
        self.enter(GatewayCall::Unlink).await?;
        if let Some(account) = self.script.lock().account.as_mut() {
            account.identity_provider = IdentityProvider::Local;
        }
        Ok(UnlinkOutcome {
            message: "Account disconnected".into(),
        })
    }

    async fn add_secondary_email(&self, address: &str) -> GatewayResult<AddedEmail> {
        self.enter(GatewayCall::AddSecondaryEmail(address.to_string()))
            .await?;
        let mut script = self.script.lock();
        let id = EmailId(script.next_email_id);
        script.next_email_id += 1;
        if let Some(account) = script.account.as_mut() {
            if account.primary_email() == address
                || account.secondary_emails.iter().any(|row| row.address == address)
            {
                return Err(GatewayError::Conflict(
                    account_core::model::ErrorCode::EmailAlreadyUsed,
                ));
            }
            account.secondary_emails.push(StoredSecondaryEmail {
                id,
                address: address.to_string(),
                verified_at: None,
            });
        }
        Ok(AddedEmail {
            id,
            address: address.to_string(),
        })
    }

    async fn resend_verify_email(&self, address: &str) -> GatewayResult<()> {
        let result = self
            .enter(GatewayCall::ResendVerifyEmail(address.to_string()))
            .await;
        self.resend_done.notify_one();
        result
    }
}
