//! Shared harness for account-core integration tests.
#![allow(dead_code)]

pub mod gateway;
pub mod sync;

use std::sync::Arc;

use account_config::EditorConfig;
use account_core::FormSession;
use account_core::model::chrono::{TimeZone, Utc};
use account_core::model::{
    AccountSnapshot, EmailId, FederatedKind, IdentityProvider, Profile,
    StoredSecondaryEmail, UserId,
};
use anyhow::Result;

use gateway::ScriptedGateway;
use sync::RecordingSync;

pub const PRIMARY_EMAIL: &str = "ada@example.com";
pub const WORK_EMAIL: &str = "ada@work.example";
pub const OLD_EMAIL: &str = "ada@old.example";
pub const EXTERNAL_EMAIL: &str = "ada@gmail.com";
pub const TEST_PASSWORD: &str = "StrongPassword123!";
pub const TEST_TOTP: &str = "482193";

/// Local account with a verified work address and an unverified old one.
pub fn local_account(two_factor_enabled: bool) -> AccountSnapshot {
    let verified = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single();
    AccountSnapshot {
        user_id: UserId::new(),
        profile: Profile {
            username: "ada".into(),
            display_name: "Ada Lovelace".into(),
            bio: "Analyst of engines".into(),
            avatar: None,
            primary_email: PRIMARY_EMAIL.into(),
        },
        primary_email_verified_at: verified,
        secondary_emails: vec![
            StoredSecondaryEmail {
                id: EmailId(11),
                address: WORK_EMAIL.into(),
                verified_at: verified,
            },
            StoredSecondaryEmail {
                id: EmailId(12),
                address: OLD_EMAIL.into(),
                verified_at: None,
            },
        ],
        identity_provider: IdentityProvider::Local,
        password_set: true,
        two_factor_enabled,
    }
}

/// Google-linked account whose external address differs from the primary.
pub fn federated_account(password_set: bool) -> AccountSnapshot {
    AccountSnapshot {
        identity_provider: IdentityProvider::Federated {
            kind: FederatedKind::Google,
            external_email: Some(EXTERNAL_EMAIL.into()),
        },
        password_set,
        ..local_account(false)
    }
}

/// End-to-end editor harness: scripted backend plus recorded session hooks.
pub struct TestEditorHarness {
    pub gateway: Arc<ScriptedGateway>,
    pub sync: Arc<RecordingSync>,
    pub config: EditorConfig,
}

impl TestEditorHarness {
    pub fn new(account: AccountSnapshot) -> Self {
        Self::with_config(account, EditorConfig::default())
    }

    pub fn with_config(account: AccountSnapshot, config: EditorConfig) -> Self {
        Self {
            gateway: Arc::new(ScriptedGateway::new(account)),
            sync: Arc::new(RecordingSync::default()),
            config,
        }
    }

    /// Open a session through the scripted gateway.
    pub async fn open(&self) -> Result<FormSession> {
        let session = FormSession::open(
            self.gateway.clone(),
            self.sync.clone(),
            &self.config,
        )
        .await?;
        Ok(session)
    }
}
