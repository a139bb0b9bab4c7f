//! Session synchronisation hooks
//!
//! After a mutation settles, cached profile reads must be invalidated and any
//! externally cached views derived from the profile refreshed, in that order.
//! A profile update additionally pushes the new identity into the active
//! session token. Account deletion ends with [`SessionSync::terminate`].

use std::sync::Arc;

use account_config::SignOutConfig;
use account_model::Profile;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Where the session is sent once the account no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutTarget {
    pub callback_url: Url,
}

impl SignOutTarget {
    pub fn from_config(config: &SignOutConfig) -> Self {
        Self {
            callback_url: config.logout_url(),
        }
    }
}

/// Named invalidation hooks implemented by the host application.
///
/// Hooks are infallible from the editor's point of view; implementations log
/// their own failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionSync: Send + Sync {
    /// Drop cached reads of the current user's profile
    async fn invalidate_profile(&self);

    /// Re-render cached views derived from the profile (public pages, etc.)
    async fn refresh_derived_views(&self);

    /// Copy identity fields into the active session token
    async fn propagate_identity(&self, profile: &Profile);

    /// Sign out and redirect
    async fn terminate(&self, target: SignOutTarget);
}

/// Explicit handle to the host's session hooks.
#[derive(Clone)]
pub struct SessionContext {
    sync: Arc<dyn SessionSync>,
    sign_out: SignOutTarget,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("sign_out", &self.sign_out)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(sync: Arc<dyn SessionSync>, sign_out: SignOutTarget) -> Self {
        Self { sync, sign_out }
    }

    pub fn sign_out_target(&self) -> &SignOutTarget {
        &self.sign_out
    }

    /// Invalidate then refresh. Returns once both hooks have completed.
    pub async fn settle(&self) {
        debug!("settling session caches");
        self.sync.invalidate_profile().await;
        self.sync.refresh_derived_views().await;
    }

    /// Settle after a committed profile update and push the new identity.
    pub async fn settle_profile_update(&self, profile: &Profile) {
        self.settle().await;
        self.sync.propagate_identity(profile).await;
    }

    pub async fn terminate(&self) {
        debug!(callback = %self.sign_out.callback_url, "terminating session");
        self.sync.terminate(self.sign_out.clone()).await;
    }
}
