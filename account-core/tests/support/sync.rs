use account_core::model::Profile;
use account_core::{SessionSync, SignOutTarget};
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Invalidate,
    Refresh,
    Propagate(Profile),
    Terminate(SignOutTarget),
}

/// Session hooks that only record what they were asked to do.
#[derive(Debug, Default)]
pub struct RecordingSync {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingSync {
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn terminated_with(&self) -> Option<SignOutTarget> {
        self.events().into_iter().find_map(|event| match event {
            SyncEvent::Terminate(target) => Some(target),
            _ => None,
        })
    }
}

#[async_trait]
impl SessionSync for RecordingSync {
    async fn invalidate_profile(&self) {
        self.events.lock().push(SyncEvent::Invalidate);
    }

    async fn refresh_derived_views(&self) {
        self.events.lock().push(SyncEvent::Refresh);
    }

    async fn propagate_identity(&self, profile: &Profile) {
        self.events.lock().push(SyncEvent::Propagate(profile.clone()));
    }

    async fn terminate(&self, target: SignOutTarget) {
        self.events.lock().push(SyncEvent::Terminate(target));
    }
}
