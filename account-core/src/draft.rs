//! Editable copy of the profile and the baseline it is compared against

use account_config::ProfileLimits;
use account_model::{
    AccountSnapshot, AvatarRef, Profile, ProfilePatch,
    UpdateProfileOutcome,
};
use tracing::debug;

use crate::emails::EditedEmailList;
use crate::error::{Field, ProfileError};
use crate::reconcile::reconcile;
use crate::validation::{DisplayName, EmailAddress, Username, validate_bio};

/// Fields the user is editing, plus the edited email list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub avatar: Option<AvatarRef>,
    pub emails: EditedEmailList,
}

impl ProfileDraft {
    pub fn from_snapshot(snapshot: &AccountSnapshot) -> Self {
        let profile = &snapshot.profile;
        Self {
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            bio: profile.bio.clone(),
            avatar: profile.avatar.clone(),
            emails: EditedEmailList::from_snapshot(snapshot),
        }
    }

    /// Differs from what `baseline` would produce
    pub fn is_dirty_against(&self, baseline: &AccountSnapshot) -> bool {
        let profile = &baseline.profile;
        self.username != profile.username
            || self.display_name != profile.display_name
            || self.bio != profile.bio
            || self.avatar != profile.avatar
            || self.emails.entries()
                != EditedEmailList::from_snapshot(baseline).entries()
    }

    /// Validate every field and compute the patch against `baseline`.
    pub fn build_patch(
        &self,
        baseline: &AccountSnapshot,
        limits: &ProfileLimits,
    ) -> Result<ProfilePatch, ProfileError> {
        let username = Username::parse(&self.username, limits.username_max)?;
        let display_name =
            DisplayName::parse(&self.display_name, limits.display_name_max)?;
        validate_bio(&self.bio, limits)?;

        let mut entries = self.emails.entries().to_vec();
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.address = EmailAddress::parse(
                &entry.address,
                Field::Email(index),
                limits.email_max,
            )?
            .into_string();
        }

        let baseline_list = EditedEmailList::from_snapshot(baseline);
        let emails = reconcile(
            baseline_list.entries(),
            &entries,
            &self.emails.dirty_indices(),
        )?;

        Ok(ProfilePatch {
            username: username.into_string(),
            display_name: display_name.into_string(),
            bio: self.bio.clone(),
            avatar: self.avatar.clone(),
            emails,
        })
    }
}

/// Baseline as it should look once `patch` has been committed.
///
/// Deleted rows are dropped and edited rows renamed. Promoting a secondary
/// row swaps its address with the old primary. While the backend holds the
/// primary change for verification, the primary stays where it was.
pub fn project_committed(
    baseline: &AccountSnapshot,
    patch: &ProfilePatch,
    outcome: &UpdateProfileOutcome,
) -> AccountSnapshot {
    let mut next = baseline.clone();
    next.profile = Profile {
        primary_email: baseline.profile.primary_email.clone(),
        ..patch.to_profile()
    };

    for change in patch.emails.deletions() {
        next.secondary_emails.retain(|row| row.id != change.id);
    }
    for change in patch.emails.updates() {
        if let Some(row) =
            next.secondary_emails.iter_mut().find(|row| row.id == change.id)
        {
            row.address = change.address.clone();
            row.verified_at = None;
        }
    }

    let new_primary = patch.primary_email();
    if new_primary == baseline.primary_email() || outcome.email_change_pending()
    {
        return next;
    }

    let old_primary = baseline.primary_email().to_string();
    let old_verified_at = baseline.primary_email_verified_at;
    match next
        .secondary_emails
        .iter_mut()
        .find(|row| row.address == new_primary)
    {
        Some(row) => {
            debug!(entry_id = %row.id, "promoted secondary email swaps with primary");
            next.primary_email_verified_at = row.verified_at;
            row.address = old_primary;
            row.verified_at = old_verified_at;
        }
        None => {
            next.primary_email_verified_at = None;
        }
    }
    next.profile.primary_email = new_primary.to_string();
    next
}
