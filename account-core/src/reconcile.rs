//! Minimal email patch computation
//!
//! Pure function from (baseline, edited, dirty positions) to the row-level
//! changes the backend needs. It never invents rows: every change refers to an
//! id present in the baseline.

use std::collections::{BTreeSet, HashMap, HashSet};

use account_model::{EmailChange, EmailId, EmailPatch, SecondaryEmailEntry};
use tracing::warn;

use crate::error::StateError;

/// Compute the email delta between `baseline` and `edited`.
///
/// Updates come first in ascending dirty-index order, then deletions in
/// baseline order. The primary placeholder never produces a change.
pub fn reconcile(
    baseline: &[SecondaryEmailEntry],
    edited: &[SecondaryEmailEntry],
    dirty_indices: &BTreeSet<usize>,
) -> Result<EmailPatch, StateError> {
    let mut primaries = edited.iter().filter(|entry| entry.is_primary);
    let primary = primaries.next().ok_or(StateError::NoPrimaryEmail)?;
    let extra = primaries.count();
    if extra > 0 {
        warn!(
            chosen_id = %primary.id,
            extra_primaries = extra,
            "email list has more than one primary; using the first"
        );
    }

    let baseline_by_id: HashMap<EmailId, &SecondaryEmailEntry> =
        baseline.iter().map(|entry| (entry.id, entry)).collect();

    let mut changes = Vec::new();

    for &index in dirty_indices {
        let Some(entry) = edited.get(index) else {
            warn!(index, len = edited.len(), "dirty index outside the email list");
            continue;
        };
        if entry.id.is_placeholder() {
            continue;
        }
        match baseline_by_id.get(&entry.id) {
            Some(original) if original.address != entry.address => {
                changes.push(EmailChange::updated(entry.id, &entry.address));
            }
            Some(_) => {}
            None => {
                warn!(entry_id = %entry.id, "edited entry has no baseline row");
            }
        }
    }

    let edited_ids: HashSet<EmailId> =
        edited.iter().map(|entry| entry.id).collect();
    for original in baseline {
        if original.id.is_placeholder() || edited_ids.contains(&original.id) {
            continue;
        }
        changes.push(EmailChange::deleted(original.id, &original.address));
    }

    Ok(EmailPatch {
        changes,
        primary_email: primary.address.clone(),
    })
}
