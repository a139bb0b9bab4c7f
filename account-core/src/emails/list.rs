use std::collections::BTreeSet;

use account_model::{AccountSnapshot, AddedEmail, EmailId, SecondaryEmailEntry};
use chrono::{DateTime, Utc};

use crate::error::StateError;

/// Ordered, editable list of the account's email addresses.
///
/// Entries are keyed by stable [`EmailId`]; positions shift as entries are
/// removed, so edits are tracked per id and translated back to indices only
/// when a patch is built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditedEmailList {
    entries: Vec<SecondaryEmailEntry>,
    edited: BTreeSet<EmailId>,
}

impl EditedEmailList {
    /// Placeholder for the primary first, then each persisted secondary row.
    pub fn from_snapshot(snapshot: &AccountSnapshot) -> Self {
        Self::from_parts(
            snapshot.primary_email(),
            snapshot.primary_email_verified_at,
            snapshot
                .secondary_emails
                .iter()
                .map(SecondaryEmailEntry::from_stored),
        )
    }

    pub fn from_parts(
        primary_email: &str,
        primary_verified_at: Option<DateTime<Utc>>,
        secondary: impl IntoIterator<Item = SecondaryEmailEntry>,
    ) -> Self {
        let mut entries = vec![SecondaryEmailEntry::primary_placeholder(
            primary_email,
            primary_verified_at,
        )];
        entries.extend(secondary.into_iter().filter(|entry| !entry.id.is_placeholder()));
        Self {
            entries,
            edited: BTreeSet::new(),
        }
    }

    /// Build directly from entries, rejecting more than one placeholder.
    pub fn from_entries(
        entries: Vec<SecondaryEmailEntry>,
    ) -> Result<Self, StateError> {
        let placeholders =
            entries.iter().filter(|entry| entry.id.is_placeholder()).count();
        if placeholders > 1 {
            return Err(StateError::DuplicatePlaceholder);
        }
        Ok(Self {
            entries,
            edited: BTreeSet::new(),
        })
    }

    pub fn entries(&self) -> &[SecondaryEmailEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SecondaryEmailEntry> {
        self.entries.get(index)
    }

    pub fn find(&self, id: EmailId) -> Option<&SecondaryEmailEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn primary_index(&self) -> Option<usize> {
        self.entries.iter().position(|entry| entry.is_primary)
    }

    pub fn primary(&self) -> Option<&SecondaryEmailEntry> {
        self.entries.iter().find(|entry| entry.is_primary)
    }

    /// Exactly one primary and at most one placeholder
    pub fn is_well_formed(&self) -> bool {
        let primaries = self.entries.iter().filter(|e| e.is_primary).count();
        let placeholders =
            self.entries.iter().filter(|e| e.id.is_placeholder()).count();
        primaries == 1 && placeholders <= 1
    }

    /// Positions of entries whose address has been edited
    pub fn dirty_indices(&self) -> BTreeSet<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.edited.contains(&entry.id))
            .map(|(index, _)| index)
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<(), StateError> {
        if index >= self.entries.len() {
            return Err(StateError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    /// Replace the address of one entry. An edited address is unverified.
    pub fn edit(
        &mut self,
        index: usize,
        address: impl Into<String>,
    ) -> Result<(), StateError> {
        self.check_index(index)?;
        let entry = &mut self.entries[index];
        let address = address.into();
        if entry.address != address {
            entry.address = address;
            entry.verified_at = None;
            self.edited.insert(entry.id);
        }
        Ok(())
    }

    /// Make the entry at `index` the single primary.
    pub fn promote(&mut self, index: usize) -> Result<(), StateError> {
        self.check_index(index)?;
        for (position, entry) in self.entries.iter_mut().enumerate() {
            entry.is_primary = position == index;
        }
        Ok(())
    }

    /// Remove a non-primary entry. The list is unchanged on error.
    pub fn remove(
        &mut self,
        index: usize,
    ) -> Result<SecondaryEmailEntry, StateError> {
        self.check_index(index)?;
        if self.entries[index].is_primary {
            return Err(StateError::PrimaryRemoval);
        }
        let removed = self.entries.remove(index);
        self.edited.remove(&removed.id);
        Ok(removed)
    }

    /// Append a row the backend has just created.
    pub fn append_added(&mut self, added: &AddedEmail) -> Result<(), StateError> {
        if added.id.is_placeholder() {
            return Err(StateError::DuplicatePlaceholder);
        }
        if self.find(added.id).is_some() {
            return Err(StateError::DuplicateEntry { id: added.id.get() });
        }
        self.entries.push(SecondaryEmailEntry {
            id: added.id,
            address: added.address.clone(),
            verified_at: None,
            is_primary: false,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use account_model::StoredSecondaryEmail;

    fn stored(id: i64, address: &str) -> SecondaryEmailEntry {
        SecondaryEmailEntry::from_stored(&StoredSecondaryEmail {
            id: EmailId(id),
            address: address.to_string(),
            verified_at: Some(Utc::now()),
        })
    }

    fn sample() -> EditedEmailList {
        EditedEmailList::from_parts(
            "primary@example.com",
            None,
            [stored(1, "one@example.com"), stored(2, "two@example.com")],
        )
    }

    #[test]
    fn placeholder_leads_the_list() {
        let list = sample();
        assert_eq!(list.len(), 3);
        assert!(list.entries()[0].id.is_placeholder());
        assert!(list.entries()[0].is_primary);
        assert_eq!(list.primary_index(), Some(0));
        assert!(list.is_well_formed());
    }

    #[test]
    fn promote_keeps_exactly_one_primary() {
        let mut list = sample();
        list.promote(2).unwrap();
        assert!(list.is_well_formed());
        assert_eq!(list.primary().unwrap().address, "two@example.com");

        list.promote(0).unwrap();
        assert!(list.is_well_formed());
        assert_eq!(list.primary_index(), Some(0));
    }

    #[test]
    fn promote_out_of_range_is_rejected() {
        let mut list = sample();
        assert_eq!(
            list.promote(7),
            Err(StateError::IndexOutOfRange { index: 7, len: 3 })
        );
        assert_eq!(list.primary_index(), Some(0));
    }

    #[test]
    fn removing_the_primary_fails_and_leaves_list_untouched() {
        let mut list = sample();
        let before = list.clone();
        assert_eq!(list.remove(0), Err(StateError::PrimaryRemoval));
        assert_eq!(list, before);

        list.promote(1).unwrap();
        let before = list.clone();
        assert_eq!(list.remove(1), Err(StateError::PrimaryRemoval));
        assert_eq!(list, before);
    }

    #[test]
    fn dirty_indices_follow_entries_across_removal() {
        let mut list = sample();
        list.edit(2, "two-b@example.com").unwrap();
        assert_eq!(list.dirty_indices(), BTreeSet::from([2]));

        list.remove(1).unwrap();
        assert_eq!(list.dirty_indices(), BTreeSet::from([1]));
        assert_eq!(list.get(1).unwrap().address, "two-b@example.com");
        assert!(!list.get(1).unwrap().is_verified());
    }

    #[test]
    fn editing_to_same_address_is_not_dirty() {
        let mut list = sample();
        list.edit(1, "one@example.com").unwrap();
        assert!(list.dirty_indices().is_empty());
    }

    #[test]
    fn append_rejects_known_ids() {
        let mut list = sample();
        list.append_added(&AddedEmail {
            id: EmailId(9),
            address: "nine@example.com".into(),
        })
        .unwrap();
        assert_eq!(list.len(), 4);
        assert!(!list.entries()[3].is_primary);
        assert!(list.entries()[3].verified_at.is_none());

        assert_eq!(
            list.append_added(&AddedEmail {
                id: EmailId(9),
                address: "again@example.com".into(),
            }),
            Err(StateError::DuplicateEntry { id: 9 })
        );
        assert_eq!(
            list.append_added(&AddedEmail {
                id: EmailId::PLACEHOLDER,
                address: "zero@example.com".into(),
            }),
            Err(StateError::DuplicatePlaceholder)
        );
    }

    #[test]
    fn from_entries_rejects_second_placeholder() {
        let entries = vec![
            SecondaryEmailEntry::primary_placeholder("a@example.com", None),
            SecondaryEmailEntry::primary_placeholder("b@example.com", None),
        ];
        assert_eq!(
            EditedEmailList::from_entries(entries),
            Err(StateError::DuplicatePlaceholder)
        );
    }
}
