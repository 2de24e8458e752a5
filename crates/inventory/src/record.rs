use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use avatarspace_common::{AssetRef, ItemUid, UserId};

/// A single owner-set mutation, reported in the order mutations occurred.
///
/// Handlers may re-enter `is_owner` on this or other records; the mutation
/// is fully applied before changes are handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipChange {
    OwnerAdded { uid: ItemUid, user_id: UserId },
    OwnerRemoved { uid: ItemUid, user_id: UserId },
}

impl OwnershipChange {
    pub fn uid(&self) -> &ItemUid {
        match self {
            Self::OwnerAdded { uid, .. } | Self::OwnerRemoved { uid, .. } => uid,
        }
    }

    pub fn user_id(&self) -> &UserId {
        match self {
            Self::OwnerAdded { user_id, .. } | Self::OwnerRemoved { user_id, .. } => user_id,
        }
    }
}

/// Errors from ownership mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnershipError {
    /// A unique item already has an owner. The caller must remove the
    /// existing owner (or use a transfer) before adding another.
    #[error("unique item {uid} is already owned")]
    AlreadyOwned { uid: ItemUid },
}

/// Ownership state of one inventory-eligible asset.
///
/// Created at system initialization or when new inventory is provisioned;
/// lives for the process lifetime; mutated only through the operations
/// below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipRecord {
    uid: ItemUid,
    asset_reference: Option<AssetRef>,
    unique_item: bool,
    open_access: bool,
    owners: BTreeSet<UserId>,
}

impl OwnershipRecord {
    /// Create a record. The uid is the explicit id when given, else the
    /// asset reference string, else a random fallback; it never changes
    /// afterwards.
    pub fn new(id: Option<ItemUid>, asset_reference: Option<AssetRef>, unique_item: bool) -> Self {
        let uid = match (&id, &asset_reference) {
            (Some(id), _) => id.clone(),
            (None, Some(reference)) => ItemUid::new(reference.0.clone()),
            (None, None) => ItemUid::generate(),
        };
        Self {
            uid,
            asset_reference,
            unique_item,
            open_access: false,
            owners: BTreeSet::new(),
        }
    }

    /// Shorthand for the common case: a record identified by its asset
    /// reference.
    pub fn for_asset(reference: impl Into<AssetRef>, unique_item: bool) -> Self {
        Self::new(None, Some(reference.into()), unique_item)
    }

    pub fn uid(&self) -> &ItemUid {
        &self.uid
    }

    pub fn asset_reference(&self) -> Option<&AssetRef> {
        self.asset_reference.as_ref()
    }

    pub fn unique_item(&self) -> bool {
        self.unique_item
    }

    pub fn open_access(&self) -> bool {
        self.open_access
    }

    /// The explicit owner set. Open access is not reflected here.
    pub fn owners(&self) -> &BTreeSet<UserId> {
        &self.owners
    }

    /// True if the user is an explicit owner, or the record is open access
    /// and not unique.
    pub fn is_owner(&self, user_id: &UserId) -> bool {
        self.owners.contains(user_id) || (!self.unique_item && self.open_access)
    }

    /// Grant universal use of a non-unique record. No notification.
    pub fn set_open_access(&mut self, open_access: bool) {
        self.open_access = open_access;
    }

    /// Add an owner.
    ///
    /// A unique item that already has an owner fails with
    /// [`OwnershipError::AlreadyOwned`] before any mutation. Otherwise
    /// idempotent: adding a present owner is a no-op with no change.
    pub fn add_owner(&mut self, user_id: &UserId) -> Result<Option<OwnershipChange>, OwnershipError> {
        if self.unique_item && !self.owners.is_empty() {
            return Err(OwnershipError::AlreadyOwned {
                uid: self.uid.clone(),
            });
        }
        if !self.owners.insert(user_id.clone()) {
            return Ok(None);
        }
        Ok(Some(OwnershipChange::OwnerAdded {
            uid: self.uid.clone(),
            user_id: user_id.clone(),
        }))
    }

    /// Remove an owner. Idempotent: removing an absent owner is a no-op
    /// with no change.
    pub fn remove_owner(&mut self, user_id: &UserId) -> Option<OwnershipChange> {
        if !self.owners.remove(user_id) {
            return None;
        }
        Some(OwnershipChange::OwnerRemoved {
            uid: self.uid.clone(),
            user_id: user_id.clone(),
        })
    }

    /// Make `user_id` an owner, displacing every current owner when the
    /// record is unique.
    ///
    /// The owner set is snapshotted before any removal, so the removal
    /// sequence is fixed up front; changes come out as N removals followed
    /// by one addition. On a non-unique record this is `add_owner` without
    /// displacing anyone.
    pub fn transfer_ownership(
        &mut self,
        user_id: &UserId,
    ) -> Result<Vec<OwnershipChange>, OwnershipError> {
        let mut changes = Vec::new();
        if self.unique_item {
            let current: Vec<UserId> = self.owners.iter().cloned().collect();
            for owner in &current {
                changes.extend(self.remove_owner(owner));
            }
        }
        changes.extend(self.add_owner(user_id)?);
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserId {
        UserId::from(name)
    }

    #[test]
    fn uid_precedence_explicit_id_first() {
        let record = OwnershipRecord::new(
            Some(ItemUid::from("hat-001")),
            Some(AssetRef::from("/hat.glb")),
            true,
        );
        assert_eq!(record.uid(), &ItemUid::from("hat-001"));
    }

    #[test]
    fn uid_precedence_falls_back_to_reference() {
        let record = OwnershipRecord::for_asset("/hat.glb", false);
        assert_eq!(record.uid(), &ItemUid::from("/hat.glb"));
    }

    #[test]
    fn uid_precedence_random_fallback() {
        let a = OwnershipRecord::new(None, None, false);
        let b = OwnershipRecord::new(None, None, false);
        assert_ne!(a.uid(), b.uid());
    }

    #[test]
    fn add_owner_is_idempotent() {
        let mut record = OwnershipRecord::for_asset("/bot.glb", false);
        let first = record.add_owner(&user("alice")).unwrap();
        assert!(first.is_some());
        let second = record.add_owner(&user("alice")).unwrap();
        assert!(second.is_none());
        assert_eq!(record.owners().len(), 1);
    }

    #[test]
    fn remove_absent_owner_is_a_noop() {
        let mut record = OwnershipRecord::for_asset("/bot.glb", false);
        assert!(record.remove_owner(&user("alice")).is_none());
    }

    #[test]
    fn unique_item_rejects_second_owner() {
        let mut record = OwnershipRecord::for_asset("/hat.glb", true);
        record.add_owner(&user("alice")).unwrap();
        let err = record.add_owner(&user("bob")).unwrap_err();
        assert_eq!(
            err,
            OwnershipError::AlreadyOwned {
                uid: ItemUid::from("/hat.glb"),
            }
        );
        // No mutation happened.
        assert!(record.is_owner(&user("alice")));
        assert!(!record.is_owner(&user("bob")));
    }

    #[test]
    fn unique_invariant_holds_across_sequences() {
        let mut record = OwnershipRecord::for_asset("/hat.glb", true);
        record.add_owner(&user("alice")).unwrap();
        assert!(record.owners().len() <= 1);
        record.transfer_ownership(&user("bob")).unwrap();
        assert!(record.owners().len() <= 1);
        assert!(record.add_owner(&user("carol")).is_err());
        assert!(record.owners().len() <= 1);
        record.transfer_ownership(&user("carol")).unwrap();
        assert!(record.owners().len() <= 1);
        assert!(record.is_owner(&user("carol")));
    }

    #[test]
    fn transfer_emits_removal_then_addition() {
        let mut record = OwnershipRecord::for_asset("/hat.glb", true);
        record.add_owner(&user("alice")).unwrap();

        let changes = record.transfer_ownership(&user("bob")).unwrap();
        assert_eq!(
            changes,
            vec![
                OwnershipChange::OwnerRemoved {
                    uid: ItemUid::from("/hat.glb"),
                    user_id: user("alice"),
                },
                OwnershipChange::OwnerAdded {
                    uid: ItemUid::from("/hat.glb"),
                    user_id: user("bob"),
                },
            ]
        );
        assert!(!record.is_owner(&user("alice")));
        assert!(record.is_owner(&user("bob")));
    }

    #[test]
    fn transfer_on_empty_unique_record_just_adds() {
        let mut record = OwnershipRecord::for_asset("/hat.glb", true);
        let changes = record.transfer_ownership(&user("alice")).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(matches!(changes[0], OwnershipChange::OwnerAdded { .. }));
    }

    #[test]
    fn transfer_on_non_unique_record_displaces_nobody() {
        let mut record = OwnershipRecord::for_asset("/bot.glb", false);
        record.add_owner(&user("alice")).unwrap();
        let changes = record.transfer_ownership(&user("bob")).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(record.is_owner(&user("alice")));
        assert!(record.is_owner(&user("bob")));
    }

    #[test]
    fn open_access_authorizes_everyone_on_non_unique() {
        let mut record = OwnershipRecord::for_asset("/bot.glb", false);
        record.set_open_access(true);
        assert!(record.is_owner(&user("anyone")));
        assert!(record.owners().is_empty());

        record.set_open_access(false);
        assert!(!record.is_owner(&user("anyone")));
    }

    #[test]
    fn open_access_never_applies_to_unique_items() {
        let mut record = OwnershipRecord::for_asset("/hat.glb", true);
        record.set_open_access(true);
        assert!(!record.is_owner(&user("anyone")));
    }
}
