use std::collections::BTreeMap;

use avatarspace_common::{AssetRef, ItemUid, UserId};

use crate::record::OwnershipRecord;

/// Lookup of ownership records by uid and, via the asset reference, in
/// reverse.
///
/// An explicit instance owned by the authorization engine; there is no
/// process-wide singleton, so tests build isolated registries. Uses
/// `BTreeMap` for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct InventoryRegistry {
    records: BTreeMap<ItemUid, OwnershipRecord>,
    by_reference: BTreeMap<AssetRef, ItemUid>,
}

impl InventoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record. A duplicate uid is logged and ignored, never
    /// replaced; registration is not transactional.
    pub fn register(&mut self, record: OwnershipRecord) {
        if self.records.contains_key(record.uid()) {
            tracing::warn!(uid = %record.uid(), "ignoring duplicate inventory registration");
            return;
        }
        if let Some(reference) = record.asset_reference() {
            if self.by_reference.contains_key(reference) {
                tracing::warn!(
                    uid = %record.uid(),
                    reference = %reference,
                    "asset reference already mapped; keeping the first record"
                );
            } else {
                self.by_reference
                    .insert(reference.clone(), record.uid().clone());
            }
        }
        self.records.insert(record.uid().clone(), record);
    }

    pub fn lookup(&self, uid: &ItemUid) -> Option<&OwnershipRecord> {
        self.records.get(uid)
    }

    pub fn lookup_mut(&mut self, uid: &ItemUid) -> Option<&mut OwnershipRecord> {
        self.records.get_mut(uid)
    }

    /// Find the record associated with an asset reference.
    pub fn lookup_by_reference(&self, reference: &AssetRef) -> Option<&OwnershipRecord> {
        let uid = self.by_reference.get(reference)?;
        self.records.get(uid)
    }

    pub fn lookup_by_reference_mut(&mut self, reference: &AssetRef) -> Option<&mut OwnershipRecord> {
        let uid = self.by_reference.get(reference)?;
        self.records.get_mut(uid)
    }

    /// Whether `user_id` may use the asset behind `reference`.
    ///
    /// False when no record matches; otherwise delegates to
    /// [`OwnershipRecord::is_owner`]. Denials are logged.
    pub fn can_use(&self, user_id: &UserId, reference: &AssetRef) -> bool {
        match self.lookup_by_reference(reference) {
            Some(record) => {
                let authorized = record.is_owner(user_id);
                if !authorized {
                    tracing::warn!(user = %user_id, reference = %reference, "user is not an owner");
                }
                authorized
            }
            None => false,
        }
    }

    /// All records in uid order.
    pub fn records(&self) -> impl Iterator<Item = &OwnershipRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
