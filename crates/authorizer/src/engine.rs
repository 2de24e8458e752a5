use std::collections::BTreeMap;

use avatarspace_common::{AssetRef, ItemUid, UserId};
use avatarspace_inventory::{InventoryRegistry, OwnershipChange, OwnershipError, OwnershipRecord};
use avatarspace_markup::{Document, MarkupError};

use crate::descriptor::CharacterDescription;
use crate::proof::EntitlementProof;
use crate::sink::CharacterUpdateSink;

/// Errors from authorization and ownership entry points.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizeError {
    #[error("invalid character markup: {0}")]
    Markup(#[from] MarkupError),
    #[error(transparent)]
    Ownership(#[from] OwnershipError),
    #[error("no inventory record with uid {0}")]
    UnknownItem(ItemUid),
}

/// Reconciles character descriptions against current ownership.
///
/// Owns the inventory registry and the per-user cache of last-known
/// authorized descriptions. All ownership mutations route through the
/// engine, which dispatches the resulting notifications synchronously and
/// in order before the mutating call returns.
pub struct AuthorizationEngine {
    registry: InventoryRegistry,
    characters: BTreeMap<UserId, CharacterDescription>,
    sink: Option<Box<dyn CharacterUpdateSink>>,
}

impl AuthorizationEngine {
    /// Build an engine around an explicit registry instance.
    pub fn new(registry: InventoryRegistry) -> Self {
        Self {
            registry,
            characters: BTreeMap::new(),
            sink: None,
        }
    }

    /// Read-only view of the inventory.
    pub fn registry(&self) -> &InventoryRegistry {
        &self.registry
    }

    /// Add a record to the inventory. Duplicates are logged and ignored by
    /// the registry.
    pub fn register_item(&mut self, record: OwnershipRecord) {
        self.registry.register(record);
    }

    /// Toggle open access on a record. No notification is raised.
    pub fn set_open_access(&mut self, uid: &ItemUid, open_access: bool) -> Result<(), AuthorizeError> {
        let record = self
            .registry
            .lookup_mut(uid)
            .ok_or_else(|| AuthorizeError::UnknownItem(uid.clone()))?;
        record.set_open_access(open_access);
        Ok(())
    }

    /// Register the downstream consumer for corrected descriptions.
    pub fn set_update_sink(&mut self, sink: Box<dyn CharacterUpdateSink>) {
        self.sink = Some(sink);
    }

    /// The user's last-known authorized description, if any.
    pub fn cached_description(&self, user_id: &UserId) -> Option<&CharacterDescription> {
        self.characters.get(user_id)
    }

    /// Eviction hook for session end: drop the user's cached state.
    pub fn evict_user(&mut self, user_id: &UserId) -> Option<CharacterDescription> {
        let evicted = self.characters.remove(user_id);
        if evicted.is_some() {
            tracing::debug!(user = %user_id, "evicted cached character state");
        }
        evicted
    }

    /// Validate a description against current ownership.
    ///
    /// A description without markup is returned unchanged; no parsing is
    /// attempted. Otherwise every node whose asset reference the user may
    /// not use is removed, subtree included, and the rewritten payload is
    /// returned. Either way the result becomes the user's cached state.
    /// Ownership is never mutated here.
    pub fn validate_description(
        &mut self,
        user_id: &UserId,
        description: &CharacterDescription,
    ) -> Result<CharacterDescription, AuthorizeError> {
        let Some(markup) = &description.character_markup else {
            self.characters
                .insert(user_id.clone(), description.clone());
            return Ok(description.clone());
        };

        let mut document = Document::parse(markup)?;
        let removed = document.retain_references(|src| {
            self.registry.can_use(user_id, &AssetRef::from(src))
        });
        if removed > 0 {
            tracing::warn!(
                user = %user_id,
                removed,
                "removed unauthorized asset references from character"
            );
        }
        let validated = CharacterDescription::from_markup(document.to_markup());
        self.characters.insert(user_id.clone(), validated.clone());
        Ok(validated)
    }

    /// Grant ownership of an item to a user.
    pub fn grant(&mut self, uid: &ItemUid, user_id: &UserId) -> Result<(), AuthorizeError> {
        let record = self
            .registry
            .lookup_mut(uid)
            .ok_or_else(|| AuthorizeError::UnknownItem(uid.clone()))?;
        let changes: Vec<_> = record.add_owner(user_id)?.into_iter().collect();
        self.dispatch_changes(changes);
        Ok(())
    }

    /// Revoke a user's ownership of an item.
    pub fn revoke(&mut self, uid: &ItemUid, user_id: &UserId) -> Result<(), AuthorizeError> {
        let record = self
            .registry
            .lookup_mut(uid)
            .ok_or_else(|| AuthorizeError::UnknownItem(uid.clone()))?;
        let changes: Vec<_> = record.remove_owner(user_id).into_iter().collect();
        self.dispatch_changes(changes);
        Ok(())
    }

    /// Transfer an item to a user, displacing current owners when unique.
    pub fn transfer(&mut self, uid: &ItemUid, user_id: &UserId) -> Result<(), AuthorizeError> {
        let record = self
            .registry
            .lookup_mut(uid)
            .ok_or_else(|| AuthorizeError::UnknownItem(uid.clone()))?;
        let changes = record.transfer_ownership(user_id)?;
        self.dispatch_changes(changes);
        Ok(())
    }

    /// Grant ownership of every record an externally verified proof unlocks.
    ///
    /// Idempotent: references the user already explicitly owns are skipped,
    /// so repeating a provision emits no events. Unique items route through
    /// a transfer, non-unique through a plain add, keeping the uniqueness
    /// invariant enforced in one place. Unknown references are logged and
    /// skipped.
    pub fn provision(
        &mut self,
        user_id: &UserId,
        proof: &dyn EntitlementProof,
    ) -> Result<(), AuthorizeError> {
        for reference in proof.entitled_references() {
            let Some(record) = self.registry.lookup_by_reference_mut(&reference) else {
                tracing::warn!(reference = %reference, "provisioned reference has no inventory record");
                continue;
            };
            if record.owners().contains(user_id) {
                continue;
            }
            let changes = if record.unique_item() {
                record.transfer_ownership(user_id)?
            } else {
                record.add_owner(user_id)?.into_iter().collect()
            };
            tracing::info!(user = %user_id, reference = %reference, "provisioned inventory item");
            self.dispatch_changes(changes);
        }
        Ok(())
    }

    fn dispatch_changes(&mut self, changes: Vec<OwnershipChange>) {
        for change in changes {
            self.handle_ownership_change(change.user_id().clone(), change.uid().clone());
        }
    }

    /// React to one owner-set mutation.
    ///
    /// Only a removal triggers enforcement: the user's cached description is
    /// re-validated and, if it changed, pushed to the sink. A grant takes
    /// effect the next time the user's description is validated.
    fn handle_ownership_change(&mut self, user_id: UserId, uid: ItemUid) {
        let Some(record) = self.registry.lookup(&uid) else {
            return;
        };
        if record.is_owner(&user_id) {
            return;
        }
        tracing::info!(user = %user_id, uid = %uid, "ownership removed; re-validating character");

        let Some(previous) = self.characters.get(&user_id).cloned() else {
            tracing::debug!(user = %user_id, "no cached character to re-validate");
            return;
        };
        let corrected = match self.validate_description(&user_id, &previous) {
            Ok(corrected) => corrected,
            Err(err) => {
                tracing::error!(user = %user_id, %err, "re-validation of cached character failed");
                return;
            }
        };
        if corrected == previous {
            return;
        }
        match self.sink.as_deref_mut() {
            Some(sink) => sink.push_corrected_description(&user_id, &corrected),
            None => {
                tracing::warn!(
                    user = %user_id,
                    "no update sink registered; corrected description cached only"
                );
            }
        }
    }
}
