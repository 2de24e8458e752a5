use avatarspace_common::AssetRef;

/// Externally verified evidence that a user is entitled to a set of assets.
///
/// Verification of the credential itself (a signed token, a passphrase, an
/// entitlement-service lookup) happens before the engine is involved; the
/// engine only asks which asset references the proof unlocks.
pub trait EntitlementProof {
    fn entitled_references(&self) -> Vec<AssetRef>;
}

/// A fixed list of entitled references, for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEntitlement {
    references: Vec<AssetRef>,
}

impl StaticEntitlement {
    pub fn new(references: impl IntoIterator<Item = AssetRef>) -> Self {
        Self {
            references: references.into_iter().collect(),
        }
    }

    pub fn single(reference: impl Into<AssetRef>) -> Self {
        Self {
            references: vec![reference.into()],
        }
    }
}

impl EntitlementProof for StaticEntitlement {
    fn entitled_references(&self) -> Vec<AssetRef> {
        self.references.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_entitlement_reports_its_references() {
        let proof = StaticEntitlement::new([AssetRef::from("/hat.glb"), AssetRef::from("/cape.glb")]);
        assert_eq!(
            proof.entitled_references(),
            vec![AssetRef::from("/hat.glb"), AssetRef::from("/cape.glb")]
        );
    }
}
