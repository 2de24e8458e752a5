use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire-level session identifier carried by avatar updates.
///
/// Assigned by the session host on connect; distinct from [`UserId`], which
/// survives reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u16);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of a user across the session lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity of an inventory record.
///
/// Derived with precedence: explicit id > asset reference > random fallback
/// (see `avatarspace-inventory`). Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemUid(pub String);

impl ItemUid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Random fallback uid for records constructed without an explicit id
    /// or asset reference.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&str> for ItemUid {
    fn from(uid: &str) -> Self {
        Self(uid.to_string())
    }
}

impl std::fmt::Display for ItemUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a visual asset, e.g. a model path like `/assets/models/hat.glb`.
///
/// Carried by `src` attributes in character markup and used for reverse
/// lookup in the inventory registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetRef(pub String);

impl AssetRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }
}

impl From<&str> for AssetRef {
    fn from(reference: &str) -> Self {
        Self(reference.to_string())
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named animation states with their wire values.
///
/// The wire format transmits the state as a raw `u8` and never rejects
/// unknown values; this enum is for consumers that want names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AnimationState {
    Idle = 0,
    Walking = 1,
    Running = 2,
    JumpingToAir = 3,
}

/// Error for wire values with no named animation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown animation state value {0}")]
pub struct UnknownAnimationState(pub u8);

impl AnimationState {
    /// Wire value of this state.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for AnimationState {
    type Error = UnknownAnimationState;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Idle),
            1 => Ok(Self::Walking),
            2 => Ok(Self::Running),
            3 => Ok(Self::JumpingToAir),
            other => Err(UnknownAnimationState(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_uids_are_unique() {
        let a = ItemUid::generate();
        let b = ItemUid::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn user_id_from_str() {
        let id = UserId::from("alice");
        assert_eq!(id.to_string(), "alice");
    }

    #[test]
    fn animation_state_roundtrip() {
        for state in [
            AnimationState::Idle,
            AnimationState::Walking,
            AnimationState::Running,
            AnimationState::JumpingToAir,
        ] {
            assert_eq!(AnimationState::try_from(state.as_u8()), Ok(state));
        }
    }

    #[test]
    fn unknown_animation_state_is_an_error() {
        let err = AnimationState::try_from(200).unwrap_err();
        assert_eq!(err, UnknownAnimationState(200));
    }

    #[test]
    fn asset_ref_orders_deterministically() {
        let mut refs = vec![AssetRef::from("/b.glb"), AssetRef::from("/a.glb")];
        refs.sort();
        assert_eq!(refs[0], AssetRef::from("/a.glb"));
    }
}
