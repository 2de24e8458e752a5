//! Shared types for the avatarspace workspace.
//!
//! # Invariants
//! - Identifier newtypes are cheap to clone and order deterministically
//!   (usable as `BTreeMap`/`BTreeSet` keys).
//! - Wire-facing values keep their raw representation; naming is additive.

pub mod types;

pub use types::{AnimationState, AssetRef, ItemUid, SessionId, UnknownAnimationState, UserId};
