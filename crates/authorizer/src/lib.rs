//! Authorization: reconciling character descriptions against current asset
//! ownership and pushing corrections to downstream consumers.
//!
//! # Invariants
//! - Validation never mutates ownership state; it only rewrites the
//!   description and the per-user cache.
//! - Ownership mutations and the notifications they trigger complete
//!   synchronously before the mutating call returns.
//! - A failing or missing update sink never rolls back an applied mutation;
//!   the corrected description is always retained in the cache.

pub mod descriptor;
pub mod engine;
pub mod proof;
pub mod sink;

pub use descriptor::CharacterDescription;
pub use engine::{AuthorizationEngine, AuthorizeError};
pub use proof::{EntitlementProof, StaticEntitlement};
pub use sink::{CharacterUpdateSink, RecordingSink};

pub fn crate_info() -> &'static str {
    "avatarspace-authorizer v0.1.0"
}
