//! Inventory: per-asset ownership records and the process-wide registry.
//!
//! # Invariants
//! - A unique item has at most one owner at every observable point; the
//!   check happens before any mutation is applied.
//! - Every owner-set mutation yields one `OwnershipChange` per affected
//!   user, in mutation order. Records hold no listener references; the
//!   caller dispatches the returned changes.
//! - Registration never replaces an existing record.

pub mod record;
pub mod registry;

pub use record::{OwnershipChange, OwnershipError, OwnershipRecord};
pub use registry::InventoryRegistry;

pub fn crate_info() -> &'static str {
    "avatarspace-inventory v0.1.0"
}
