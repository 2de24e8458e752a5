//! Element-tree document model for character description markup.
//!
//! Character descriptions carry a markup payload of nested elements whose
//! `src` attributes reference visual assets. This crate parses that payload
//! into an owned tree, visits and prunes asset references, and serializes
//! the tree back: the narrow surface the authorization engine needs,
//! independent of any particular markup dialect.
//!
//! # Invariants
//! - Serialization of an unmodified parse is stable: parse(to_markup(d))
//!   yields the same tree.
//! - Pruning a node removes its entire subtree.

mod builder;
mod document;
mod parser;

pub use builder::{CHARACTER_TAG, CharacterBuilder, MODEL_TAG};
pub use document::{Child, Document, Node, SRC_ATTRIBUTE};
pub use parser::MarkupError;

pub fn crate_info() -> &'static str {
    "avatarspace-markup v0.1.0"
}
