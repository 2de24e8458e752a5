use crate::document::{Child, Document, Node, SRC_ATTRIBUTE};

/// Tag for the character root element.
pub const CHARACTER_TAG: &str = "m-character";

/// Tag for a model part element.
pub const MODEL_TAG: &str = "m-model";

/// Assembles a character description document from part references.
///
/// With a base reference, parts nest under a single character root; without
/// one, parts stand alone at the top level.
#[derive(Debug, Clone, Default)]
pub struct CharacterBuilder {
    base: Option<String>,
    parts: Vec<String>,
}

impl CharacterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base character model reference.
    pub fn base(mut self, src: impl Into<String>) -> Self {
        self.base = Some(src.into());
        self
    }

    /// Append a part model reference.
    pub fn part(mut self, src: impl Into<String>) -> Self {
        self.parts.push(src.into());
        self
    }

    /// Build the document tree.
    pub fn build(self) -> Document {
        let parts = self
            .parts
            .into_iter()
            .map(|src| Child::Element(Node::new(MODEL_TAG).with_attribute(SRC_ATTRIBUTE, src)));
        let children = match self.base {
            Some(base) => {
                let mut root = Node::new(CHARACTER_TAG).with_attribute(SRC_ATTRIBUTE, base);
                root.children = parts.collect();
                vec![Child::Element(root)]
            }
            None => parts.collect(),
        };
        Document { children }
    }

    /// Build and serialize in one step.
    pub fn build_markup(self) -> String {
        self.build().to_markup()
    }
}
