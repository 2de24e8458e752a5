use serde::{Deserialize, Serialize};

/// A user's character record as exchanged with clients.
///
/// The markup payload is opaque at this level; a record without one is
/// trivially authorized. Replaced wholesale whenever re-validation produces
/// a different result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDescription {
    /// Markup describing the character's composition, when present.
    #[serde(
        rename = "characterDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub character_markup: Option<String>,
}

impl CharacterDescription {
    /// A description with no markup payload.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_markup(markup: impl Into<String>) -> Self {
        Self {
            character_markup: Some(markup.into()),
        }
    }

    pub fn has_markup(&self) -> bool {
        self.character_markup.is_some()
    }
}
