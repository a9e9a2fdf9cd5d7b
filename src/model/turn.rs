use serde::{Deserialize, Serialize};

/// Number of choices every turn ends with.
pub const CHOICE_COUNT: usize = 4;

/// Longest story, in characters, that survives normalization untouched.
pub const MAX_STORY_CHARS: usize = 400;

/// Longest choice label, in characters, that survives normalization untouched.
pub const MAX_CHOICE_CHARS: usize = 35;

/// Id prefix reserved for locally generated recovery choices.
/// Backend-supplied ids never carry it.
pub const RESERVED_ID_PREFIX: &str = "recovery:";

/// One validated story beat plus the options offered to the player.
/// Produced by the normalizer or the fallback pool, never by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPayload {
    pub story: String,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
}

impl Choice {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

impl TurnPayload {
    /// True when the payload can be rendered as-is: non-empty story within
    /// the length cap and exactly four short choices.
    pub fn is_conformant(&self) -> bool {
        !self.story.trim().is_empty()
            && self.story.chars().count() <= MAX_STORY_CHARS
            && self.choices.len() == CHOICE_COUNT
            && self
                .choices
                .iter()
                .all(|c| !c.text.is_empty() && c.text.chars().count() <= MAX_CHOICE_CHARS)
    }

    /// Case-insensitive check for stories that announce the game is running
    /// without the backend.
    pub fn signals_offline(&self) -> bool {
        let story = self.story.to_lowercase();
        ["offline", "fallback", "demo mode"]
            .iter()
            .any(|marker| story.contains(marker))
    }
}
