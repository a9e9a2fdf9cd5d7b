use serde::{Deserialize, Serialize};

use crate::model::history::HistoryBuffer;
use crate::model::message::Message;
use crate::model::turn::Choice;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Live,
    Fallback,
}

/// Everything the UI renders for one adventure.
/// Mutated by the orchestrator only; a restart replaces it wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub transcript: Vec<Message>,
    pub history: HistoryBuffer,
    pub topic: String,
    pub choices: Vec<Choice>,
    pub awaiting_response: bool,
    pub mode: Mode,

    /// Set by "Continue with demo mode"; turns skip the backend until a
    /// connectivity check succeeds.
    pub demo_mode: bool,

    pub last_error: Option<String>,
}

impl SessionState {
    pub fn has_started(&self) -> bool {
        !self.topic.is_empty()
    }
}
