use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Narrator,
    User,
    System,
    Error,
}

impl MessageKind {
    pub fn label(self) -> &'static str {
        match self {
            MessageKind::Narrator => "Narrator",
            MessageKind::User => "User",
            MessageKind::System => "System",
            MessageKind::Error => "Error",
        }
    }
}

/// A transcript line. Fields are private so a message cannot change after
/// it has been appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    kind: MessageKind,
    text: String,
    created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn narrator(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Narrator, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageKind::User, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageKind::System, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
