use thiserror::Error;

/// The backend could not be reached or did not answer with text.
/// Surfaced to the player together with the recovery menu.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("backend returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("request to backend failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend response contained no text")]
    MissingText,
}

/// Raw backend text that cannot be repaired into a turn.
/// Recovered silently with a fallback payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid response shape: {0}")]
    InvalidShape(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("an adventure needs a topic")]
    EmptyTopic,
}
