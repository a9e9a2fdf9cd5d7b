use crate::engine::orchestrator::{ConnectivityTicket, Generation, TurnTicket};
use crate::model::session::SessionState;
use crate::model::turn::Choice;

pub enum EngineCommand {
    StartSession(String),
    TakeTurn(String),
    SelectChoice(Choice),
    Restart,
    UpdateCredential(String),
    CheckConnectivity,

    /// Posted by a worker thread when its backend call returns.
    GenerationFinished {
        ticket: TurnTicket,
        generation: Generation,
    },

    /// Posted by a worker thread when a connectivity check returns.
    ConnectivityChecked {
        ticket: ConnectivityTicket,
        ok: bool,
    },

    Shutdown,
}

#[derive(Debug)]
pub enum EngineResponse {
    SessionUpdated(SessionState),
    CredentialRequested,
    Rejected(String),
}
