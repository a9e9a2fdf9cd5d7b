//! Per-turn coordination between the prompt builder, the backend, the
//! normalizer and the fallback pool.
//!
//! A turn is split in three so the network call can run off the thread that
//! owns the session: [`TurnOrchestrator::begin_turn`] closes the gate and
//! produces a [`TurnTicket`], [`dispatch`] performs the call, and
//! [`TurnOrchestrator::complete_turn`] applies the result. Tickets carry the
//! session generation they were issued under; results for an older
//! generation are dropped.
//!
//! Connectivity checks follow the same pattern with a [`ConnectivityTicket`].
//! Only the most recently issued check may change the mode, and a result that
//! lands while a turn is in flight is held until that turn completes.

use std::sync::Arc;

use crate::engine::error::{SessionError, TransportError};
use crate::engine::fallback::FallbackProvider;
use crate::engine::llm_client::TextGenerator;
use crate::engine::prompt_builder::{PromptBuilder, PROMPT_HISTORY_ENTRIES};
use crate::engine::response_normalizer;
use crate::model::config::{ConfigUpdate, CredentialStatus};
use crate::model::history::HistoryEntry;
use crate::model::message::Message;
use crate::model::session::{Mode, SessionState};
use crate::model::turn::{Choice, TurnPayload, RESERVED_ID_PREFIX};

/// Reserved id prefix for recovery-menu choices.
pub const RECOVERY_PREFIX: &str = RESERVED_ID_PREFIX;

/// Action recorded for the opening turn of a session.
pub const OPENING_ACTION: &str = "Begin the adventure";

/// Synthetic action issued when the player opts into demo mode.
pub const DEMO_CONTINUE_ACTION: &str = "Continue the adventure";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    TryAgain,
    Restart,
    DemoMode,
    UpdateSettings,
}

impl RecoveryAction {
    pub const ALL: [RecoveryAction; 4] = [
        RecoveryAction::TryAgain,
        RecoveryAction::Restart,
        RecoveryAction::DemoMode,
        RecoveryAction::UpdateSettings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RecoveryAction::TryAgain => "Try again",
            RecoveryAction::Restart => "Restart adventure",
            RecoveryAction::DemoMode => "Continue with demo mode",
            RecoveryAction::UpdateSettings => "Update API settings",
        }
    }

    fn key(self) -> &'static str {
        match self {
            RecoveryAction::TryAgain => "retry",
            RecoveryAction::Restart => "restart",
            RecoveryAction::DemoMode => "demo",
            RecoveryAction::UpdateSettings => "settings",
        }
    }

    pub fn choice(self) -> Choice {
        Choice::new(format!("{RECOVERY_PREFIX}{}", self.key()), self.label())
    }

    /// Matches on the choice id, never on the display text.
    pub fn from_choice(choice: &Choice) -> Option<Self> {
        let key = choice.id.strip_prefix(RECOVERY_PREFIX)?;
        Self::ALL.into_iter().find(|action| action.key() == key)
    }

    pub fn menu() -> Vec<Choice> {
        Self::ALL.into_iter().map(Self::choice).collect()
    }
}

/// Everything needed to run one backend call for a turn.
#[derive(Debug, Clone)]
pub struct TurnTicket {
    pub session: u64,
    pub action: String,
    pub is_first_turn: bool,
    pub prompt: String,

    /// Serve from the fallback pool without touching the network.
    pub offline: bool,
}

#[derive(Debug)]
pub enum Generation {
    Completed(String),
    Failed(TransportError),
    Offline,
}

/// Run the backend call for a ticket. Safe to call from any thread.
pub fn dispatch(client: &dyn TextGenerator, ticket: &TurnTicket) -> Generation {
    if ticket.offline {
        return Generation::Offline;
    }

    match client.generate(&ticket.prompt) {
        Ok(text) => Generation::Completed(text),
        Err(e) => Generation::Failed(e),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    Backend,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct TurnReport {
    pub payload: TurnPayload,
    pub source: PayloadSource,

    /// The choice set now offered; the recovery menu after a transport failure.
    pub choices: Vec<Choice>,
}

/// Identifies one connectivity check. `seq` increases with every check issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityTicket {
    pub session: u64,
    pub seq: u64,
}

#[derive(Debug)]
pub enum ChoiceRoute {
    Turn(TurnTicket),
    Restarted,
    CredentialRequested,
    Busy,
    Ignored,
}

impl From<Option<TurnTicket>> for ChoiceRoute {
    fn from(ticket: Option<TurnTicket>) -> Self {
        ticket.map_or(ChoiceRoute::Busy, ChoiceRoute::Turn)
    }
}

pub struct TurnOrchestrator {
    client: Arc<dyn TextGenerator>,
    fallback: FallbackProvider,
    state: SessionState,
    session: u64,
    last_turn: Option<(String, bool)>,
    connectivity_seq: u64,
    deferred_connectivity: Option<bool>,
}

impl TurnOrchestrator {
    pub fn new(client: Arc<dyn TextGenerator>, fallback: FallbackProvider) -> Self {
        Self {
            client,
            fallback,
            state: SessionState::default(),
            session: 0,
            last_turn: None,
            connectivity_seq: 0,
            deferred_connectivity: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn client(&self) -> Arc<dyn TextGenerator> {
        Arc::clone(&self.client)
    }

    /// Generation counter; bumped by every restart.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Reset, then open the first turn for `topic`.
    pub fn start_session(&mut self, topic: &str) -> Result<TurnTicket, SessionError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SessionError::EmptyTopic);
        }

        self.reset();
        self.state.topic = topic.to_string();
        self.state.mode = match self.client.credential_status() {
            CredentialStatus::Valid => Mode::Live,
            CredentialStatus::Unconfigured => Mode::Fallback,
        };

        log::info!(
            "Starting adventure \"{}\" in {:?} mode",
            self.state.topic,
            self.state.mode
        );

        Ok(self.open_turn(OPENING_ACTION, true, false))
    }

    pub fn restart(&mut self) {
        log::info!("Restarting adventure");
        self.reset();
    }

    /// Returns `None` while a turn is in flight.
    pub fn begin_turn(&mut self, action: &str, is_first_turn: bool) -> Option<TurnTicket> {
        if self.state.awaiting_response {
            log::debug!("Turn rejected, still awaiting a response");
            return None;
        }

        Some(self.open_turn(action, is_first_turn, false))
    }

    /// Apply a finished call. Returns `None` for stale tickets.
    pub fn complete_turn(
        &mut self,
        ticket: TurnTicket,
        generation: Generation,
    ) -> Option<TurnReport> {
        if ticket.session != self.session || !self.state.awaiting_response {
            log::warn!(
                "Dropping result for session {} (current {})",
                ticket.session,
                self.session
            );
            return None;
        }

        let (payload, source, choices) = match generation {
            Generation::Completed(raw) => match response_normalizer::normalize(&raw) {
                Ok(payload) => {
                    if self.state.mode == Mode::Fallback && payload.signals_offline() {
                        self.state.transcript.push(Message::system(
                            "The story is still running offline. Choose \"Update API settings\" to reconnect.",
                        ));
                    }
                    let choices = payload.choices.clone();
                    (payload, PayloadSource::Backend, choices)
                }
                Err(e) => {
                    log::warn!("Backend reply rejected: {e}");
                    self.enter_fallback();
                    let payload = self.fallback.next();
                    let choices = payload.choices.clone();
                    (payload, PayloadSource::Fallback, choices)
                }
            },
            Generation::Failed(e) => {
                log::warn!("Backend call failed: {e}");
                self.enter_fallback();
                self.state.last_error = Some(e.to_string());
                self.state.transcript.push(Message::error(format!(
                    "Could not reach the story backend: {e}"
                )));
                (
                    self.fallback.next(),
                    PayloadSource::Fallback,
                    RecoveryAction::menu(),
                )
            }
            Generation::Offline => {
                self.enter_fallback();
                let payload = self.fallback.next();
                let choices = payload.choices.clone();
                (payload, PayloadSource::Fallback, choices)
            }
        };

        self.state
            .transcript
            .push(Message::narrator(payload.story.clone()));

        if !ticket.is_first_turn {
            self.state
                .history
                .push(HistoryEntry::new(ticket.action, payload.story.clone()));
        }

        self.state.choices = choices.clone();
        self.state.awaiting_response = false;

        if let Some(ok) = self.deferred_connectivity.take() {
            self.settle_connectivity(ok);
        }

        Some(TurnReport {
            payload,
            source,
            choices,
        })
    }

    /// Blocking turn: begin, call the backend on this thread, complete.
    pub fn take_turn(&mut self, action: &str, is_first_turn: bool) -> Option<TurnReport> {
        let ticket = self.begin_turn(action, is_first_turn)?;
        self.run(ticket)
    }

    pub fn run(&mut self, ticket: TurnTicket) -> Option<TurnReport> {
        let generation = dispatch(self.client.as_ref(), &ticket);
        self.complete_turn(ticket, generation)
    }

    /// Route a selected choice; recovery-menu entries are handled here,
    /// anything else becomes the next player action.
    pub fn select_choice(&mut self, choice: &Choice) -> ChoiceRoute {
        match RecoveryAction::from_choice(choice) {
            Some(RecoveryAction::TryAgain) => match self.last_turn.clone() {
                Some(_) if self.state.awaiting_response => ChoiceRoute::Busy,
                Some((action, is_first_turn)) => {
                    ChoiceRoute::Turn(self.open_turn(&action, is_first_turn, true))
                }
                None => ChoiceRoute::Ignored,
            },
            Some(RecoveryAction::Restart) => {
                self.restart();
                ChoiceRoute::Restarted
            }
            Some(RecoveryAction::DemoMode) => {
                if self.state.awaiting_response {
                    return ChoiceRoute::Busy;
                }
                log::info!("Switching to demo mode");
                self.state.demo_mode = true;
                self.state.mode = Mode::Fallback;
                self.begin_turn(DEMO_CONTINUE_ACTION, false).into()
            }
            Some(RecoveryAction::UpdateSettings) => ChoiceRoute::CredentialRequested,
            None => self.begin_turn(&choice.text, false).into(),
        }
    }

    /// Replace the backend credential. Takes effect for the next call.
    pub fn update_credential(&mut self, value: &str) {
        self.client.update_config(ConfigUpdate::credential(value.trim()));
    }

    /// Issue a ticket for a connectivity check. Results of earlier checks
    /// are ignored from here on.
    pub fn begin_connectivity_check(&mut self) -> ConnectivityTicket {
        self.connectivity_seq = self.connectivity_seq.wrapping_add(1);
        self.deferred_connectivity = None;
        ConnectivityTicket {
            session: self.session,
            seq: self.connectivity_seq,
        }
    }

    /// Apply the result of a connectivity check. Returns false when the
    /// ticket is superseded or belongs to an earlier session.
    pub fn apply_connectivity(&mut self, ticket: ConnectivityTicket, ok: bool) -> bool {
        if ticket.session != self.session || ticket.seq != self.connectivity_seq {
            log::warn!(
                "Dropping connectivity result #{} for session {}",
                ticket.seq,
                ticket.session
            );
            return false;
        }

        if self.state.awaiting_response {
            log::debug!("Turn in flight, holding connectivity result");
            self.deferred_connectivity = Some(ok);
            return true;
        }

        self.settle_connectivity(ok);
        true
    }

    fn settle_connectivity(&mut self, ok: bool) {
        if ok {
            log::info!("Connectivity check passed, switching to live mode");
            self.state.mode = Mode::Live;
            self.state.demo_mode = false;
            self.state.last_error = None;
            self.state
                .transcript
                .push(Message::system("Connected. New turns will be generated live."));
        } else {
            self.enter_fallback();
            self.state.transcript.push(Message::system(
                "Could not connect with these settings. The story continues in demo mode.",
            ));
        }
    }

    /// Blocking check against the current configuration.
    pub fn check_connectivity(&mut self) -> bool {
        let ticket = self.begin_connectivity_check();
        let ok = self.client.test_connectivity();
        self.apply_connectivity(ticket, ok);
        ok
    }

    pub fn update_credential_and_check(&mut self, value: &str) -> bool {
        self.update_credential(value);
        self.check_connectivity()
    }

    /// `replay` re-sends the last action without echoing it again.
    fn open_turn(&mut self, action: &str, is_first_turn: bool, replay: bool) -> TurnTicket {
        self.state.awaiting_response = true;
        self.state.choices.clear();
        self.state.last_error = None;

        if !is_first_turn && !replay {
            self.state.transcript.push(Message::user(action));
        }
        self.last_turn = Some((action.to_string(), is_first_turn));

        let history = self.state.history.recent(PROMPT_HISTORY_ENTRIES);
        let prompt = PromptBuilder::build(&self.state.topic, &history, action, is_first_turn);
        log::debug!("Built prompt ({} chars)", prompt.len());

        let offline = self.state.demo_mode
            || self.client.credential_status() == CredentialStatus::Unconfigured;

        TurnTicket {
            session: self.session,
            action: action.to_string(),
            is_first_turn,
            prompt,
            offline,
        }
    }

    fn enter_fallback(&mut self) {
        if self.state.mode != Mode::Fallback {
            log::info!("Switching to fallback mode");
        }
        self.state.mode = Mode::Fallback;
    }

    fn reset(&mut self) {
        self.session = self.session.wrapping_add(1);
        self.state = SessionState::default();
        self.last_turn = None;
        self.deferred_connectivity = None;
    }
}
