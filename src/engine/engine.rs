use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::engine::orchestrator::{dispatch, ChoiceRoute, TurnOrchestrator, TurnTicket};
use crate::engine::protocol::{EngineCommand, EngineResponse};

/// Owns the orchestrator on a dedicated thread. Backend calls run on
/// short-lived worker threads that post their result back into `rx`,
/// so commands like `Restart` are handled while a call is in flight.
pub struct Engine {
    rx: Receiver<EngineCommand>,
    loopback: Sender<EngineCommand>,
    tx: Sender<EngineResponse>,
    orchestrator: TurnOrchestrator,
}

impl Engine {
    pub fn new(
        rx: Receiver<EngineCommand>,
        loopback: Sender<EngineCommand>,
        tx: Sender<EngineResponse>,
        orchestrator: TurnOrchestrator,
    ) -> Self {
        Self {
            rx,
            loopback,
            tx,
            orchestrator,
        }
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            match cmd {
                EngineCommand::StartSession(topic) => {
                    match self.orchestrator.start_session(&topic) {
                        Ok(ticket) => self.spawn_turn(ticket),
                        Err(e) => {
                            let _ = self.tx.send(EngineResponse::Rejected(e.to_string()));
                        }
                    }
                }

                EngineCommand::TakeTurn(action) => {
                    let action = action.trim();
                    if action.is_empty() {
                        continue;
                    }
                    match self.orchestrator.begin_turn(action, false) {
                        Some(ticket) => self.spawn_turn(ticket),
                        None => {
                            let _ = self.tx.send(EngineResponse::Rejected(
                                "Still waiting for the story to continue".into(),
                            ));
                        }
                    }
                }

                EngineCommand::SelectChoice(choice) => {
                    match self.orchestrator.select_choice(&choice) {
                        ChoiceRoute::Turn(ticket) => self.spawn_turn(ticket),
                        ChoiceRoute::Restarted | ChoiceRoute::Ignored => {}
                        ChoiceRoute::CredentialRequested => {
                            let _ = self.tx.send(EngineResponse::CredentialRequested);
                        }
                        ChoiceRoute::Busy => {
                            let _ = self.tx.send(EngineResponse::Rejected(
                                "Still waiting for the story to continue".into(),
                            ));
                        }
                    }
                }

                EngineCommand::Restart => self.orchestrator.restart(),

                EngineCommand::UpdateCredential(value) => {
                    self.orchestrator.update_credential(&value);
                    self.spawn_connectivity_check();
                }

                EngineCommand::CheckConnectivity => self.spawn_connectivity_check(),

                EngineCommand::GenerationFinished { ticket, generation } => {
                    if self.orchestrator.complete_turn(ticket, generation).is_none() {
                        continue;
                    }
                }

                EngineCommand::ConnectivityChecked { ticket, ok } => {
                    if !self.orchestrator.apply_connectivity(ticket, ok) {
                        continue;
                    }
                }

                EngineCommand::Shutdown => break,
            }

            self.publish();
        }
    }

    fn publish(&self) {
        let _ = self
            .tx
            .send(EngineResponse::SessionUpdated(self.orchestrator.state().clone()));
    }

    fn spawn_turn(&self, ticket: TurnTicket) {
        let client = self.orchestrator.client();
        let loopback = self.loopback.clone();

        thread::spawn(move || {
            let generation = dispatch(client.as_ref(), &ticket);
            let _ = loopback.send(EngineCommand::GenerationFinished { ticket, generation });
        });
    }

    fn spawn_connectivity_check(&mut self) {
        let client = self.orchestrator.client();
        let loopback = self.loopback.clone();
        let ticket = self.orchestrator.begin_connectivity_check();

        thread::spawn(move || {
            let ok = client.test_connectivity();
            let _ = loopback.send(EngineCommand::ConnectivityChecked { ticket, ok });
        });
    }
}

/// Spawn an engine thread; returns the command sender and response receiver.
pub fn spawn(orchestrator: TurnOrchestrator) -> (Sender<EngineCommand>, Receiver<EngineResponse>) {
    let (cmd_tx, cmd_rx) = std::sync::mpsc::channel();
    let (resp_tx, resp_rx) = std::sync::mpsc::channel();
    let loopback = cmd_tx.clone();

    thread::spawn(move || {
        let mut engine = Engine::new(cmd_rx, loopback, resp_tx, orchestrator);
        engine.run();
    });

    (cmd_tx, resp_rx)
}
