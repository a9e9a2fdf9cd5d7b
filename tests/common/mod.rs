#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use turnweaver::engine::fallback::FallbackProvider;
use turnweaver::engine::llm_client::TextGenerator;
use turnweaver::engine::orchestrator::TurnOrchestrator;
use turnweaver::model::config::{ConfigUpdate, Configuration, CredentialStatus};
use turnweaver::TransportError;

#[derive(Clone)]
pub enum Reply {
    Text(String),
    Status(u16),
}

/// Scripted backend. Replies are consumed in order; the last one repeats.
pub struct StubGenerator {
    replies: Mutex<VecDeque<Reply>>,
    config: Mutex<Configuration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        let config = Configuration {
            credential: "test-key".into(),
            ..Configuration::default()
        };

        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            config: Mutex::new(config),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn text(raw: impl Into<String>) -> Arc<Self> {
        Self::new(vec![Reply::Text(raw.into())])
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Self::new(vec![Reply::Status(status)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }
}

impl TextGenerator for StubGenerator {
    fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap()
        };

        match reply {
            Reply::Text(raw) => Ok(raw),
            Reply::Status(status) => Err(TransportError::Status {
                status,
                detail: "stub failure".into(),
            }),
        }
    }

    fn update_config(&self, update: ConfigUpdate) {
        self.config.lock().unwrap().apply(update);
    }

    fn credential_status(&self) -> CredentialStatus {
        self.config.lock().unwrap().credential_status()
    }
}

pub fn turn_json(story: &str, choices: &[&str]) -> String {
    let items: Vec<String> = choices
        .iter()
        .enumerate()
        .map(|(i, text)| format!(r#"{{"id":"{}","text":"{}"}}"#, i + 1, text))
        .collect();
    format!(r#"{{"story":"{}","choices":[{}]}}"#, story, items.join(","))
}

pub fn valid_turn(story: &str) -> String {
    turn_json(story, &["Open the gate", "Climb the wall", "Call for help", "Turn back"])
}

pub fn orchestrator(stub: &Arc<StubGenerator>) -> TurnOrchestrator {
    let client: Arc<dyn TextGenerator> = stub.clone();
    TurnOrchestrator::new(client, FallbackProvider::seeded(7))
}
