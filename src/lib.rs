//! Turn-generation pipeline for an interactive story game: prompt building,
//! backend calls, response repair and deterministic offline fallback.

pub mod engine;
pub mod model;

pub use engine::error::{NormalizeError, SessionError, TransportError};
pub use engine::fallback::FallbackProvider;
pub use engine::llm_client::{GeminiClient, TextGenerator};
pub use engine::orchestrator::{RecoveryAction, TurnOrchestrator};
pub use model::config::Configuration;
