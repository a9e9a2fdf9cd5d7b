pub mod engine;
pub mod error;
pub mod fallback;
pub mod llm_client;
pub mod orchestrator;
pub mod prompt_builder;
pub mod protocol;
pub mod response_normalizer;
