mod ui;

use std::sync::Arc;

use anyhow::Result;

use turnweaver::{Configuration, FallbackProvider, GeminiClient, TurnOrchestrator};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let config = Configuration::from_env();
    let client = GeminiClient::new(config)?;
    let orchestrator = TurnOrchestrator::new(Arc::new(client), FallbackProvider::new());

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Turnweaver",
        options,
        Box::new(move |_cc| Ok(Box::new(ui::app::TurnweaverApp::new(orchestrator)))),
    )
    .map_err(|e| anyhow::anyhow!("UI failed: {e}"))
}
