use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::ui::settings::UiSettings;

fn settings_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("turnweaver");
    fs::create_dir_all(&path)?;
    path.push("ui_settings.json");
    Ok(path)
}

/// Presentation preferences only; no credentials or story state.
pub fn load_settings() -> UiSettings {
    settings_path()
        .ok()
        .and_then(|path| fs::read_to_string(path).ok())
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn save_settings(settings: &UiSettings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(settings_path()?, json)?;
    Ok(())
}
