use std::path::{Path, PathBuf};

use crate::models::VentiSettings;
use crate::utils::AppResult;

/// `<config_dir>/Venti/settings.json`
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Venti").join("settings.json"))
}

/// Load settings from the default location, falling back to defaults.
pub fn load_settings() -> VentiSettings {
    match settings_path() {
        Some(path) => load_settings_from(&path),
        None => {
            log::debug!("settings: no config dir, using defaults");
            VentiSettings::default()
        }
    }
}

/// Load settings from `path`. A missing file yields defaults silently; an
/// unreadable, unparsable or invalid file yields defaults with a warning.
pub fn load_settings_from(path: &Path) -> VentiSettings {
    if !path.exists() {
        return VentiSettings::default();
    }
    match read_settings(path) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("settings: ignoring {}: {}", path.display(), e);
            VentiSettings::default()
        }
    }
}

fn read_settings(path: &Path) -> AppResult<VentiSettings> {
    let raw = std::fs::read_to_string(path)?;
    let settings: VentiSettings = serde_json::from_str(&raw)?;
    settings.validate()?;
    Ok(settings)
}
