use super::{default_config_path, ConfigError, Settings};
use std::path::Path;

pub fn load_settings() -> Result<Settings, ConfigError> {
    let path = default_config_path()?;
    load_settings_from(&path)
}

/// A missing file is not an error: every field has a default.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let settings = if path.exists() {
        Settings::from_path(path)?
    } else {
        Settings::default()
    };
    settings.validate()?;
    Ok(settings)
}
