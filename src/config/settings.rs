use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_state_root")]
    pub state_root: PathBuf,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub kickass: KickAssConfig,
    #[serde(default)]
    pub z88dk: Z88dkConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KickAssConfig {
    #[serde(default = "default_java")]
    pub java: String,
    #[serde(default = "default_kickass_jar")]
    pub jar: PathBuf,
}

impl Default for KickAssConfig {
    fn default() -> Self {
        Self {
            java: default_java(),
            jar: default_kickass_jar(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Z88dkConfig {
    #[serde(default = "default_zcc")]
    pub zcc: String,
}

impl Default for Z88dkConfig {
    fn default() -> Self {
        Self { zcc: default_zcc() }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_root: default_state_root(),
            timeout_seconds: default_timeout_seconds(),
            max_concurrency: default_max_concurrency(),
            tools: ToolsConfig::default(),
        }
    }
}

fn default_state_root() -> PathBuf {
    std::env::temp_dir().join("retrobuild")
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    4
}

fn default_java() -> String {
    "java".to_string()
}

fn default_kickass_jar() -> PathBuf {
    PathBuf::from("KickAss.jar")
}

fn default_zcc() -> String {
    "zcc".to_string()
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.state_root.as_os_str().is_empty() {
            return Err(ConfigError::Settings(
                "`state_root` must be non-empty".to_string(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Settings(
                "`timeout_seconds` must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Settings(
                "`max_concurrency` must be greater than zero".to_string(),
            ));
        }
        for (field, value) in [
            ("tools.kickass.java", self.tools.kickass.java.as_str()),
            ("tools.z88dk.zcc", self.tools.z88dk.zcc.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Settings(format!("`{field}` must be non-empty")));
            }
        }
        if self.tools.kickass.jar.as_os_str().is_empty() {
            return Err(ConfigError::Settings(
                "`tools.kickass.jar` must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
