use crate::shared::ids::SessionId;
use crate::shared::logging::build_log_path;
use std::path::PathBuf;

/// Filesystem layout under the configured state root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    pub root: PathBuf,
}

impl BuildPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn session_dir(&self, session: &SessionId) -> PathBuf {
        self.sessions_dir().join(session.as_str())
    }

    pub fn build_log_path(&self) -> PathBuf {
        build_log_path(&self.root)
    }
}
