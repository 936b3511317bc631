use crate::shared::ids::SessionId;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod materialize;
pub mod paths;
pub mod validate;

pub use materialize::{materialize, FileUpdate, MaterializeError, BASE64_SENTINEL};
pub use paths::BuildPaths;
pub use validate::{validate_relative_path, validate_session_id};

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Failed to create session directory: {path}: {source}")]
    DirCreateFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Session directory is not writable: {path}: {source}")]
    NotWritable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to clean up session directory: {path}: {source}")]
    CleanupFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to one session's sandbox directory. Only obtainable through
/// [`ensure_workspace`], so holding one means the directory existed and was
/// writable when the request started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    session: SessionId,
    root: PathBuf,
}

impl Workspace {
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins a flat file name onto the workspace root. Callers pass names
    /// that already went through [`validate_relative_path`] or come from a
    /// tool adapter's fixed templates.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn contains_file(&self, name: &str) -> bool {
        self.file(name).is_file()
    }
}

pub fn ensure_workspace(
    paths: &BuildPaths,
    session: &SessionId,
) -> Result<Workspace, WorkspaceError> {
    let root = paths.session_dir(session);
    if !root.is_dir() {
        create_private_dir(&root).map_err(|source| WorkspaceError::DirCreateFailed {
            path: root.display().to_string(),
            source,
        })?;
    }

    probe_writable(&root).map_err(|source| WorkspaceError::NotWritable {
        path: root.display().to_string(),
        source,
    })?;

    Ok(Workspace {
        session: session.clone(),
        root,
    })
}

/// Removes the files directly under the session directory and then the
/// directory itself. Returns `false` when there was nothing to remove.
pub fn cleanup_workspace(paths: &BuildPaths, session: &SessionId) -> Result<bool, WorkspaceError> {
    let root = paths.session_dir(session);
    if !root.exists() {
        return Ok(false);
    }
    let cleanup_error = |source| WorkspaceError::CleanupFailed {
        path: root.display().to_string(),
        source,
    };

    for entry in fs::read_dir(&root).map_err(cleanup_error)? {
        let entry = entry.map_err(cleanup_error)?;
        let file_type = entry.file_type().map_err(cleanup_error)?;
        if file_type.is_file() || file_type.is_symlink() {
            fs::remove_file(entry.path()).map_err(cleanup_error)?;
        }
    }
    fs::remove_dir(&root).map_err(cleanup_error)?;
    Ok(true)
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

// A pre-existing directory may have lost its permissions since it was
// created, so writability is checked with a real write.
fn probe_writable(root: &Path) -> std::io::Result<()> {
    let probe = root.join(format!(
        ".write-probe-{}-{}",
        std::process::id(),
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ));
    fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&probe)?;
    fs::remove_file(&probe)
}
