use crate::build::types::Diagnostic;
use crate::toolchain::InvocationError;
use crate::workspace::{MaterializeError, WorkspaceError};

/// System-level faults. Each one ends the request with a single diagnostic
/// rather than a parsed tool report.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

impl BuildError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Workspace(_) => "workspace",
            Self::Materialize(_) => "materialize",
            Self::Invocation(_) => "invocation",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::unlocated(self.to_string());
        match self {
            Self::Workspace(_) => diagnostic,
            Self::Materialize(err) => diagnostic.with_path(err.path()),
            Self::Invocation(err) => diagnostic.with_path(err.path()),
        }
    }
}
