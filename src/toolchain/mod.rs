use crate::build::types::{BuildStep, Diagnostic, SymbolMap};
use crate::config::ToolsConfig;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod diagnostics;
pub mod invocation;
pub mod kickass;
pub mod listing;
pub mod runner;
pub mod symbols;
pub mod z88dk;

pub use diagnostics::{parse_with_strategies, LineStrategy};
pub use invocation::{invoke, reject_reserved_updates};
pub use kickass::KickAssAdapter;
pub use listing::parse_listing;
pub use runner::run_tool;
pub use symbols::parse_symbols;
pub use z88dk::Z88dkAdapter;

#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("platform `{platform}` is not supported by {tool}")]
    UnsupportedPlatform { tool: ToolKind, platform: String },
    #[error("Invalid main file path: {path}: {reason}")]
    InvalidEntry { path: String, reason: String },
    #[error("Main file not found: {path}")]
    EntryMissing { path: String },
    #[error("File name is reserved for build output: {path}")]
    ReservedName { path: String },
    #[error("{tool} is not available: {detail}")]
    ToolUnavailable { tool: ToolKind, detail: String },
    #[error("failed to launch {binary}: {source}")]
    LaunchFailed {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} timed out after {timeout_ms}ms")]
    TimedOut { tool: ToolKind, timeout_ms: u64 },
    #[error("failed to prepare workspace file {path}: {source}")]
    Prepare {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl InvocationError {
    /// Source path the failure is about, when there is one.
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidEntry { path, .. }
            | Self::EntryMissing { path }
            | Self::ReservedName { path } => path,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolKind {
    KickAss,
    Z88dk,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::KickAss, ToolKind::Z88dk];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::KickAss => "kickass",
            Self::Z88dk => "z88dk",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, InvocationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "kickass" => Ok(Self::KickAss),
            "z88dk" => Ok(Self::Z88dk),
            _ => Err(InvocationError::UnknownTool(raw.to_string())),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Executable plus arguments, all relative to the workspace the child runs
/// in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub binary: String,
    pub args: Vec<String>,
}

impl InvocationSpec {
    pub fn command_form(&self) -> String {
        if self.args.is_empty() {
            return self.binary.clone();
        }
        format!("{} {}", self.binary, self.args.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub command_form: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl InvocationResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr, the text diagnostics are parsed from.
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

/// Per-toolchain behaviour: how to run it and how to read what it leaves
/// behind.
pub trait ToolAdapter: Send + Sync {
    fn kind(&self) -> ToolKind;

    fn executable(&self) -> &str;

    /// Artifact file name, relative to the workspace.
    fn artifact_name(&self) -> &str;

    fn build_command(&self, step: &BuildStep) -> Result<InvocationSpec, InvocationError>;

    fn diagnostic_strategies(&self) -> &'static [LineStrategy];

    fn parse_diagnostics(&self, output: &str) -> Vec<Diagnostic> {
        parse_with_strategies(self.diagnostic_strategies(), output)
    }

    /// Symbol table candidates in priority order. Only the first one present
    /// is read.
    fn symbol_files(&self, _step: &BuildStep) -> Vec<String> {
        Vec::new()
    }

    fn parse_symbols(&self, content: &str) -> SymbolMap {
        parse_symbols(content)
    }

    fn listing_files(&self, _step: &BuildStep) -> Vec<String> {
        Vec::new()
    }

    /// Every file the tool derives, removed before each run so a stale
    /// output from an earlier build can never be mistaken for a new one.
    fn derived_files(&self, step: &BuildStep) -> Vec<String> {
        let mut files = vec![self.artifact_name().to_string()];
        files.extend(self.symbol_files(step));
        files.extend(self.listing_files(step));
        files
    }
}

/// Adapters resolved once from configuration, looked up by the request's
/// `tool` selector.
pub struct ToolRegistry {
    adapters: BTreeMap<ToolKind, Box<dyn ToolAdapter>>,
}

impl ToolRegistry {
    pub fn from_config(config: &ToolsConfig) -> Self {
        let mut adapters: BTreeMap<ToolKind, Box<dyn ToolAdapter>> = BTreeMap::new();
        adapters.insert(
            ToolKind::KickAss,
            Box::new(KickAssAdapter::new(
                resolve_program(&config.kickass.java),
                absolutize(&config.kickass.jar),
            )),
        );
        adapters.insert(
            ToolKind::Z88dk,
            Box::new(Z88dkAdapter::new(resolve_program(&config.z88dk.zcc))),
        );
        Self { adapters }
    }

    pub fn resolve(&self, tool: &str) -> Result<&dyn ToolAdapter, InvocationError> {
        let kind = ToolKind::parse(tool)?;
        self.adapters
            .get(&kind)
            .map(|adapter| adapter.as_ref())
            .ok_or_else(|| InvocationError::UnknownTool(tool.to_string()))
    }

    pub fn adapters(&self) -> impl Iterator<Item = &dyn ToolAdapter> {
        self.adapters.values().map(|adapter| adapter.as_ref())
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.adapters.keys()).finish()
    }
}

// The child runs inside the workspace, so anything given relative to the
// host's directory has to be pinned down before it gets there. Bare program
// names are left for PATH lookup.
fn resolve_program(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('/') || trimmed.contains('\\') {
        absolutize(Path::new(trimmed)).display().to_string()
    } else {
        trimmed.to_string()
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
