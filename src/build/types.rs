use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

pub type SymbolMap = BTreeMap<String, u64>;

/// What to build: the entry file, the files it belongs with, and the
/// selectors that pick a tool adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildStep {
    pub path: String,
    pub files: Vec<String>,
    pub platform: String,
    pub tool: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Diagnostic {
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(rename = "msg")]
    pub message: String,
    pub path: String,
}

impl Diagnostic {
    pub fn unlocated(message: impl Into<String>) -> Self {
        Self {
            line: 0,
            column: None,
            message: message.into(),
            path: String::new(),
        }
    }

    pub fn located(
        path: impl Into<String>,
        line: u32,
        column: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line,
            column,
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListingLine {
    pub address: u64,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Listing {
    pub lines: Vec<ListingLine>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub artifact: Vec<u8>,
    pub symbolmap: SymbolMap,
    pub listings: BTreeMap<String, Listing>,
}

/// The one externally visible outcome of a build request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileResult {
    Success(BuildArtifact),
    Failure { diagnostics: Vec<Diagnostic> },
}

impl CompileResult {
    pub fn failure(diagnostic: Diagnostic) -> Self {
        Self::Failure {
            diagnostics: vec![diagnostic],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Success(_) => &[],
            Self::Failure { diagnostics } => diagnostics,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireResult<'a> {
    Success {
        output: String,
        listings: &'a BTreeMap<String, Listing>,
        symbolmap: &'a SymbolMap,
    },
    Failure {
        errors: &'a [Diagnostic],
        listings: [Listing; 0],
    },
}

impl Serialize for CompileResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Success(built) => WireResult::Success {
                output: STANDARD.encode(&built.artifact),
                listings: &built.listings,
                symbolmap: &built.symbolmap,
            },
            Self::Failure { diagnostics } => WireResult::Failure {
                errors: diagnostics,
                listings: [],
            },
        };
        wire.serialize(serializer)
    }
}
