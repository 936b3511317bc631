pub mod assemble;
pub mod error;
pub mod request;
pub mod service;
pub mod types;

pub use assemble::assemble;
pub use error::BuildError;
pub use request::{BuildRequest, RejectionKind, RequestRejection};
pub use service::{BuildResponse, BuildService};
pub use types::{
    BuildArtifact, BuildStep, CompileResult, Diagnostic, Listing, ListingLine, SymbolMap,
};
