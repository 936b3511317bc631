use crate::build::types::{
    BuildArtifact, BuildStep, CompileResult, Diagnostic, Listing, SymbolMap,
};
use crate::toolchain::{parse_listing, InvocationResult, ToolAdapter};
use crate::workspace::Workspace;
use std::collections::BTreeMap;
use std::fs;

/// Turns a finished tool run into the caller-facing result. Success needs
/// both a zero exit code and the artifact on disk.
pub fn assemble(
    invocation: &InvocationResult,
    workspace: &Workspace,
    step: &BuildStep,
    adapter: &dyn ToolAdapter,
) -> CompileResult {
    let artifact_name = adapter.artifact_name();
    if invocation.succeeded() && workspace.contains_file(artifact_name) {
        let artifact = match fs::read(workspace.file(artifact_name)) {
            Ok(bytes) => bytes,
            Err(err) => {
                return CompileResult::failure(Diagnostic::unlocated(format!(
                    "Failed to read output file: {artifact_name}: {err}"
                )))
            }
        };
        return CompileResult::Success(BuildArtifact {
            artifact,
            symbolmap: read_symbols(workspace, step, adapter),
            listings: read_listings(workspace, step, adapter),
        });
    }

    let mut diagnostics = adapter.parse_diagnostics(&invocation.combined_output());
    if diagnostics.is_empty() {
        diagnostics.push(Diagnostic::unlocated(silent_failure_message(
            invocation,
            adapter,
        )));
    }
    CompileResult::Failure { diagnostics }
}

fn silent_failure_message(invocation: &InvocationResult, adapter: &dyn ToolAdapter) -> String {
    match invocation.exit_code {
        Some(0) => format!(
            "{} finished without producing {}",
            adapter.kind(),
            adapter.artifact_name()
        ),
        Some(code) => format!(
            "{} exited with code {code} and produced no output",
            adapter.kind()
        ),
        None => format!(
            "{} was terminated by a signal and produced no output",
            adapter.kind()
        ),
    }
}

// Only the first candidate present is read; a lower-priority table is never
// merged in.
fn read_symbols(workspace: &Workspace, step: &BuildStep, adapter: &dyn ToolAdapter) -> SymbolMap {
    adapter
        .symbol_files(step)
        .iter()
        .find(|name| workspace.contains_file(name))
        .and_then(|name| fs::read(workspace.file(name)).ok())
        .map(|bytes| adapter.parse_symbols(&String::from_utf8_lossy(&bytes)))
        .unwrap_or_default()
}

fn read_listings(
    workspace: &Workspace,
    step: &BuildStep,
    adapter: &dyn ToolAdapter,
) -> BTreeMap<String, Listing> {
    adapter
        .listing_files(step)
        .into_iter()
        .filter_map(|name| {
            let bytes = fs::read(workspace.file(&name)).ok()?;
            Some((name, parse_listing(&String::from_utf8_lossy(&bytes))))
        })
        .collect()
}
