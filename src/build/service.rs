use crate::build::assemble::assemble;
use crate::build::error::BuildError;
use crate::build::request::{BuildRequest, RequestRejection};
use crate::build::types::{CompileResult, Diagnostic};
use crate::config::Settings;
use crate::shared::ids::SessionId;
use crate::shared::logging::append_build_log;
use crate::toolchain::{invoke, reject_reserved_updates, InvocationError, ToolRegistry};
use crate::workspace::{
    cleanup_workspace, ensure_workspace, materialize, BuildPaths, WorkspaceError,
};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::thread;
use std::time::Duration;

/// Outcome of handling one raw request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResponse {
    Rejected(RequestRejection),
    Completed(CompileResult),
}

impl BuildResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Rejected(rejection) => rejection.status_code(),
            Self::Completed(_) => 200,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Rejected(rejection) => rejection.to_json(),
            Self::Completed(result) => {
                serde_json::to_value(result).unwrap_or_else(|_| Value::Null)
            }
        }
    }
}

/// Session-scoped build orchestration. One instance is shared by every
/// request; nothing in it is mutated per request.
#[derive(Debug)]
pub struct BuildService {
    paths: BuildPaths,
    registry: ToolRegistry,
    timeout: Duration,
    max_concurrency: usize,
}

impl BuildService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            paths: BuildPaths::new(&settings.state_root),
            registry: ToolRegistry::from_config(&settings.tools),
            timeout: settings.timeout(),
            max_concurrency: settings.max_concurrency.max(1),
        }
    }

    pub fn paths(&self) -> &BuildPaths {
        &self.paths
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn handle_json(&self, raw: &str) -> BuildResponse {
        match BuildRequest::from_json(raw) {
            Ok(request) => BuildResponse::Completed(self.compile(&request)),
            Err(rejection) => {
                append_build_log(
                    &self.paths.root,
                    "warn",
                    "build.request.rejected",
                    &format!("status={} reason={}", rejection.status_code(), rejection),
                );
                BuildResponse::Rejected(rejection)
            }
        }
    }

    /// Handles several raw requests at once, at most `max_concurrency` at a
    /// time. Responses come back in input order.
    pub fn handle_batch(&self, raws: &[String]) -> Vec<BuildResponse> {
        let mut responses = Vec::with_capacity(raws.len());
        for chunk in raws.chunks(self.max_concurrency) {
            thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|raw| scope.spawn(move || self.handle_json(raw)))
                    .collect();
                for handle in handles {
                    let response = handle.join().unwrap_or_else(|_| {
                        BuildResponse::Completed(CompileResult::failure(Diagnostic::unlocated(
                            "build worker panicked",
                        )))
                    });
                    responses.push(response);
                }
            });
        }
        responses
    }

    pub fn compile(&self, request: &BuildRequest) -> CompileResult {
        let session = request.session.as_str();
        match self.try_compile(request) {
            Ok(result) => {
                self.log_result(session, &result);
                result
            }
            Err(err) => {
                let level = match &err {
                    BuildError::Invocation(InvocationError::TimedOut { .. }) => "error",
                    BuildError::Workspace(_) => "error",
                    _ => "warn",
                };
                append_build_log(
                    &self.paths.root,
                    level,
                    "build.failed",
                    &format!("session={session} kind={} reason={err}", err.kind()),
                );
                CompileResult::failure(err.to_diagnostic())
            }
        }
    }

    fn try_compile(&self, request: &BuildRequest) -> Result<CompileResult, BuildError> {
        let step = &request.build_step;
        let adapter = self.registry.resolve(&step.tool)?;
        reject_reserved_updates(step, adapter, &request.updates)?;

        let workspace = ensure_workspace(&self.paths, &request.session)?;
        append_build_log(
            &self.paths.root,
            "info",
            "build.workspace.ready",
            &format!(
                "session={} dir={}",
                request.session,
                workspace.root().display()
            ),
        );

        let written = materialize(&workspace, &request.updates)?;
        append_build_log(
            &self.paths.root,
            "info",
            "build.materialized",
            &format!("session={} files={}", request.session, written.join(",")),
        );

        append_build_log(
            &self.paths.root,
            "info",
            "build.tool.started",
            &format!(
                "session={} tool={} platform={} entry={}",
                request.session,
                adapter.kind(),
                step.platform,
                step.path
            ),
        );
        let invocation = match invoke(&workspace, step, adapter, self.timeout) {
            Ok(invocation) => invocation,
            Err(err @ InvocationError::TimedOut { .. }) => {
                append_build_log(
                    &self.paths.root,
                    "error",
                    "build.tool.timeout",
                    &format!("session={} reason={err}", request.session),
                );
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };
        append_build_log(
            &self.paths.root,
            "info",
            "build.tool.finished",
            &format!(
                "session={} command={} exit_code={:?} elapsed_ms={}",
                request.session,
                invocation.command_form,
                invocation.exit_code,
                invocation.elapsed.as_millis()
            ),
        );

        Ok(assemble(&invocation, &workspace, step, adapter))
    }

    fn log_result(&self, session: &str, result: &CompileResult) {
        match result {
            CompileResult::Success(built) => append_build_log(
                &self.paths.root,
                "info",
                "build.succeeded",
                &format!(
                    "session={session} bytes={} sha256={} symbols={}",
                    built.artifact.len(),
                    sha256_hex(&built.artifact),
                    built.symbolmap.len()
                ),
            ),
            CompileResult::Failure { diagnostics } => append_build_log(
                &self.paths.root,
                "info",
                "build.failed",
                &format!(
                    "session={session} kind=tool diagnostics={}",
                    diagnostics.len()
                ),
            ),
        }
    }

    /// Explicit retention hook; nothing in the build path calls it.
    pub fn cleanup(&self, session: &SessionId) -> Result<bool, WorkspaceError> {
        let removed = cleanup_workspace(&self.paths, session)?;
        append_build_log(
            &self.paths.root,
            "info",
            "workspace.cleanup",
            &format!("session={session} removed={removed}"),
        );
        Ok(removed)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
