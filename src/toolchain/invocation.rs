use crate::build::types::BuildStep;
use crate::toolchain::runner::run_tool;
use crate::toolchain::{InvocationError, InvocationResult, ToolAdapter};
use crate::workspace::{validate_relative_path, FileUpdate, Workspace};
use std::fs;
use std::time::Duration;

/// Refuses uploads named like one of the tool's outputs. Those names are
/// cleared before every run, so such a file would vanish before the tool saw
/// it.
pub fn reject_reserved_updates(
    step: &BuildStep,
    adapter: &dyn ToolAdapter,
    updates: &[FileUpdate],
) -> Result<(), InvocationError> {
    let derived = adapter.derived_files(step);
    let reserved = updates
        .iter()
        .filter_map(|update| update.path.as_deref())
        .find(|path| *path != step.path && derived.iter().any(|name| name.as_str() == *path));
    match reserved {
        Some(path) => Err(InvocationError::ReservedName {
            path: path.to_string(),
        }),
        None => Ok(()),
    }
}

/// Checks the entry file, clears outputs left by an earlier build in the same
/// workspace, and runs the adapter's command inside the workspace.
pub fn invoke(
    workspace: &Workspace,
    step: &BuildStep,
    adapter: &dyn ToolAdapter,
    timeout: Duration,
) -> Result<InvocationResult, InvocationError> {
    validate_relative_path(&step.path).map_err(|reason| InvocationError::InvalidEntry {
        path: step.path.clone(),
        reason,
    })?;
    if !workspace.contains_file(&step.path) {
        return Err(InvocationError::EntryMissing {
            path: step.path.clone(),
        });
    }

    let spec = adapter.build_command(step)?;

    for name in adapter.derived_files(step) {
        if name == step.path {
            continue;
        }
        let path = workspace.file(&name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(InvocationError::Prepare {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }

    run_tool(adapter.kind(), &spec, workspace.root(), timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::KickAssAdapter;

    fn step() -> BuildStep {
        BuildStep {
            path: "main.asm".to_string(),
            files: vec!["main.asm".to_string()],
            platform: "c64".to_string(),
            tool: "kickass".to_string(),
        }
    }

    #[test]
    fn uploads_named_like_outputs_are_refused() {
        let adapter = KickAssAdapter::new("java", "KickAss.jar");
        for name in ["output.prg", "output.lst", "main.sym", "main.vs"] {
            let updates = vec![FileUpdate::new("main.asm", "rts"), FileUpdate::new(name, "x")];
            let err = reject_reserved_updates(&step(), &adapter, &updates).expect_err(name);
            assert_eq!(err.path(), name);
        }
    }

    #[test]
    fn ordinary_uploads_pass() {
        let adapter = KickAssAdapter::new("java", "KickAss.jar");
        let updates = vec![
            FileUpdate::new("main.asm", "rts"),
            FileUpdate::new("lib.sym", "x"),
            FileUpdate {
                path: None,
                data: Some("x".to_string()),
            },
        ];
        assert!(reject_reserved_updates(&step(), &adapter, &updates).is_ok());
    }
}
