use retrobuild::build::BuildStep;
use retrobuild::shared::ids::SessionId;
use retrobuild::toolchain::{
    invoke, run_tool, InvocationError, InvocationSpec, ToolKind, Z88dkAdapter,
};
use retrobuild::workspace::{ensure_workspace, BuildPaths};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).expect("write script");
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod");
}

fn spec(binary: &Path, args: &[&str]) -> InvocationSpec {
    InvocationSpec {
        binary: binary.display().to_string(),
        args: args.iter().map(|arg| arg.to_string()).collect(),
    }
}

fn zx_step(entry: &str) -> BuildStep {
    BuildStep {
        path: entry.to_string(),
        files: vec![entry.to_string()],
        platform: "zx".to_string(),
        tool: "z88dk".to_string(),
    }
}

#[test]
fn child_runs_inside_the_working_directory_without_moving_the_host() {
    let tmp = tempdir().expect("tempdir");
    let bin = tmp.path().join("pwd-tool");
    write_script(&bin, "#!/bin/sh\npwd\n");
    let work = tmp.path().join("work");
    fs::create_dir(&work).expect("mkdir");
    let host_before = std::env::current_dir().expect("cwd");

    let result = run_tool(ToolKind::Z88dk, &spec(&bin, &[]), &work, Duration::from_secs(5))
        .expect("run");

    assert_eq!(result.exit_code, Some(0));
    assert_eq!(
        fs::canonicalize(result.stdout.trim()).expect("canonical stdout"),
        fs::canonicalize(&work).expect("canonical work")
    );
    assert_eq!(std::env::current_dir().expect("cwd"), host_before);
}

#[test]
fn exit_code_and_both_streams_are_captured() {
    let tmp = tempdir().expect("tempdir");
    let bin = tmp.path().join("noisy");
    write_script(&bin, "#!/bin/sh\necho \"args=$*\"\necho 'boom' 1>&2\nexit 17\n");

    let result = run_tool(
        ToolKind::KickAss,
        &spec(&bin, &["-o", "output.prg"]),
        tmp.path(),
        Duration::from_secs(5),
    )
    .expect("run");
    assert_eq!(result.exit_code, Some(17));
    assert_eq!(result.stdout.trim(), "args=-o output.prg");
    assert_eq!(result.stderr.trim(), "boom");
    assert!(result.command_form.ends_with("noisy -o output.prg"));
}

#[test]
fn hung_tool_is_killed_at_the_deadline_with_its_subprocesses() {
    let tmp = tempdir().expect("tempdir");
    let bin = tmp.path().join("hang");
    write_script(&bin, "#!/bin/sh\nsleep 6\necho unreachable\n");

    let started = Instant::now();
    let err = run_tool(
        ToolKind::KickAss,
        &spec(&bin, &[]),
        tmp.path(),
        Duration::from_millis(300),
    )
    .expect_err("timeout");
    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    match err {
        InvocationError::TimedOut { tool, timeout_ms } => {
            assert_eq!(tool, ToolKind::KickAss);
            assert_eq!(timeout_ms, 300);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn background_subprocess_does_not_hold_up_a_finished_tool() {
    let tmp = tempdir().expect("tempdir");
    let bin = tmp.path().join("forker");
    write_script(&bin, "#!/bin/sh\nsleep 6 &\necho done\nexit 0\n");

    let started = Instant::now();
    let result = run_tool(
        ToolKind::Z88dk,
        &spec(&bin, &[]),
        tmp.path(),
        Duration::from_secs(10),
    )
    .expect("run");
    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.stdout.trim(), "done");
}

#[test]
fn missing_binary_is_a_launch_failure() {
    let tmp = tempdir().expect("tempdir");
    let err = run_tool(
        ToolKind::Z88dk,
        &spec(&tmp.path().join("does-not-exist"), &[]),
        tmp.path(),
        Duration::from_secs(1),
    )
    .expect_err("launch failure");
    match err {
        InvocationError::LaunchFailed { source, .. } => {
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound)
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_entry_file_is_reported_before_launch() {
    let tmp = tempdir().expect("tempdir");
    let paths = BuildPaths::new(tmp.path().join("state"));
    let ws = ensure_workspace(&paths, &SessionId::parse("s1").expect("id")).expect("ensure");
    let marker = tmp.path().join("launched");
    let bin = tmp.path().join("zcc");
    write_script(&bin, &format!("#!/bin/sh\ntouch {}\n", marker.display()));

    let adapter = Z88dkAdapter::new(bin.display().to_string());
    let err = invoke(&ws, &zx_step("main.c"), &adapter, Duration::from_secs(5))
        .expect_err("entry missing");
    assert_eq!(err.to_string(), "Main file not found: main.c");
    assert_eq!(err.path(), "main.c");
    assert!(!marker.exists());
}

#[test]
fn stale_outputs_are_removed_before_the_tool_runs() {
    let tmp = tempdir().expect("tempdir");
    let paths = BuildPaths::new(tmp.path().join("state"));
    let ws = ensure_workspace(&paths, &SessionId::parse("s2").expect("id")).expect("ensure");
    fs::write(ws.file("main.c"), "int main(){}").expect("write source");
    fs::write(ws.file("output.tap"), "stale").expect("write stale");
    let bin = tmp.path().join("zcc");
    write_script(
        &bin,
        "#!/bin/sh\nif [ -e output.tap ]; then echo stale-present; else echo clean; fi\n",
    );

    let adapter = Z88dkAdapter::new(bin.display().to_string());
    let result = invoke(&ws, &zx_step("main.c"), &adapter, Duration::from_secs(5))
        .expect("invoke");
    assert_eq!(result.stdout.trim(), "clean");
    assert!(ws.file("main.c").is_file());
}
