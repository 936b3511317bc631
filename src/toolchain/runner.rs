use crate::toolchain::{InvocationError, InvocationResult, InvocationSpec, ToolKind};
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const DRAIN_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Runs `spec` with `working_dir` as the child's current directory. The
/// host's own working directory is never touched, so concurrent runs for
/// different sessions cannot see each other's directory.
///
/// The child leads its own process group. Whatever it forks is killed with
/// it, both at the deadline and once the child itself has exited, so the
/// timeout bounds the whole call.
pub fn run_tool(
    tool: ToolKind,
    spec: &InvocationSpec,
    working_dir: &Path,
    timeout: Duration,
) -> Result<InvocationResult, InvocationError> {
    let command_form = spec.command_form();
    let launch_error = |source| InvocationError::LaunchFailed {
        binary: spec.binary.clone(),
        source,
    };

    let mut command = Command::new(&spec.binary);
    command
        .current_dir(working_dir)
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = command.spawn().map_err(launch_error)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| launch_error(std::io::Error::other("missing stdout pipe")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| launch_error(std::io::Error::other("missing stderr pipe")))?;
    let (output_tx, output_rx) = mpsc::channel();
    spawn_reader(Stream::Stdout, stdout, output_tx.clone());
    spawn_reader(Stream::Stderr, stderr, output_tx);

    let start = Instant::now();
    let deadline = start + timeout;
    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    kill_and_reap(&mut child);
                    let _ = collect_output(&output_rx, Instant::now() + DRAIN_GRACE);
                    return Err(InvocationError::TimedOut {
                        tool,
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                kill_and_reap(&mut child);
                return Err(launch_error(err));
            }
        }
    };

    // Anything the tool left running in the background still holds the
    // pipes open.
    kill_process_group(&child);
    let (stdout, stderr) = collect_output(&output_rx, deadline.max(Instant::now() + DRAIN_GRACE));

    Ok(InvocationResult {
        command_form,
        exit_code: exit_status.code(),
        stdout,
        stderr,
        elapsed: start.elapsed(),
    })
}

fn spawn_reader<R: Read + Send + 'static>(stream: Stream, pipe: R, tx: Sender<(Stream, String)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let mut reader = BufReader::new(pipe);
        let _ = reader.read_to_end(&mut buf);
        let _ = tx.send((stream, String::from_utf8_lossy(&buf).into_owned()));
    });
}

/// Waits for both readers until `deadline`. A reader still blocked after
/// that is abandoned and its stream comes back empty.
fn collect_output(rx: &Receiver<(Stream, String)>, deadline: Instant) -> (String, String) {
    let mut stdout = String::new();
    let mut stderr = String::new();
    for _ in 0..2 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Stream::Stdout, text)) => stdout = text,
            Ok((Stream::Stderr, text)) => stderr = text,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    (stdout, stderr)
}

fn kill_and_reap(child: &mut Child) {
    kill_process_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_process_group(child: &Child) {
    // process_group(0) made the child's pid its group id. The id stays
    // reserved while any member is alive, even after the child is reaped.
    let pgid = child.id() as libc::pid_t;
    let _ = unsafe { libc::kill(-pgid, libc::SIGKILL) };
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}
