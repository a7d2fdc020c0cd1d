//! Process supervision - spawning shell commands, streaming output,
//! enforcing timeouts with process-group termination

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, warn};

use crate::error::{TestError, TestResult};

/// Default timeout for both the setup and run phases.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// How long to keep draining buffered pipe data after the child exits.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Outcome of one supervised process. Lives only for the duration of a
/// single `supervise` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResult {
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Wait-loop state. The three event sources (exit, read error, deadline)
/// are mutually exclusive winners: whichever fires first moves the state
/// off `Running`, and resolution happens exactly once after the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitState {
    Running,
    TimedOut,
    Resolved,
}

/// Spawn `command` through the system shell in `cwd`, feed it `input` (if
/// any) on stdin, and wait for exit under `timeout`.
///
/// Succeeds only when the process exits 0 *and* wrote nothing to stderr;
/// captured stderr is treated as a failure signal even on a clean exit.
/// On timeout the entire process group is killed so no descendants leak.
pub async fn supervise(
    command: &str,
    cwd: &Path,
    input: Option<&str>,
    timeout: Duration,
) -> TestResult<ProcessResult> {
    debug!("Spawning `{}` in {}", command, cwd.display());

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group so a timeout kill reaches descendants too.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd
        .spawn()
        .map_err(|e| TestError::Failed(format!("Failed to spawn `{}`: {}", command, e)))?;

    let stdin = child.stdin.take();
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| TestError::Failed("stdout pipe unavailable".to_string()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| TestError::Failed("stderr pipe unavailable".to_string()))?;

    let mut out_buf = String::new();
    let mut err_buf = String::new();
    let mut out_open = true;
    let mut err_open = true;

    // The deadline is armed at spawn time and covers the stdin feed too:
    // a child that never drains its stdin must still die at the timeout.
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    // Single persistent future so partial write progress survives loop
    // iterations (write_all is not cancel safe).
    let feed = feed_stdin(stdin, input);
    tokio::pin!(feed);
    let mut stdin_done = false;

    let mut state = WaitState::Running;
    let mut status = None;
    let mut out_chunk = [0u8; 4096];
    let mut err_chunk = [0u8; 4096];

    while state == WaitState::Running {
        tokio::select! {
            res = &mut feed, if !stdin_done => {
                res?;
                stdin_done = true;
            }
            n = stdout.read(&mut out_chunk), if out_open => match n {
                Ok(0) | Err(_) => out_open = false,
                Ok(n) => append_chunk(&mut out_buf, &out_chunk[..n]),
            },
            n = stderr.read(&mut err_chunk), if err_open => match n {
                Ok(0) | Err(_) => err_open = false,
                Ok(n) => append_chunk(&mut err_buf, &err_chunk[..n]),
            },
            exit = child.wait() => {
                status = Some(exit?);
                state = WaitState::Resolved;
            }
            _ = &mut deadline => {
                state = WaitState::TimedOut;
            }
        }
    }

    if state == WaitState::TimedOut {
        warn!("`{}` exceeded {} ms, killing process group", command, timeout.as_millis());
        kill_tree(&mut child);
        let _ = child.wait().await;
        return Err(TestError::Timeout(timeout.as_millis() as u64));
    }

    // The child has exited but the pipes may still hold buffered chunks;
    // drain both before resolving so the stderr check sees everything.
    // Bounded: a surviving descendant holding the write end must not
    // stall resolution indefinitely.
    let _ = tokio::time::timeout(DRAIN_GRACE, async {
        while out_open {
            match stdout.read(&mut out_chunk).await {
                Ok(0) | Err(_) => out_open = false,
                Ok(n) => append_chunk(&mut out_buf, &out_chunk[..n]),
            }
        }
        while err_open {
            match stderr.read(&mut err_chunk).await {
                Ok(0) | Err(_) => err_open = false,
                Ok(n) => append_chunk(&mut err_buf, &err_chunk[..n]),
            }
        }
    })
    .await;

    let status = status.ok_or_else(|| TestError::Failed("exit status missing".to_string()))?;
    let exit_code = status.code();
    let signal = exit_signal(&status);

    if !err_buf.is_empty() {
        return Err(TestError::Failed(err_buf));
    }

    match exit_code {
        Some(0) => Ok(ProcessResult {
            exit_code,
            signal,
            stdout: out_buf,
            stderr: err_buf,
        }),
        _ => Err(TestError::Failed(format!(
            "Exit with code: {} and signal: {}",
            display_opt(exit_code),
            display_opt(signal),
        ))),
    }
}

/// Write the input text (if any) to the child's stdin, then close the
/// stream so programs waiting for EOF proceed. A broken pipe here just
/// means the child never read its stdin; that is not a failure.
async fn feed_stdin(stdin: Option<ChildStdin>, input: Option<&str>) -> TestResult<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };

    if let Some(text) = input.filter(|t| !t.is_empty()) {
        if let Err(e) = stdin.write_all(text.as_bytes()).await {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }
    }

    let _ = stdin.shutdown().await;
    Ok(())
}

/// Append one received chunk followed by a CRLF separator.
fn append_chunk(buf: &mut String, chunk: &[u8]) {
    buf.push_str(&String::from_utf8_lossy(chunk));
    buf.push_str("\r\n");
}

/// Kill the whole process tree rooted at `child`, not just the child.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            let _ = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL);
        }
    }

    // Fallback for the child itself if the group kill was unavailable.
    let _ = child.start_kill();
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

fn display_opt(value: Option<i32>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}
