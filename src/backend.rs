use crate::types::RunOutcome;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// 4 seconds per test program
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

/// Runs the program under test against one source file.
pub trait Backend {
    fn run(&self, source: &Path) -> RunOutcome;
}

/// Backend that spawns the target executable as a child process: `executable <source>`.
#[derive(Debug, Clone)]
pub struct ExternalBackend {
    pub executable: PathBuf,
    pub timeout: Duration,
}

impl ExternalBackend {
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    /// Kill the child together with everything it started, then reap it.
    fn kill_and_reap(&self, child: &mut Child) {
        kill_process_group(child);
        if let Err(e) = child.kill() {
            // Already exited between the timeout and the kill
            debug!("kill failed for pid {}: {e}", child.id());
        }
        if let Err(e) = child.wait() {
            warn!("could not reap pid {}: {e}", child.id());
        }
    }
}

/// The child leads its own process group (see `run`), so its pid is the group id.
/// The id stays reserved while the leader is unreaped or any member is alive.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety preconditions.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        debug!(
            "killpg {pgid} failed: {}",
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

/// Read a pipe to the end on its own thread so the child never blocks on a full pipe.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            warn!("output truncated after {} bytes: {e}", buf.len());
        }
        let _ = tx.send(buf);
    });
    rx
}

/// Wait for a drained pipe until `deadline`. `None` means the pipe was still open.
fn collect(rx: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<String> {
    let Some(rx) = rx else {
        return Some(String::new());
    };
    let remaining = deadline
        .saturating_duration_since(Instant::now())
        .max(Duration::from_millis(100));
    rx.recv_timeout(remaining)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

impl Backend for ExternalBackend {
    fn run(&self, source: &Path) -> RunOutcome {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let started = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return RunOutcome::LaunchFailed {
                    reason: format!("could not start '{}': {e}", self.executable.display()),
                };
            }
        };
        debug!("spawned pid {} for {}", child.id(), source.display());

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        let deadline = started + self.timeout;

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                self.kill_and_reap(&mut child);
                debug!("{} timed out after {:?}", source.display(), self.timeout);
                return RunOutcome::TimedOut {
                    limit: self.timeout,
                };
            }
            Err(e) => {
                self.kill_and_reap(&mut child);
                return RunOutcome::LaunchFailed {
                    reason: format!("could not wait on '{}': {e}", self.executable.display()),
                };
            }
        };

        // The child has exited, but a grandchild may still hold the pipes open.
        let (Some(stdout), Some(stderr)) = (collect(stdout, deadline), collect(stderr, deadline))
        else {
            debug!("{} left its output pipes open past the deadline", source.display());
            // The leader is already reaped; signal whatever is left in its group.
            kill_process_group(&child);
            return RunOutcome::TimedOut {
                limit: self.timeout,
            };
        };

        let elapsed = started.elapsed();
        debug!(
            "{} exited with {:?} after {:?}",
            source.display(),
            status.code(),
            elapsed
        );
        RunOutcome::Completed {
            status: status.code(),
            stdout,
            stderr,
            elapsed,
        }
    }
}
