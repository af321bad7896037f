//! Run a child process while forwarding its merged stdout/stderr line by line.
//!
//! Display and verdict stay apart: lines go to the caller's sink as they
//! arrive, and only the exit status is returned.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Lines queued between the readers and the sink. A slow sink blocks the
/// readers, which in turn blocks the child on its pipe.
pub const LINE_QUEUE_CAPACITY: usize = 16;

/// How long to keep forwarding output after a timed-out child was killed.
pub const KILL_GRACE: Duration = Duration::from_millis(500);

/// How a launched child finished.
#[derive(Debug, Clone, Copy)]
pub struct Exited {
    pub status: ExitStatus,
    pub timed_out: bool,
}

/// Spawn `cmd`, forward every merged output line to `on_line`, then wait.
///
/// The outer `Result` fails only when `on_line` fails. The inner
/// `io::Result` carries spawn and wait errors so callers can turn them into a
/// failed step instead of aborting. Their messages start with
/// `launch command:` or `wait for command:`.
///
/// With `timeout`, the child runs in its own process group (Unix) and the
/// whole group is killed once the deadline passes. Output still in flight is
/// forwarded for at most [`KILL_GRACE`] afterwards.
#[instrument(skip_all, fields(timeout_secs = timeout.map(|t| t.as_secs())))]
pub fn run_merged<F>(
    mut cmd: Command,
    timeout: Option<Duration>,
    mut on_line: F,
) -> Result<io::Result<Exited>>
where
    F: FnMut(&str) -> Result<()>,
{
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if timeout.is_some() {
        own_process_group(&mut cmd);
    }

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Ok(Err(with_context(e, "launch command")));
        }
    };
    let deadline = timeout.map(|t| Instant::now() + t);

    let (tx, rx) = mpsc::sync_channel(LINE_QUEUE_CAPACITY);
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(forward_lines(stderr, tx.clone()));
    }
    // Readers hold the only senders, so the channel disconnects once both
    // streams hit EOF.
    drop(tx);

    let drained = drain_lines(&rx, &mut child, deadline, &mut on_line);
    // Readers blocked on a send fail fast once the receiver is gone.
    drop(rx);

    let drained = match drained {
        Ok(drained) => drained,
        Err(err) => {
            if let Err(e) = kill_tree(&mut child) {
                warn!(err = %e, "failed to kill command after output error");
            }
            let _ = child.wait();
            release_readers(readers, false);
            return Err(err).context("forward command output");
        }
    };

    let waited = wait_for_exit(&mut child, deadline, drained.timed_out)
        .map_err(|e| with_context(e, "wait for command"));
    release_readers(readers, drained.complete);

    if let Ok(exited) = &waited {
        debug!(exit_code = ?exited.status.code(), timed_out = exited.timed_out, "command finished");
    }
    Ok(waited)
}

#[derive(Debug, Clone, Copy)]
struct Drained {
    timed_out: bool,
    /// Every reader reached EOF.
    complete: bool,
}

/// Forward lines to `on_line` until every reader has disconnected, or until
/// [`KILL_GRACE`] after a timeout kill.
fn drain_lines<F>(
    rx: &Receiver<String>,
    child: &mut Child,
    deadline: Option<Instant>,
    on_line: &mut F,
) -> Result<Drained>
where
    F: FnMut(&str) -> Result<()>,
{
    let mut timed_out = false;
    let mut wait_until = deadline;
    loop {
        let next = match wait_until {
            Some(until) => {
                let remaining = until.saturating_duration_since(Instant::now());
                match rx.recv_timeout(remaining) {
                    Ok(line) => Some(line),
                    Err(RecvTimeoutError::Timeout) if timed_out => {
                        warn!("output still open after kill grace period, detaching");
                        return Ok(Drained {
                            timed_out,
                            complete: false,
                        });
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        warn!("command timed out, killing");
                        timed_out = true;
                        if let Err(e) = kill_tree(child) {
                            warn!(err = %e, "failed to kill timed out command");
                        }
                        wait_until = Some(Instant::now() + KILL_GRACE);
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => None,
                }
            }
            None => rx.recv().ok(),
        };

        match next {
            Some(line) => on_line(&line)?,
            None => {
                return Ok(Drained {
                    timed_out,
                    complete: true,
                });
            }
        }
    }
}

fn wait_for_exit(
    child: &mut Child,
    deadline: Option<Instant>,
    already_timed_out: bool,
) -> io::Result<Exited> {
    let deadline = match deadline {
        Some(deadline) if !already_timed_out => deadline,
        _ => {
            let status = child.wait()?;
            return Ok(Exited {
                status,
                timed_out: already_timed_out,
            });
        }
    };

    let remaining = deadline.saturating_duration_since(Instant::now());
    match child.wait_timeout(remaining)? {
        Some(status) => Ok(Exited {
            status,
            timed_out: false,
        }),
        None => {
            warn!("command timed out after closing output, killing");
            kill_tree(child)?;
            let status = child.wait()?;
            Ok(Exited {
                status,
                timed_out: true,
            })
        }
    }
}

#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

/// Kill the child and, on Unix, every process in its group.
#[cfg(unix)]
fn kill_tree(child: &mut Child) -> io::Result<()> {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if let Ok(pid) = i32::try_from(child.id()) {
        match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            Ok(()) => return Ok(()),
            // No group of that id: the child did not get its own group.
            Err(nix::errno::Errno::ESRCH) => {}
            Err(e) => warn!(err = %e, "failed to kill process group"),
        }
    }
    child.kill()
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> io::Result<()> {
    child.kill()
}

fn with_context(err: io::Error, what: &str) -> io::Error {
    io::Error::new(err.kind(), format!("{what}: {err}"))
}

fn forward_lines<R>(reader: R, tx: SyncSender<String>) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(err = %e, "failed to read child output");
                    break;
                }
            }
        }
    })
}

/// Join readers that hit EOF. Readers still blocked on a pipe held open by a
/// surviving descendant are detached; they exit when the pipe closes.
fn release_readers(readers: Vec<thread::JoinHandle<()>>, complete: bool) {
    if !complete {
        debug!(readers = readers.len(), "detaching output readers");
        return;
    }
    for handle in readers {
        if handle.join().is_err() {
            warn!("output reader thread panicked");
        }
    }
}
