//! Child-process plumbing for the command-backed generator.
//!
//! The prompt goes in on stdin, the completion comes back on stdout, and the
//! whole exchange is bounded by a deadline and a byte budget per stream.

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

const READ_CHUNK: usize = 8 * 1024;
/// How long pipe threads get to finish once the child has been killed.
const KILL_GRACE: Duration = Duration::from_millis(200);
const SETTLE_POLL: Duration = Duration::from_millis(10);

/// Bytes kept from one output stream, plus how many were dropped past the limit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Capture {
    pub bytes: Vec<u8>,
    pub dropped: usize,
}

impl Capture {
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }
}

/// Result of one exchange with a child process.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Capture,
    pub stderr: Capture,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Last non-empty stderr line, for compact error messages.
    pub fn stderr_tail(&self) -> String {
        String::from_utf8_lossy(&self.stderr.bytes)
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// Spawn `cmd`, feed it `stdin`, and collect its output until exit or `timeout`.
///
/// Both pipes are drained on their own threads while the child runs, so a
/// chatty child cannot block on a full pipe. A child still running at the
/// deadline is killed and reported with `timed_out`. Its descendants are not
/// killed; any pipe they keep open is abandoned after a short grace period,
/// so the call returns close to the deadline with whatever output had been
/// read. A child that exits without reading all of `stdin` is not an error.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd.spawn().context("spawn command")?;
    debug!(pid = child.id(), "child spawned");

    let stdout = drain(child.stdout.take(), "stdout", output_limit_bytes)?;
    let stderr = drain(child.stderr.take(), "stderr", output_limit_bytes)?;

    // Fed from a thread so a child that never reads stdin still hits the deadline.
    let feeder = match stdin {
        Some(input) => {
            let pipe = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("stdin was not piped"))?;
            let input = input.to_vec();
            Some(thread::spawn(move || feed(pipe, &input)))
        }
        None => None,
    };

    let (status, timed_out) = wait_or_kill(&mut child, timeout)?;
    let output = if timed_out {
        // Descendants of the killed child may still hold the pipes open.
        if let Some(handle) = feeder {
            let _ = settle(handle, "stdin");
        }
        CommandOutput {
            status,
            stdout: settle(stdout, "stdout").unwrap_or_default(),
            stderr: settle(stderr, "stderr").unwrap_or_default(),
            timed_out,
        }
    } else {
        if let Some(handle) = feeder {
            handle
                .join()
                .map_err(|_| anyhow!("stdin writer thread panicked"))??;
        }
        CommandOutput {
            status,
            stdout: collect(stdout, "stdout")?,
            stderr: collect(stderr, "stderr")?,
            timed_out,
        }
    };

    if output.stdout.is_truncated() || output.stderr.is_truncated() {
        warn!(
            stdout_dropped = output.stdout.dropped,
            stderr_dropped = output.stderr.dropped,
            "output truncated"
        );
    }
    debug!(exit_code = ?status.code(), timed_out, "child finished");
    Ok(output)
}

/// Write the whole input, then close the pipe so the child sees EOF.
fn feed(mut pipe: ChildStdin, input: &[u8]) -> Result<()> {
    match pipe.write_all(input) {
        Err(err) if err.kind() == ErrorKind::BrokenPipe => {
            debug!("child closed stdin early");
            Ok(())
        }
        other => other.context("write stdin"),
    }
}

fn wait_or_kill(child: &mut Child, timeout: Duration) -> Result<(ExitStatus, bool)> {
    if let Some(status) = child.wait_timeout(timeout).context("wait for command")? {
        return Ok((status, false));
    }
    warn!(timeout_secs = timeout.as_secs(), "deadline reached, killing child");
    child.kill().context("kill command")?;
    let status = child.wait().context("wait for killed command")?;
    Ok((status, true))
}

fn drain<R: Read + Send + 'static>(
    stream: Option<R>,
    name: &str,
    limit: usize,
) -> Result<JoinHandle<Result<Capture>>> {
    let stream = stream.ok_or_else(|| anyhow!("{name} was not piped"))?;
    Ok(thread::spawn(move || read_capped(stream, limit)))
}

fn collect(handle: JoinHandle<Result<Capture>>, name: &str) -> Result<Capture> {
    handle
        .join()
        .map_err(|_| anyhow!("{name} reader thread panicked"))?
        .with_context(|| format!("read {name}"))
}

/// Join a pipe thread that finishes within `KILL_GRACE`, otherwise detach it.
///
/// Used after a kill: a grandchild can keep the pipe open long after the
/// direct child is gone, and the deadline must not wait on it.
fn settle<T>(handle: JoinHandle<Result<T>>, name: &str) -> Option<T> {
    let give_up = Instant::now() + KILL_GRACE;
    while !handle.is_finished() {
        if Instant::now() >= give_up {
            warn!(stream = name, "pipe still held by a descendant, abandoning it");
            return None;
        }
        thread::sleep(SETTLE_POLL);
    }
    match handle.join() {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            debug!(stream = name, error = %format!("{err:#}"), "pipe error after kill");
            None
        }
        Err(_) => {
            warn!(stream = name, "pipe thread panicked after kill");
            None
        }
    }
}

/// Read to EOF, keeping at most `limit` bytes.
fn read_capped<R: Read>(mut reader: R, limit: usize) -> Result<Capture> {
    let mut capture = Capture::default();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            return Ok(capture);
        }
        let keep = n.min(limit.saturating_sub(capture.bytes.len()));
        capture.bytes.extend_from_slice(&chunk[..keep]);
        capture.dropped += n - keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_capped_counts_dropped_bytes() {
        let capture = read_capped(&b"abcdefghij"[..], 4).expect("read");
        assert_eq!(capture.bytes, b"abcd");
        assert_eq!(capture.dropped, 6);
        assert!(capture.is_truncated());

        let capture = read_capped(&b"abc"[..], 4).expect("read");
        assert_eq!(capture.bytes, b"abc");
        assert!(!capture.is_truncated());
    }

    #[cfg(unix)]
    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[cfg(unix)]
    #[test]
    fn prompt_round_trips_through_cat() {
        let output = run_command_with_timeout(
            sh("cat"),
            Some(b"Is tea better than coffee?"),
            Duration::from_secs(5),
            1024,
        )
        .expect("run");
        assert!(output.status.success());
        assert_eq!(output.stdout.bytes, b"Is tea better than coffee?");
        assert!(!output.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn child_ignoring_stdin_is_not_an_error() {
        let prompt = vec![b'x'; 256 * 1024];
        let output = run_command_with_timeout(
            sh("echo factual"),
            Some(prompt.as_slice()),
            Duration::from_secs(5),
            1024,
        )
        .expect("run");
        assert!(output.status.success());
        assert_eq!(output.stdout.bytes, b"factual\n");
    }

    #[cfg(unix)]
    #[test]
    fn deadline_covers_child_that_never_reads_stdin() {
        let prompt = vec![b'x'; 256 * 1024];
        let output = run_command_with_timeout(
            sh("exec sleep 5"),
            Some(prompt.as_slice()),
            Duration::from_millis(100),
            1024,
        )
        .expect("run");
        assert!(output.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn kills_child_after_timeout() {
        let output =
            run_command_with_timeout(sh("exec sleep 5"), None, Duration::from_millis(100), 1024)
                .expect("run");
        assert!(output.timed_out);
        assert!(!output.status.success());
    }

    #[cfg(unix)]
    #[test]
    fn deadline_holds_when_grandchild_keeps_pipes_open() {
        let started = Instant::now();
        let output = run_command_with_timeout(
            sh("sleep 3; echo hi"),
            None,
            Duration::from_millis(200),
            1024,
        )
        .expect("run");
        assert!(output.timed_out);
        assert!(output.stdout.bytes.is_empty());
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "returned after {:?}",
            started.elapsed()
        );
    }

    #[cfg(unix)]
    #[test]
    fn stderr_tail_reports_last_line() {
        let output = run_command_with_timeout(
            sh("echo first >&2; echo 'quota exceeded' >&2; exit 3"),
            None,
            Duration::from_secs(5),
            1024,
        )
        .expect("run");
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stderr_tail(), "quota exceeded");
    }
}
