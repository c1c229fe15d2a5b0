// Non-blocking piped execution (unix)
// reason: nix for fcntl/waitpid/killpg, polling loop keeps a single thread
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use docexec_core::application::constants::{
    PIPE_READ_CHUNK_SIZE, POLL_INTERVAL, POST_EXIT_DRAIN_GRACE, SIGNAL_EXIT_BASE,
    STDIN_CHUNK_SIZE, UNKNOWN_EXIT_CODE,
};
use docexec_core::domain::{ExecutionResult, InputSource, ProcessOutcome, ProcessSpawnError};
use docexec_core::port::Invocation;

fn set_nonblocking(fd: RawFd) -> nix::Result<()> {
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

/// One output pipe and everything read from it so far
struct OutputPipe<R> {
    reader: Option<R>,
    buf: Vec<u8>,
}

impl<R: Read + AsRawFd> OutputPipe<R> {
    fn new(reader: Option<R>) -> nix::Result<Self> {
        if let Some(reader) = &reader {
            set_nonblocking(reader.as_raw_fd())?;
        }
        Ok(Self {
            reader,
            buf: Vec::new(),
        })
    }

    /// Read whatever is available without blocking; returns bytes read
    fn pump(&mut self, chunk: &mut [u8]) -> usize {
        let mut total = 0;
        while let Some(reader) = self.reader.as_mut() {
            match reader.read(chunk) {
                Ok(0) => self.reader = None,
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, "Output pipe read failed, closing");
                    self.reader = None;
                }
            }
        }
        total
    }

    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Feeds the input source into the child's stdin in bounded chunks
///
/// Bytes the pipe did not accept stay pending and are written first on the
/// next iteration.
struct InputPump<'a> {
    source: Option<&'a mut InputSource>,
    stdin: Option<ChildStdin>,
    pending: Vec<u8>,
    offset: usize,
}

impl<'a> InputPump<'a> {
    fn new(source: Option<&'a mut InputSource>, stdin: Option<ChildStdin>) -> nix::Result<Self> {
        if let Some(stdin) = &stdin {
            set_nonblocking(stdin.as_raw_fd())?;
        }
        Ok(Self {
            source,
            stdin,
            pending: Vec::with_capacity(STDIN_CHUNK_SIZE),
            offset: 0,
        })
    }

    /// Write at most one chunk; returns whether anything moved
    fn pump(&mut self) -> bool {
        if self.stdin.is_none() {
            return false;
        }

        if self.offset >= self.pending.len() {
            let Some(source) = self.source.as_mut() else {
                self.close();
                return true;
            };
            self.pending.resize(STDIN_CHUNK_SIZE, 0);
            match source.next_chunk(&mut self.pending) {
                Ok(0) => {
                    self.close();
                    return true;
                }
                Ok(n) => {
                    self.pending.truncate(n);
                    self.offset = 0;
                }
                Err(e) => {
                    debug!(error = %e, "Input source read failed, closing stdin");
                    self.close();
                    return true;
                }
            }
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return false;
        };
        match stdin.write(&self.pending[self.offset..]) {
            Ok(n) => {
                self.offset += n;
                n > 0
            }
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                false
            }
            Err(e) => {
                // Usually EPIPE: the child stopped reading
                debug!(error = %e, "Process closed stdin before all input was written");
                self.close();
                true
            }
        }
    }

    fn close(&mut self) {
        self.stdin = None;
        self.pending.clear();
        self.offset = 0;
    }
}

enum Status {
    Running,
    Exited(i32),
    Signaled(Signal),
    Stopped(Signal),
    Unknown,
}

fn poll_status(pid: Pid) -> Status {
    loop {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => return Status::Exited(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Status::Signaled(signal),
            Ok(WaitStatus::Stopped(_, signal)) => return Status::Stopped(signal),
            Ok(_) => return Status::Running,
            Err(Errno::EINTR) => continue,
            Err(e) => {
                warn!(pid = pid.as_raw(), error = %e, "Could not read process status");
                return Status::Unknown;
            }
        }
    }
}

fn signal_group(pid: Pid, signal: Signal) {
    if let Err(e) = killpg(pid, signal) {
        debug!(pid = pid.as_raw(), signal = %signal, error = %e, "Could not signal process group");
    }
}

/// Error text for a failed run that wrote nothing to stderr
///
/// A terminating signal wins over an earlier stop.
fn silent_failure_message(
    term_signal: Option<Signal>,
    stop_signal: Option<Signal>,
    exit_code: i32,
) -> String {
    match (term_signal, stop_signal) {
        (Some(signal), _) => format!("Command terminated by signal {}", signal as i32),
        (None, Some(signal)) => format!("Command stopped by signal {}", signal as i32),
        (None, None) => format!(
            "Command unexpectedly terminated without error message (exit code {})",
            exit_code
        ),
    }
}

/// Run the shell command with non-blocking pipes, enforcing the timeout
pub(crate) fn run_streaming(mut cmd: Command, invocation: Invocation<'_>) -> ExecutionResult {
    let options = invocation.options;
    let command_line = invocation.command_line;

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd.stdin(if invocation.input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let start = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return ExecutionResult::spawn_failed(ProcessSpawnError::new(command_line, e)),
    };
    let pid = Pid::from_raw(child.id() as i32);
    debug!(pid = pid.as_raw(), "Process spawned");

    let pipes = InputPump::new(invocation.input, child.stdin.take()).and_then(|input| {
        Ok((
            input,
            OutputPipe::new(child.stdout.take())?,
            OutputPipe::new(child.stderr.take())?,
        ))
    });
    let (mut input, mut stdout, mut stderr) = match pipes {
        Ok(pipes) => pipes,
        Err(e) => {
            signal_group(pid, Signal::SIGKILL);
            let _ = child.wait();
            return ExecutionResult::spawn_failed(ProcessSpawnError::new(
                command_line,
                format!("failed to configure pipes: {}", e),
            ));
        }
    };

    let deadline = options.timeout.map(|timeout| start + timeout);
    let mut chunk = vec![0u8; PIPE_READ_CHUNK_SIZE];
    let mut term_signal: Option<Signal> = None;
    let mut stop_signal: Option<Signal> = None;
    let mut timed_out = false;
    let mut kill_sent = false;

    let exit_code = loop {
        let mut progress = input.pump();
        progress |= stdout.pump(&mut chunk) > 0;
        progress |= stderr.pump(&mut chunk) > 0;

        match poll_status(pid) {
            Status::Running => {}
            Status::Exited(code) => break code,
            Status::Signaled(signal) => {
                term_signal = Some(signal);
                break SIGNAL_EXIT_BASE + signal as i32;
            }
            Status::Stopped(signal) => {
                debug!(pid = pid.as_raw(), signal = %signal, "Process stopped");
                stop_signal = Some(signal);
            }
            Status::Unknown => break UNKNOWN_EXIT_CODE,
        }

        if let Some(deadline) = deadline {
            let now = Instant::now();
            if !timed_out && now >= deadline {
                info!(
                    pid = pid.as_raw(),
                    timeout = ?options.timeout,
                    "Timeout reached, terminating process group"
                );
                signal_group(pid, Signal::SIGTERM);
                if stop_signal.is_some() {
                    signal_group(pid, Signal::SIGCONT);
                }
                timed_out = true;
            }
            if let Some(grace) = options.force_kill_after {
                if timed_out && !kill_sent && now >= deadline + grace {
                    warn!(pid = pid.as_raw(), "Process ignored SIGTERM, sending SIGKILL");
                    signal_group(pid, Signal::SIGKILL);
                    kill_sent = true;
                }
            }
        }

        if !progress {
            thread::sleep(POLL_INTERVAL);
        }
    };
    input.close();

    // Collect what the process wrote before exiting
    let drain_deadline = Instant::now() + POST_EXIT_DRAIN_GRACE;
    while (stdout.is_open() || stderr.is_open()) && Instant::now() < drain_deadline {
        let read = stdout.pump(&mut chunk) + stderr.pump(&mut chunk);
        if read == 0 && (stdout.is_open() || stderr.is_open()) {
            thread::sleep(POLL_INTERVAL);
        }
    }
    if stdout.is_open() || stderr.is_open() {
        debug!(pid = pid.as_raw(), "Output pipes still open after drain grace, giving up");
    }

    let mut stderr = stderr.into_bytes();
    if exit_code != 0 && String::from_utf8_lossy(&stderr).trim().is_empty() {
        stderr = silent_failure_message(term_signal, stop_signal, exit_code).into_bytes();
    }

    ExecutionResult::from_outcome(
        command_line,
        ProcessOutcome {
            stdout: stdout.into_bytes(),
            stderr,
            exit_code,
            timed_out,
            elapsed: start.elapsed(),
        },
    )
}
