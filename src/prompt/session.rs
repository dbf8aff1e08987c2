// src/prompt/session.rs

//! Pseudo-terminal session management.
//!
//! The child is spawned on a PTY (via `portable-pty`) so it believes it is
//! talking to a human and prints its confirmation prompts instead of
//! failing or defaulting. The master end is used both for reading the
//! child's output and for injecting keystrokes.

use std::io::{self, IsTerminal, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use anyhow::anyhow;
use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use tracing::{debug, warn};

use crate::errors::{PilotError, Result};
use crate::types::ExecutionRequest;

const DEFAULT_ROWS: u16 = 24;
const DEFAULT_COLS: u16 = 80;
const STDIN_CHUNK: usize = 1024;

/// Read/answer capability of a terminal the prompt controller drives.
///
/// Implemented over a real PTY by [`PtyIo`]; tests provide scripted
/// terminals.
pub trait TerminalSession {
    /// Blocking read of the next output chunk. `Ok(0)` means the child side
    /// is gone.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Type `keys` into the child's terminal.
    fn write_answer(&mut self, keys: &str) -> io::Result<()>;
}

/// Cloneable handle on the PTY input side.
///
/// Shared between the output reader (auto-answers) and the manual-mode
/// stdin forwarder. Writes fail with `BrokenPipe` once the session closed.
#[derive(Clone)]
pub struct PtyInput {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    closed: Arc<AtomicBool>,
}

impl PtyInput {
    fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn with_writer<T>(
        &self,
        f: impl FnOnce(&mut Box<dyn Write + Send>) -> io::Result<T>,
    ) -> io::Result<T> {
        if self.is_closed() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pty session closed"));
        }
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("pty writer lock poisoned"))?;
        f(&mut *guard)
    }
}

impl Write for PtyInput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_writer(|w| w.write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        // One lock for the whole write so keystrokes and answers never
        // interleave mid-sequence.
        self.with_writer(|w| {
            w.write_all(buf)?;
            w.flush()
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_writer(|w| w.flush())
    }
}

/// Reader + input pair handed to the output pump.
pub struct PtyIo {
    reader: Box<dyn Read + Send>,
    input: PtyInput,
}

impl TerminalSession for PtyIo {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.reader.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // Linux reports EIO on the master once the child closed
                    // its side; treat every read error as end of output.
                    debug!(error = %e, "pty read ended");
                    return Ok(0);
                }
            }
        }
    }

    fn write_answer(&mut self, keys: &str) -> io::Result<()> {
        self.input.write_all(keys.as_bytes())
    }
}

/// A child process running in a pseudo-terminal.
///
/// Owned exclusively by one interactive invocation. Dropping the session
/// kills a still-running child and closes the master side.
pub struct PtySession {
    master: Option<Box<dyn MasterPty + Send>>,
    child: Option<Box<dyn Child + Send + Sync>>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    input: PtyInput,
    exited: bool,
    command: String,
}

impl PtySession {
    /// Spawn `req` on a fresh PTY sized like the real terminal.
    pub fn spawn(req: &ExecutionRequest) -> Result<Self> {
        let command = req.display_command();
        let launch_error = |reason: String| PilotError::Launch {
            command: command.clone(),
            reason,
        };

        let pair = native_pty_system()
            .openpty(terminal_size())
            .map_err(|e| launch_error(format!("opening pseudo-terminal: {e}")))?;

        let mut builder = CommandBuilder::new(req.executable());
        builder.args(req.arguments());
        builder.cwd(req.working_directory());

        let child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| launch_error(e.to_string()))?;
        // Only the child may hold the slave, so reads see EOF when it exits.
        drop(pair.slave);

        let killer = child.clone_killer();
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| launch_error(format!("attaching pty input: {e}")))?;

        debug!(command = %command, pid = ?child.process_id(), "pty child spawned");

        Ok(Self {
            master: Some(pair.master),
            child: Some(child),
            killer,
            input: PtyInput::new(writer),
            exited: false,
            command,
        })
    }

    /// Independent reader plus a shared input handle.
    pub fn io(&self) -> Result<PtyIo> {
        let master = self
            .master
            .as_ref()
            .ok_or_else(|| PilotError::Other(anyhow!("pty session already closed")))?;
        let reader = master.try_clone_reader().map_err(PilotError::Other)?;
        Ok(PtyIo {
            reader,
            input: self.input.clone(),
        })
    }

    pub fn input(&self) -> PtyInput {
        self.input.clone()
    }

    /// Block (on a worker thread) until the child exits.
    pub async fn wait(&mut self) -> Result<portable_pty::ExitStatus> {
        let mut child = self
            .child
            .take()
            .ok_or_else(|| PilotError::Other(anyhow!("pty child already waited on")))?;

        let status = tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(anyhow::Error::from)??;

        self.exited = true;
        debug!(command = %self.command, exit_code = status.exit_code(), "pty child exited");
        Ok(status)
    }

    /// Release the PTY. Idempotent.
    pub fn close(&mut self) {
        self.input.mark_closed();
        if !self.exited {
            if let Err(e) = self.killer.kill() {
                debug!(command = %self.command, error = %e, "killing pty child failed (already gone?)");
            }
            self.exited = true;
        }
        self.master.take();
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.close();
    }
}

fn terminal_size() -> PtySize {
    let (cols, rows) = if io::stdout().is_terminal() {
        crossterm::terminal::size().unwrap_or((DEFAULT_COLS, DEFAULT_ROWS))
    } else {
        (DEFAULT_COLS, DEFAULT_ROWS)
    };
    PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// Puts the real terminal into raw mode while the operator drives the
/// child, so every keystroke reaches the PTY unprocessed. Restores on drop.
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn enable_if_terminal() -> Self {
        if !io::stdin().is_terminal() {
            return Self { active: false };
        }
        match crossterm::terminal::enable_raw_mode() {
            Ok(()) => Self { active: true },
            Err(e) => {
                warn!(error = %e, "could not switch terminal to raw mode; input will be line-buffered");
                Self { active: false }
            }
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = crossterm::terminal::disable_raw_mode() {
                warn!(error = %e, "failed to restore terminal mode");
            }
        }
    }
}

/// Forward `source` (the real stdin in production) to the PTY byte for
/// byte until it ends or the session closes.
///
/// Runs on a detached OS thread: a blocking stdin read cannot be
/// cancelled, and a Tokio blocking task would hold up runtime shutdown.
/// The handle yields the number of bytes forwarded.
pub fn spawn_input_forwarder<R>(source: R, input: PtyInput) -> io::Result<JoinHandle<u64>>
where
    R: Read + Send + 'static,
{
    std::thread::Builder::new()
        .name("tfpilot-stdin".to_string())
        .spawn(move || forward_input(source, input))
}

fn forward_input<R: Read>(mut source: R, mut input: PtyInput) -> u64 {
    let mut buf = [0u8; STDIN_CHUNK];
    let mut forwarded = 0u64;
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(error = %e, "input read failed; stopping forwarder");
                break;
            }
        };
        if input.is_closed() {
            break;
        }
        if let Err(e) = input.write_all(&buf[..n]) {
            debug!(error = %e, "pty input closed; stopping forwarder");
            break;
        }
        forwarded += n as u64;
    }
    forwarded
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// In-memory PTY input side that can be inspected after the writer has
    /// been handed to a `PtyInput`.
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl SharedSink {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn input_over(sink: &SharedSink) -> PtyInput {
        PtyInput::new(Box::new(sink.clone()))
    }

    #[test]
    fn keystrokes_reach_the_pty_unchanged() {
        let sink = SharedSink::default();
        let keys: &[u8] = b"yes\r\x1b[A\x03\xff\x00";

        let handle = spawn_input_forwarder(Cursor::new(keys.to_vec()), input_over(&sink)).unwrap();

        assert_eq!(handle.join().unwrap(), keys.len() as u64);
        assert_eq!(sink.contents(), keys);
    }

    #[test]
    fn large_input_is_forwarded_across_chunks() {
        let sink = SharedSink::default();
        let keys: Vec<u8> = (0..=255u8).cycle().take(STDIN_CHUNK * 3 + 7).collect();

        let forwarded = forward_input(Cursor::new(keys.clone()), input_over(&sink));

        assert_eq!(forwarded, keys.len() as u64);
        assert_eq!(sink.contents(), keys);
    }

    #[test]
    fn closed_input_rejects_writes_and_stops_forwarding() {
        let sink = SharedSink::default();
        let mut input = input_over(&sink);
        input.write_all(b"n\r").unwrap();

        input.mark_closed();

        let err = input.write_all(b"y\r").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(forward_input(Cursor::new(b"more".to_vec()), input.clone()), 0);
        assert_eq!(sink.contents(), b"n\r");
    }

    #[test]
    fn clones_share_the_closed_flag() {
        let sink = SharedSink::default();
        let input = input_over(&sink);
        let mut other = input.clone();

        input.mark_closed();

        assert!(other.is_closed());
        assert!(other.flush().is_err());
    }
}
