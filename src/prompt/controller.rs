// src/prompt/controller.rs

//! Interactive execution with automatic prompt answering.
//!
//! Per session there are two tasks next to the child process:
//! - the output pump (blocking thread) echoes filtered output, feeds the
//!   [`PromptAutomaton`] and writes answers into the PTY;
//! - the manual forwarder waits for the one-shot "enter manual mode" signal
//!   and then pipes the operator's keystrokes into the PTY.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::errors::{PilotError, Result};
use crate::prompt::ansi::AnsiFilter;
use crate::prompt::automaton::{PromptAutomaton, Reaction};
use crate::prompt::rules::PromptRule;
use crate::prompt::session::{spawn_input_forwarder, PtySession, RawModeGuard, TerminalSession};
use crate::types::{Answer, ExecutionRequest};

/// PTY read size.
pub const CHUNK_SIZE: usize = 1024;

/// How long to wait for trailing output once the child has exited. A
/// grandchild that inherited the terminal can keep the PTY open.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// What happened during one session, for logging and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PumpSummary {
    pub answered: usize,
    pub manual: bool,
}

/// Drive `term` until it reports end of output.
///
/// Every chunk is echoed to `display` with control sequences removed, then
/// handed to the automaton. `manual_signal` fires at most once, on the
/// first switch to manual mode.
pub fn pump_output<T, D>(
    term: &mut T,
    display: &mut D,
    automaton: &mut PromptAutomaton,
    manual_signal: oneshot::Sender<()>,
) -> io::Result<PumpSummary>
where
    T: TerminalSession + ?Sized,
    D: Write + ?Sized,
{
    let mut summary = PumpSummary::default();
    let mut filter = AnsiFilter::new();
    let mut manual_signal = Some(manual_signal);
    let mut display_ok = true;
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = term.read_chunk(&mut buf)?;
        if n == 0 {
            break;
        }
        let chunk = &buf[..n];

        let shown = filter.filter(chunk);
        if display_ok && !shown.is_empty() {
            if let Err(e) = display.write_all(&shown).and_then(|()| display.flush()) {
                // Keep draining the PTY so the child never blocks on output.
                warn!(error = %e, "cannot echo child output; continuing without display");
                display_ok = false;
            }
        }

        match automaton.on_output(chunk) {
            Reaction::None => {}
            Reaction::Answer { rule, keys } => {
                info!(rule, answer = %keys.trim_end(), "auto-answering prompt");
                match term.write_answer(&keys) {
                    Ok(()) => summary.answered += 1,
                    Err(e) => warn!(rule, error = %e, "failed to write answer to terminal"),
                }
            }
            Reaction::EnterManual { rule } => {
                info!(rule, "confirmation requires the operator; switching to manual input");
                summary.manual = true;
                if let Some(tx) = manual_signal.take() {
                    let _ = tx.send(());
                }
            }
        }
    }

    Ok(summary)
}

/// Run `req` on a PTY, answering known prompts until the operator has to
/// take over. Blocks until the child exits.
pub async fn run_interactive(
    req: &ExecutionRequest,
    rules: Arc<[PromptRule]>,
    default_answer: Answer,
) -> Result<()> {
    info!(
        command = %req.display_command(),
        dir = %req.working_directory().display(),
        default_answer = %default_answer,
        "starting interactive session"
    );

    let mut session = PtySession::spawn(req)?;
    let mut term = session.io()?;
    let input = session.input();

    let (manual_tx, manual_rx) = oneshot::channel::<()>();

    let mut pump = tokio::task::spawn_blocking(move || {
        let mut automaton = PromptAutomaton::new(rules, default_answer);
        let mut stdout = io::stdout();
        pump_output(&mut term, &mut stdout, &mut automaton, manual_tx)
    });

    let forwarder = tokio::spawn(async move {
        match manual_rx.await {
            Ok(()) => {
                let guard = RawModeGuard::enable_if_terminal();
                if let Err(e) = spawn_input_forwarder(io::stdin(), input) {
                    warn!(error = %e, "failed to start stdin forwarder; manual input unavailable");
                }
                Some(guard)
            }
            Err(_) => None,
        }
    });

    let status = session.wait().await;
    session.close();

    match tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut pump).await {
        Ok(Ok(Ok(summary))) => debug!(?summary, "output pump finished"),
        Ok(Ok(Err(e))) => warn!(error = %e, "output pump failed"),
        Ok(Err(e)) => warn!(error = %e, "output pump task panicked"),
        Err(_) => {
            debug!("pty output still open after child exit; detaching reader");
        }
    }

    // A forwarder that already started hands back its raw-mode guard, which
    // restores the terminal when dropped at the end of this function.
    forwarder.abort();
    let _raw_mode = forwarder.await.ok().flatten();

    let status = status?;
    if status.success() {
        info!(command = %req.display_command(), "interactive session finished");
        return Ok(());
    }

    Err(PilotError::CommandFailed {
        command: req.display_command(),
        dir: req.working_directory().to_path_buf(),
        code: i32::try_from(status.exit_code()).ok(),
    })
}


#[cfg(all(test, unix))]
mod pty_tests {
    use super::*;
    use crate::prompt::rules::builtin_rules;

    #[tokio::test]
    async fn answers_a_real_prompt_over_a_pty() {
        // `read` only succeeds if something was typed into the terminal.
        let req = ExecutionRequest::new(
            "sh",
            ["-c", "printf 'Do you want to continue? (y/n) '; read answer; [ \"$answer\" = y ]"],
            std::env::temp_dir(),
        );

        let rules: Arc<[PromptRule]> = builtin_rules().unwrap().into();
        run_interactive(&req, rules, Answer::Yes).await.unwrap();
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported() {
        let req = ExecutionRequest::new("sh", ["-c", "exit 4"], std::env::temp_dir());

        let rules: Arc<[PromptRule]> = builtin_rules().unwrap().into();
        match run_interactive(&req, rules, Answer::No).await {
            Err(PilotError::CommandFailed { code, .. }) => assert_eq!(code, Some(4)),
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }
}
