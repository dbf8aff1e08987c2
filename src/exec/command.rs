// src/exec/command.rs

//! Plain (non-PTY) process execution on top of `tokio::process`.

use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::{PilotError, Result};
use crate::types::ExecutionRequest;

use super::backend::CapturedRun;

const READ_CHUNK: usize = 4096;

fn build_command(req: &ExecutionRequest) -> Command {
    let mut cmd = Command::new(req.executable());
    cmd.args(req.arguments())
        .current_dir(req.working_directory())
        .kill_on_drop(true);
    cmd
}

fn spawn(mut cmd: Command, req: &ExecutionRequest) -> Result<Child> {
    cmd.spawn().map_err(|e| PilotError::Launch {
        command: req.display_command(),
        reason: e.to_string(),
    })
}

fn check_status(req: &ExecutionRequest, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    Err(PilotError::CommandFailed {
        command: req.display_command(),
        dir: req.working_directory().to_path_buf(),
        code: status.code(),
    })
}

/// Run with stdio inherited from this process.
pub async fn run_streaming(req: &ExecutionRequest) -> Result<()> {
    info!(
        command = %req.display_command(),
        dir = %req.working_directory().display(),
        "running command"
    );

    let mut cmd = build_command(req);
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let mut child = spawn(cmd, req)?;
    let status = child.wait().await?;

    debug!(
        command = %req.display_command(),
        exit_code = ?status.code(),
        success = status.success(),
        "command exited"
    );

    check_status(req, status)
}

/// Run with stdout/stderr piped: each chunk is echoed to the matching real
/// stream and appended to one combined transcript.
pub async fn run_captured(req: &ExecutionRequest) -> Result<CapturedRun> {
    info!(
        command = %req.display_command(),
        dir = %req.working_directory().display(),
        "running command (capturing output)"
    );

    let mut cmd = build_command(req);
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = spawn(cmd, req)?;

    let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    let stdout_pump = child
        .stdout
        .take()
        .map(|out| tokio::spawn(tee(out, tokio::io::stdout(), chunk_tx.clone())));
    let stderr_pump = child
        .stderr
        .take()
        .map(|err| tokio::spawn(tee(err, tokio::io::stderr(), chunk_tx.clone())));
    drop(chunk_tx);

    // Drain concurrently with the child so neither pipe can fill up.
    let collector = tokio::spawn(async move {
        let mut transcript = Vec::new();
        while let Some(chunk) = chunk_rx.recv().await {
            transcript.extend_from_slice(&chunk);
        }
        transcript
    });

    let status = child.wait().await?;

    for pump in [stdout_pump, stderr_pump].into_iter().flatten() {
        if let Err(e) = pump.await {
            debug!(error = %e, "output pump task ended abnormally");
        }
    }
    let transcript = collector.await.map_err(anyhow::Error::from)?;

    debug!(
        command = %req.display_command(),
        exit_code = ?status.code(),
        success = status.success(),
        captured_bytes = transcript.len(),
        "command exited"
    );

    Ok(CapturedRun {
        exit_code: status.code(),
        success: status.success(),
        output: String::from_utf8_lossy(&transcript).into_owned(),
    })
}

/// Copy `reader` to `sink` chunk by chunk, forwarding each chunk to `tx`.
///
/// Echo failures (e.g. a closed console) do not stop capturing.
async fn tee<R, W>(mut reader: R, mut sink: W, tx: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = &buf[..n];
                if sink.write_all(chunk).await.is_ok() {
                    let _ = sink.flush().await;
                }
                if tx.send(chunk.to_vec()).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "error reading child output");
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captured_run_collects_both_streams() {
        let req = ExecutionRequest::new(
            "sh",
            ["-c", "echo out; echo err 1>&2; exit 3"],
            std::env::temp_dir(),
        );

        let run = run_captured(&req).await.unwrap();

        assert!(!run.success);
        assert_eq!(run.exit_code, Some(3));
        assert!(run.output.contains("out"));
        assert!(run.output.contains("err"));
    }

    #[tokio::test]
    async fn streaming_run_maps_exit_code_to_error() {
        let req = ExecutionRequest::new("sh", ["-c", "exit 7"], std::env::temp_dir());

        match run_streaming(&req).await {
            Err(PilotError::CommandFailed { code, .. }) => assert_eq!(code, Some(7)),
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_executable_is_a_launch_failure() {
        let req = ExecutionRequest::new(
            "tfpilot-definitely-not-installed",
            Vec::<String>::new(),
            std::env::temp_dir(),
        );

        assert!(matches!(
            run_streaming(&req).await,
            Err(PilotError::Launch { .. })
        ));
    }
}
