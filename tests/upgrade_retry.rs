// tests/upgrade_retry.rs

mod common;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tfpilot::errors::PilotError;
use tfpilot::fs::mock::MockFileSystem;
use tfpilot::upgrade::UpgradeRetry;
use tfpilot_test_utils::fake_executor::FakeShellExecutor;

use crate::common::*;

const LOCK_FILE_ERROR: &str = "\x1b[31mError:\x1b[0m Inconsistent dependency lock file\n\
    The following dependency selections recorded in the lock file are\n\
    inconsistent with the current configuration:\n";

fn is_init(req: &tfpilot::types::ExecutionRequest) -> bool {
    req.arguments().first().is_some_and(|a| a == "init")
}

#[tokio::test]
async fn success_needs_one_call() {
    init_tracing();

    let (exec, mut log) = FakeShellExecutor::new();
    let engine = engine(exec, MockFileSystem::new());
    let req = request("terragrunt", &["plan"], "/live/app");

    engine.run_with_upgrade_retry(&req).await.unwrap();

    let events = log.drain();
    let calls = started(&events);
    assert_eq!(calls.len(), 1);
    assert!(matches!(events[0], ExecEvent::Started { captured: true, .. }));
}

#[tokio::test]
async fn recurring_signature_retries_exactly_once() {
    init_tracing();

    let (exec, mut log) = FakeShellExecutor::scripted(|req| {
        if is_init(req) {
            FakeRun::ok()
        } else {
            FakeRun::fail(1, LOCK_FILE_ERROR)
        }
    });
    let engine = engine(exec, MockFileSystem::new());
    let dir = Path::new("/live/app");
    let req = request("terragrunt", &["apply", "-auto-approve"], dir);

    let err = with_timeout(engine.run_with_upgrade_retry(&req))
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), Some(1));

    let events = log.drain();
    let calls = started(&events);
    assert_eq!(calls.len(), 3);
    assert!(is_call(calls[0], &["apply", "-auto-approve"], dir));
    assert!(is_call(calls[1], &["init", "--upgrade"], dir));
    assert_eq!(calls[1].executable(), "terragrunt");
    assert!(is_call(calls[2], &["apply", "-auto-approve"], dir));

    let captured: Vec<bool> = events
        .iter()
        .filter_map(|ev| match ev {
            ExecEvent::Started { captured, .. } => Some(*captured),
            ExecEvent::Finished { .. } => None,
        })
        .collect();
    assert_eq!(captured, vec![true, false, false]);
}

#[tokio::test]
async fn retry_after_reinit_can_succeed() {
    init_tracing();

    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&attempts);
    let (exec, mut log) = FakeShellExecutor::scripted(move |req| {
        if is_init(req) {
            return FakeRun::ok();
        }
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            FakeRun::fail(1, "Error: Backend configuration changed")
        } else {
            FakeRun::ok()
        }
    });
    let engine = engine(exec, MockFileSystem::new());
    let req = request("terraform", &["plan"], "/live/app");

    engine.run_with_upgrade_retry(&req).await.unwrap();

    assert_eq!(started(&log.drain()).len(), 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unrelated_failure_never_reinitialises() {
    init_tracing();

    let (exec, mut log) =
        FakeShellExecutor::scripted(|_| FakeRun::fail(2, "Error: Invalid reference\n"));
    let engine = engine(exec, MockFileSystem::new());
    let req = request("terragrunt", &["plan"], "/live/app");

    let err = engine.run_with_upgrade_retry(&req).await.unwrap_err();

    match &err {
        PilotError::CommandFailed { command, dir, code } => {
            assert_eq!(command, "terragrunt plan");
            assert_eq!(dir, Path::new("/live/app"));
            assert_eq!(*code, Some(2));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }

    let events = log.drain();
    let calls = started(&events);
    assert_eq!(calls.len(), 1);
    assert!(calls.iter().all(|req| !is_init(req)));
}

#[tokio::test]
async fn failed_reinit_reports_both_failures() {
    init_tracing();

    let (exec, mut log) = FakeShellExecutor::scripted(|req| {
        if is_init(req) {
            FakeRun::fail(3, "Error: Failed to query available provider packages")
        } else {
            FakeRun::fail(1, "Error: Required plugins are not installed")
        }
    });
    let retry = UpgradeRetry::new(Arc::new(exec));
    let req = request("terragrunt", &["plan"], "/live/app");

    let err = retry.run(&req).await.unwrap_err();

    match &err {
        PilotError::ReinitFailed { reinit, original } => {
            assert_eq!(reinit.exit_code(), Some(3));
            assert_eq!(original.exit_code(), Some(1));
        }
        other => panic!("expected ReinitFailed, got {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("init --upgrade"), "{msg}");
    assert!(msg.contains("terragrunt plan"), "{msg}");

    // Original attempt and the reinit, no retry.
    assert_eq!(started(&log.drain()).len(), 2);
}

#[tokio::test]
async fn concurrent_callers_do_not_interfere() {
    init_tracing();

    let (exec, mut log) = FakeShellExecutor::scripted(|req| {
        if req.working_directory().ends_with("broken") && !is_init(req) {
            FakeRun::fail(1, "Error: Module not installed")
        } else {
            FakeRun::ok()
        }
    });
    let retry = UpgradeRetry::new(Arc::new(exec));
    let ok_req = request("terragrunt", &["plan"], "/live/fine");
    let bad_req = request("terragrunt", &["plan"], "/live/broken");

    let (ok, bad) = tokio::join!(retry.run(&ok_req), retry.run(&bad_req));

    assert!(ok.is_ok());
    assert!(bad.is_err());
    // 1 for the healthy directory; 3 for the broken one.
    assert_eq!(started(&log.drain()).len(), 4);
}
