// src/exec/mod.rs

//! Plain process execution layer.
//!
//! - [`backend`] provides the [`ShellExecutor`] trait and the production
//!   [`RealShellExecutor`], which tests replace with a fake.
//! - [`command`] spawns processes with `tokio::process::Command`, either
//!   streaming output straight through or teeing it into a transcript.
//!
//! Interactive (PTY-attached) execution lives in [`crate::prompt`].

pub mod backend;
pub mod command;

pub use backend::{CapturedRun, ExecFuture, RealShellExecutor, ShellExecutor};
