// src/upgrade/mod.rs

//! Upgrade-retry wrapper.
//!
//! - [`signatures`] lists the output fragments that call for
//!   `init --upgrade`.
//! - [`retry`] runs a command with at most one reinit-and-retry.

pub mod retry;
pub mod signatures;

pub use retry::{RetryState, UpgradeRetry, REINIT_ARGS};
pub use signatures::{find_upgrade_signature, UPGRADE_SIGNATURES};
