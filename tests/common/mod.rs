// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use tfpilot::config::{ConfigFile, RawConfigFile};
use tfpilot::engine::{Engine, EngineConfig};
use tfpilot::fs::FileSystem;
use tfpilot_test_utils::fake_executor::FakeShellExecutor;

pub use tfpilot_test_utils::builders::{args, request, ModuleTreeBuilder};
pub use tfpilot_test_utils::fake_executor::{
    is_call, max_in_flight, started, started_dirs, ExecEvent, ExecLog, FakeRun,
};
pub use tfpilot_test_utils::{init_tracing, with_timeout};

/// Engine with default configuration around a fake executor.
pub fn engine(exec: FakeShellExecutor, fs: impl FileSystem + 'static) -> Engine {
    let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
    Engine::new(
        EngineConfig::from_config(&cfg, "0.0.0-test"),
        Arc::new(exec),
        Arc::new(fs),
    )
    .unwrap()
}
