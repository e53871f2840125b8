//! Test utilities for the CatColab live-document workspace
//!
//! - [`MemoryRepo`] / [`MemoryHandle`]: In-memory CRDT repo counting changes
//! - [`FakeBackend`]: Scripted backend with error injection
//! - [`ToyEngine`]: Counting elaboration engine
//! - [`fixtures`]: Documents and judgments
//! - [`wait_for`]: Await a watch condition with a timeout

mod backend;
mod engine;
pub mod fixtures;
mod repo;
mod wait;

pub use backend::{CallCounts, FakeBackend};
pub use engine::{ToyArrow, ToyDiagram, ToyEngine, ToyModel, TOY_THEORY};
pub use repo::{MemoryHandle, MemoryRepo};
pub use wait::{settle, wait_for, WAIT_TIMEOUT};

/// Install a test tracing subscriber once
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
