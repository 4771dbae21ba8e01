//! Workflow execution runtime
//!
//! This crate builds run graphs from workflow documents, evaluates them
//! from their sink nodes, keeps submitted runs under single-use tokens
//! and encodes their progress as event streams.

mod builder;
mod evaluator;
mod registry;
mod runtime;
mod session;
pub mod store;
pub mod stream;

pub use builder::{BuildReport, NodeInstance, WorkflowGraph};
pub use evaluator::{execute_run, Evaluator};
pub use registry::NodeRegistry;
pub use runtime::{GraphRuntime, RuntimeConfig};
pub use session::{SessionGuard, SessionManager, SessionStatus};
pub use store::{ProjectStore, ProjectSummary, StoreError};
pub use stream::RunStream;
