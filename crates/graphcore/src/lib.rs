//! Core abstractions for the graph engine
//!
//! This crate provides the value model, the node trait and its schema,
//! the workflow document and the events every other crate speaks.

mod error;
pub mod events;
mod node;
mod value;
mod workflow;

pub use error::{GraphError, NodeError, SessionError, WorkflowError};
pub use events::*;
pub use node::{Node, NodeContext, NodeDescriptor, ParameterKind, ParameterSpec, PortSpec};
pub use value::{Number, Value};
pub use workflow::{NodeEntry, NodeId, Position, WorkflowDocument};
