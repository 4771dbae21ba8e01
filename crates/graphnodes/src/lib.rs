//! Standard node library
//!
//! Collection of built-in nodes for integer inputs, arithmetic, debugging
//! and results

mod debug;
mod input;
pub mod math;
mod result;

pub use debug::DebugNode;
pub use input::IntegerNode;
pub use math::{BasicMathNode, ExpMathNode};
pub use result::ResultNode;
use graphruntime::NodeRegistry;

use std::sync::Arc;

/// Register all standard nodes with a registry
pub fn register_all(registry: &mut NodeRegistry) {
    registry.register(Arc::new(input::IntegerNode));
    registry.register(Arc::new(math::BasicMathNode));
    registry.register(Arc::new(math::ExpMathNode));
    registry.register(Arc::new(debug::DebugNode));
    registry.register(Arc::new(result::ResultNode));
}

/// A registry holding the standard nodes
pub fn standard_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_all(&mut registry);
    registry
}
