use graphcore::{Node, NodeDescriptor};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available node types, keyed by type title
pub struct NodeRegistry {
    nodes: Vec<Arc<dyn Node>>,
    index: HashMap<String, usize>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a node type.
    ///
    /// A title that is already registered is replaced in place, and the
    /// previous implementation is returned.
    pub fn register(&mut self, node: Arc<dyn Node>) -> Option<Arc<dyn Node>> {
        let node_type = node.node_type().to_string();
        match self.index.get(&node_type) {
            Some(&slot) => {
                tracing::warn!("Node type {} registered twice, last registration wins", node_type);
                Some(std::mem::replace(&mut self.nodes[slot], node))
            }
            None => {
                tracing::info!("Registering node type: {}", node_type);
                self.index.insert(node_type, self.nodes.len());
                self.nodes.push(node);
                None
            }
        }
    }

    /// Look up a node type by title
    pub fn get(&self, node_type: &str) -> Option<Arc<dyn Node>> {
        self.index.get(node_type).map(|&slot| self.nodes[slot].clone())
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.index.contains_key(node_type)
    }

    /// Get all registered node types, in registration order
    pub fn list_node_types(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.node_type().to_string()).collect()
    }

    /// Descriptors of every registered type, in registration order
    pub fn descriptors(&self) -> Vec<NodeDescriptor> {
        self.nodes.iter().map(|n| n.describe()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
