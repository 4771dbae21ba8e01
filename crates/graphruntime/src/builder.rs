use crate::registry::NodeRegistry;
use graphcore::{Node, NodeDescriptor, NodeId, Value, WorkflowDocument};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::sync::Arc;

/// A node placed in a run's graph, bound to its node type
pub struct NodeInstance {
    pub id: NodeId,
    pub node_type: String,
    /// Schema defaults overlaid with the document's overrides
    pub params: HashMap<String, Value>,
    pub descriptor: NodeDescriptor,
    pub node: Arc<dyn Node>,
}

/// Things the builder dropped instead of failing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// `(node id, type title)` of entries whose type is not registered
    pub unknown_types: Vec<(NodeId, String)>,
    /// `(node id, input slot, source id)` of connections to nodes that were not built
    pub dangling: Vec<(NodeId, String, NodeId)>,
}

/// Graph of node instances owned by a single run.
///
/// Edges point from consumer to producer and carry the consumer's input
/// slot name.
pub struct WorkflowGraph {
    graph: DiGraph<NodeInstance, String>,
    index: HashMap<NodeId, NodeIndex>,
    report: BuildReport,
}

impl WorkflowGraph {
    /// Build the graph for a workflow document.
    ///
    /// Unknown node types and connections to missing nodes are dropped;
    /// affected slots evaluate as unconnected.
    pub fn build(doc: &WorkflowDocument, registry: &NodeRegistry) -> Self {
        let mut graph = DiGraph::new();
        let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();
        let mut winners: HashMap<NodeIndex, usize> = HashMap::new();
        let mut report = BuildReport::default();

        for (position, entry) in doc.nodes.iter().enumerate() {
            let Some(node) = registry.get(&entry.node_type) else {
                tracing::warn!("Skipping node {}: unknown type {}", entry.id, entry.node_type);
                report
                    .unknown_types
                    .push((entry.id.clone(), entry.node_type.clone()));
                continue;
            };

            let descriptor = node.describe();
            let mut params = node.default_params();
            for (key, value) in &entry.parameters {
                if let Some(slot) = params.get_mut(key) {
                    *slot = value.clone();
                }
            }

            let instance = NodeInstance {
                id: entry.id.clone(),
                node_type: entry.node_type.clone(),
                params,
                descriptor,
                node,
            };

            // A repeated id replaces the earlier instance in place
            let idx = match index.get(&entry.id) {
                Some(&idx) => {
                    tracing::warn!("Duplicate node id {}, later entry wins", entry.id);
                    graph[idx] = instance;
                    idx
                }
                None => {
                    let idx = graph.add_node(instance);
                    index.insert(entry.id.clone(), idx);
                    idx
                }
            };
            winners.insert(idx, position);
        }

        let mut wired: Vec<(NodeIndex, usize)> = winners.into_iter().collect();
        wired.sort_by_key(|(_, position)| *position);

        for (idx, position) in wired {
            let entry = &doc.nodes[position];
            for (slot, source) in &entry.connections {
                match index.get(source) {
                    Some(&source_idx) => {
                        graph.add_edge(idx, source_idx, slot.clone());
                    }
                    None => {
                        tracing::debug!(
                            "Input {}.{} wired to missing node {}, left unconnected",
                            entry.id,
                            slot,
                            source
                        );
                        report
                            .dangling
                            .push((entry.id.clone(), slot.clone(), source.clone()));
                    }
                }
            }
        }

        Self {
            graph,
            index,
            report,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&NodeInstance> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    pub fn instance(&self, idx: NodeIndex) -> &NodeInstance {
        &self.graph[idx]
    }

    /// Producer wired to `slot` of the node at `idx`, if any
    pub fn producer(&self, idx: NodeIndex, slot: &str) -> Option<NodeIndex> {
        self.graph
            .edges(idx)
            .find(|edge| edge.weight() == slot)
            .map(|edge| edge.target())
    }

    /// Instances of the sink type, in document order
    pub fn sinks(&self, sink_type: &str) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].node_type == sink_type)
            .collect()
    }

    /// Id of a node on a cycle, if the graph has any.
    ///
    /// Static check over every edge; a run only fails on cycles reachable
    /// from its sinks.
    pub fn find_cycle(&self) -> Option<NodeId> {
        toposort(&self.graph, None)
            .err()
            .map(|cycle| self.graph[cycle.node_id()].id.clone())
    }
}
