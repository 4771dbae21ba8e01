use crate::Value;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

pub type NodeId = String;

/// Workflow document as submitted by the editor or stored by a project.
///
/// Only the node-level fields are interpreted; `wires` is visual edge
/// metadata carried through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub wires: Vec<serde_json::Value>,
}

impl WorkflowDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: NodeEntry) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }
}

/// One placed node in a workflow document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: HashMap<String, Value>,
    /// Input slot name to source node id
    #[serde(default, deserialize_with = "connections_map")]
    pub connections: HashMap<String, NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl NodeEntry {
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            parameters: HashMap::new(),
            connections: HashMap::new(),
            position: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn connect(mut self, input: impl Into<String>, source: impl Into<NodeId>) -> Self {
        self.connections.insert(input.into(), source.into());
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position { x, y });
        self
    }
}

/// Node position in visual editor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<RawId> for NodeId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Integer(i) => i.to_string(),
            RawId::Float(f) => f.to_string(),
        }
    }
}

// Editor DOM data attributes turn numeric-looking ids into numbers.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<NodeId, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(NodeId::from)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn connections_map<'de, D>(deserializer: D) -> Result<HashMap<String, NodeId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<RawId>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(slot, source)| source.map(|s| (slot, NodeId::from(s))))
        .collect())
}
