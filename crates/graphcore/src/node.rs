use crate::{events::LogEmitter, NodeError, Value};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Core trait that all executable node types implement
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique type title (e.g., "Integer Node", "Result Node")
    fn node_type(&self) -> &str;

    /// Static schema of this node type
    fn describe(&self) -> NodeDescriptor;

    /// Compute this node's result from its assembled inputs and parameters.
    ///
    /// May take arbitrary wall-clock time and may block its thread. Each run
    /// is evaluated on a thread of its own.
    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError>;

    /// Schema defaults, keyed by parameter name
    fn default_params(&self) -> HashMap<String, Value> {
        self.describe()
            .parameters
            .into_iter()
            .map(|p| (p.name, p.default))
            .collect()
    }
}

/// Execution context passed to each node
#[derive(Clone)]
pub struct NodeContext {
    /// Id of the node instance within its workflow document
    pub node_id: String,

    /// Values for every declared input slot, unconnected slots hold zero
    pub inputs: HashMap<String, Value>,

    /// Schema defaults overlaid with the document's overrides
    pub params: HashMap<String, Value>,

    /// Freeform log lines for the log channel
    pub logs: LogEmitter,

    /// Tripped when the run's consumer goes away
    pub cancellation: CancellationToken,
}

impl NodeContext {
    pub fn new(node_id: impl Into<String>, logs: LogEmitter) -> Self {
        Self {
            node_id: node_id.into(),
            inputs: HashMap::new(),
            params: HashMap::new(),
            logs,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Input value, zero when the slot is absent
    pub fn input(&self, name: &str) -> Value {
        self.inputs.get(name).cloned().unwrap_or_default()
    }

    /// Parameter value, if present
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Get parameter with default
    pub fn param_or(&self, name: &str, default: Value) -> Value {
        self.params.get(name).cloned().unwrap_or(default)
    }
}

/// Static schema of a node type, as listed by `GET /api/nodes`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDescriptor {
    pub title: String,
    pub category: String,
    pub parameters: Vec<ParameterSpec>,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
}

impl NodeDescriptor {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            parameters: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.inputs.push(PortSpec::new(name, kind));
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.outputs.push(PortSpec::new(name, kind));
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Named input or output slot. The declared type is a UI hint only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Int,
    Float,
    Text,
    Dropdown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub default: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl ParameterSpec {
    pub fn int(name: impl Into<String>, default: i64) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Int,
            default: Value::Integer(default),
            options: None,
        }
    }

    pub fn dropdown(name: impl Into<String>, options: &[&str], default: &str) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Dropdown,
            default: Value::from(default),
            options: Some(options.iter().map(|o| o.to_string()).collect()),
        }
    }
}
