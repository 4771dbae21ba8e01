// Test node types shared by the runtime integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use graphcore::{
    Node, NodeContext, NodeDescriptor, NodeEntry, NodeError, ParameterSpec, RunEvent,
    RunOutcome, Value, WorkflowDocument,
};
use graphruntime::{GraphRuntime, NodeRegistry, RuntimeConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Counts node body invocations per node id
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<HashMap<String, usize>>>);

impl Calls {
    pub fn record(&self, node_id: &str) {
        *self.0.lock().unwrap().entry(node_id.to_string()).or_default() += 1;
    }

    pub fn count(&self, node_id: &str) -> usize {
        self.0.lock().unwrap().get(node_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.lock().unwrap().values().sum()
    }
}

pub struct ConstNode {
    pub calls: Calls,
}

#[async_trait]
impl Node for ConstNode {
    fn node_type(&self) -> &str {
        "Const"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new("Const", "Input")
            .with_output("output", "int")
            .with_parameter(ParameterSpec::int("value", 1))
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError> {
        self.calls.record(&ctx.node_id);
        Ok(Value::Integer(ctx.param_or("value", Value::Integer(0)).to_i64("value")?))
    }
}

pub struct AddNode {
    pub calls: Calls,
}

#[async_trait]
impl Node for AddNode {
    fn node_type(&self) -> &str {
        "Add"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new("Add", "Math")
            .with_input("a", "int")
            .with_input("b", "int")
            .with_output("output", "int")
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError> {
        self.calls.record(&ctx.node_id);
        let a = ctx.input("a").to_i64("a")?;
        let b = ctx.input("b").to_i64("b")?;
        Ok(Value::Integer(a + b))
    }
}

pub struct FailNode;

#[async_trait]
impl Node for FailNode {
    fn node_type(&self) -> &str {
        "Fail"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new("Fail", "Debug").with_output("output", "int")
    }

    async fn execute(&self, _ctx: NodeContext) -> Result<Value, NodeError> {
        Err(NodeError::ExecutionFailed("boom".to_string()))
    }
}

/// Blocks until released, so a test can observe it while in progress
pub struct GateNode {
    pub gate: Arc<Notify>,
}

#[async_trait]
impl Node for GateNode {
    fn node_type(&self) -> &str {
        "Gate"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new("Gate", "Debug").with_output("output", "int")
    }

    async fn execute(&self, _ctx: NodeContext) -> Result<Value, NodeError> {
        self.gate.notified().await;
        Ok(Value::Integer(99))
    }
}

/// Blocks its thread for `millis`, like a synchronous compute-heavy body
pub struct SlowNode;

#[async_trait]
impl Node for SlowNode {
    fn node_type(&self) -> &str {
        "Slow"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new("Slow", "Debug")
            .with_output("output", "int")
            .with_parameter(ParameterSpec::int("millis", 500))
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError> {
        let millis = ctx.param_or("millis", Value::Integer(500)).to_i64("millis")?;
        std::thread::sleep(Duration::from_millis(millis as u64));
        Ok(Value::Integer(millis))
    }
}

/// Reports itself cancelled although the run is still live
pub struct CancellingNode;

#[async_trait]
impl Node for CancellingNode {
    fn node_type(&self) -> &str {
        "Cancelling"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new("Cancelling", "Debug").with_output("output", "int")
    }

    async fn execute(&self, _ctx: NodeContext) -> Result<Value, NodeError> {
        Err(NodeError::Cancelled)
    }
}

pub struct PanicNode;

#[async_trait]
impl Node for PanicNode {
    fn node_type(&self) -> &str {
        "Panic"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new("Panic", "Debug").with_output("output", "int")
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError> {
        panic!("node {} exploded", ctx.node_id);
    }
}

pub struct SinkNode;

#[async_trait]
impl Node for SinkNode {
    fn node_type(&self) -> &str {
        "Result Node"
    }

    fn describe(&self) -> NodeDescriptor {
        NodeDescriptor::new("Result Node", "Output")
            .with_input("input", "int")
            .with_parameter(ParameterSpec::int("result", 0))
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Value, NodeError> {
        Ok(ctx.input("input"))
    }
}

pub struct Harness {
    pub runtime: GraphRuntime,
    pub calls: Calls,
    pub gate: Arc<Notify>,
}

pub fn harness() -> Harness {
    harness_with_config(RuntimeConfig::default())
}

pub fn harness_with_config(config: RuntimeConfig) -> Harness {
    let calls = Calls::default();
    let gate = Arc::new(Notify::new());

    let mut registry = NodeRegistry::new();
    registry.register(Arc::new(ConstNode {
        calls: calls.clone(),
    }));
    registry.register(Arc::new(AddNode {
        calls: calls.clone(),
    }));
    registry.register(Arc::new(FailNode));
    registry.register(Arc::new(GateNode { gate: gate.clone() }));
    registry.register(Arc::new(SlowNode));
    registry.register(Arc::new(CancellingNode));
    registry.register(Arc::new(PanicNode));
    registry.register(Arc::new(SinkNode));

    Harness {
        runtime: GraphRuntime::with_registry(Arc::new(registry), config),
        calls,
        gate,
    }
}

pub fn document(nodes: Vec<NodeEntry>) -> WorkflowDocument {
    WorkflowDocument {
        nodes,
        wires: Vec::new(),
    }
}

/// Run a document to its end, returning every event and the outcome
pub async fn run(runtime: &GraphRuntime, doc: &WorkflowDocument) -> (Vec<RunEvent>, RunOutcome) {
    let mut events = Vec::new();
    let outcome = runtime
        .run_to_completion(doc, |event| events.push(event.clone()))
        .await
        .expect("fresh token attaches");
    (events, outcome)
}

pub fn position(events: &[RunEvent], wanted: &RunEvent) -> usize {
    events
        .iter()
        .position(|event| event == wanted)
        .unwrap_or_else(|| panic!("missing event {:?}", wanted))
}

pub fn processing(id: &str) -> RunEvent {
    RunEvent::Processing {
        node_id: id.to_string(),
    }
}

pub fn done(id: &str) -> RunEvent {
    RunEvent::Done {
        node_id: id.to_string(),
    }
}
