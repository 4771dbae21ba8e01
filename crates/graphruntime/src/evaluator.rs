use crate::builder::WorkflowGraph;
use futures::future::{BoxFuture, FutureExt};
use graphcore::{
    GraphError, LogBus, NodeContext, NodeError, NodeId, RunEvent, RunOutcome, Value,
    WorkflowError,
};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Evaluates one run's graph from its sinks, memoizing every node result.
///
/// Each node body runs at most once. `Processing` is sent before the body
/// starts and `Done` after its result is stored, so a consumer of the
/// channel sees a slow node as in progress.
pub struct Evaluator<'g> {
    graph: &'g WorkflowGraph,
    events: mpsc::Sender<RunEvent>,
    logs: LogBus,
    cancellation: CancellationToken,
    memo: HashMap<NodeIndex, Value>,
    in_progress: HashSet<NodeIndex>,
    order: Vec<NodeId>,
    failures: HashMap<NodeId, String>,
}

impl<'g> Evaluator<'g> {
    pub fn new(
        graph: &'g WorkflowGraph,
        events: mpsc::Sender<RunEvent>,
        logs: LogBus,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            graph,
            events,
            logs,
            cancellation,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
            order: Vec::new(),
            failures: HashMap::new(),
        }
    }

    /// Evaluate every sink and return the full memo table with the completion order
    pub async fn evaluate(mut self, sinks: &[NodeIndex]) -> Result<RunOutcome, GraphError> {
        for &sink in sinks {
            self.evaluate_node(sink).await?;
        }

        let graph = self.graph;
        let results = self
            .memo
            .into_iter()
            .map(|(idx, value)| (graph.instance(idx).id.clone(), value))
            .collect();

        Ok(RunOutcome {
            order: self.order,
            results,
            error: None,
            failures: self.failures,
        })
    }

    fn evaluate_node(&mut self, idx: NodeIndex) -> BoxFuture<'_, Result<Value, GraphError>> {
        async move {
            if let Some(value) = self.memo.get(&idx) {
                return Ok(value.clone());
            }

            let graph = self.graph;
            let instance = graph.instance(idx);

            if !self.in_progress.insert(idx) {
                return Err(WorkflowError::CyclicDependency(instance.id.clone()).into());
            }

            let mut inputs = HashMap::new();
            for port in &instance.descriptor.inputs {
                let value = match graph.producer(idx, &port.name) {
                    Some(producer) => self.evaluate_node(producer).await?,
                    None => Value::default(),
                };
                inputs.insert(port.name.clone(), value);
            }

            if self.cancellation.is_cancelled() {
                return Err(NodeError::Cancelled.into());
            }

            self.emit(RunEvent::Processing {
                node_id: instance.id.clone(),
            })
            .await?;

            let ctx = NodeContext {
                node_id: instance.id.clone(),
                inputs,
                params: instance.params.clone(),
                logs: self.logs.emitter(instance.id.clone()),
                cancellation: self.cancellation.child_token(),
            };

            let start = Instant::now();
            let result = tokio::select! {
                result = instance.node.execute(ctx) => result,
                _ = self.cancellation.cancelled() => Err(NodeError::Cancelled),
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            let value = match result {
                Ok(value) => {
                    tracing::debug!("Node {} completed in {}ms", instance.id, duration_ms);
                    value
                }
                Err(NodeError::Cancelled) if self.cancellation.is_cancelled() => {
                    return Err(NodeError::Cancelled.into())
                }
                Err(e) => {
                    tracing::warn!("Node {} failed, using fallback value: {}", instance.id, e);
                    self.logs
                        .emitter(instance.id.clone())
                        .error(format!("{} failed: {}", instance.node_type, e));
                    self.failures.insert(instance.id.clone(), e.to_string());
                    Value::default()
                }
            };

            self.in_progress.remove(&idx);
            self.memo.insert(idx, value.clone());
            self.order.push(instance.id.clone());

            self.emit(RunEvent::Done {
                node_id: instance.id.clone(),
            })
            .await?;

            Ok(value)
        }
        .boxed()
    }

    async fn emit(&self, event: RunEvent) -> Result<(), GraphError> {
        // A closed channel means nobody is draining this run anymore
        self.events
            .send(event)
            .await
            .map_err(|_| GraphError::Node(NodeError::Cancelled))
    }
}

/// Drive a run to its terminal event.
///
/// Exactly one `End` is sent unless the consumer is already gone.
pub async fn execute_run(
    graph: WorkflowGraph,
    sink_type: &str,
    events: mpsc::Sender<RunEvent>,
    logs: LogBus,
    cancellation: CancellationToken,
) {
    let sinks = graph.sinks(sink_type);
    let evaluator = Evaluator::new(&graph, events.clone(), logs.clone(), cancellation);
    let start = Instant::now();

    let outcome = match evaluator.evaluate(&sinks).await {
        Ok(outcome) => {
            tracing::info!(
                "Run completed: {} nodes in {}ms",
                outcome.order.len(),
                start.elapsed().as_millis()
            );
            outcome
        }
        Err(GraphError::Node(NodeError::Cancelled)) => {
            tracing::info!("Run abandoned by its consumer");
            return;
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            logs.emitter("engine").error(format!("Run failed: {}", e));
            RunOutcome::failed(e.to_string())
        }
    };

    let _ = events.send(RunEvent::End(outcome)).await;
}
