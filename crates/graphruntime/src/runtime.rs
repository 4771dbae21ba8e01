use crate::registry::NodeRegistry;
use crate::session::{SessionManager, SessionStatus};
use crate::stream::RunStream;
use futures::StreamExt;
use graphcore::{
    LogBus, LogLine, NodeDescriptor, RunEvent, RunOutcome, SessionError,
    WorkflowDocument,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Main runtime for executing workflow documents
pub struct GraphRuntime {
    registry: Arc<NodeRegistry>,
    sessions: SessionManager,
    logs: LogBus,
    config: RuntimeConfig,
}

impl GraphRuntime {
    /// Create a new runtime with a pre-configured registry
    pub fn with_registry(registry: Arc<NodeRegistry>, config: RuntimeConfig) -> Self {
        let logs = LogBus::new(config.log_buffer_size);
        let sessions = SessionManager::new(
            registry.clone(),
            logs.clone(),
            config.sink_type.clone(),
            config.event_buffer_size,
        );

        Self {
            registry,
            sessions,
            logs,
            config,
        }
    }

    /// Get access to the node registry
    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Descriptors of all registered node types
    pub fn node_descriptors(&self) -> Vec<NodeDescriptor> {
        self.registry.descriptors()
    }

    /// Build a run for the document and return its token
    pub fn submit(&self, doc: &WorkflowDocument) -> String {
        self.sessions.submit(doc)
    }

    /// Start the run behind `token` and return its event stream
    pub fn attach(&self, token: &str) -> Result<RunStream, SessionError> {
        self.sessions.attach(token)
    }

    pub fn session_status(&self, token: &str) -> Option<SessionStatus> {
        self.sessions.status(token)
    }

    /// Drop runs that were submitted but never attached within the session TTL
    pub fn reap_expired_sessions(&self) -> usize {
        let ttl = chrono::Duration::from_std(self.config.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::days(1));
        self.sessions.reap_expired(ttl)
    }

    /// Submit, attach and drain a document, forwarding every event to `on_event`
    pub async fn run_to_completion<F>(
        &self,
        doc: &WorkflowDocument,
        mut on_event: F,
    ) -> Result<RunOutcome, SessionError>
    where
        F: FnMut(&RunEvent),
    {
        let token = self.submit(doc);
        let mut stream = self.attach(&token)?;
        while let Some(event) = stream.next().await {
            on_event(&event);
            if let RunEvent::End(outcome) = event {
                return Ok(outcome);
            }
        }
        Ok(RunOutcome::failed("run stream closed without a terminal event"))
    }

    /// Subscribe to the log channel
    pub fn subscribe_logs(&self) -> broadcast::Receiver<LogLine> {
        self.logs.subscribe()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Capacity of each run's event channel
    pub event_buffer_size: usize,
    /// Capacity of the log channel
    pub log_buffer_size: usize,
    /// Node type whose instances are evaluated as sinks
    pub sink_type: String,
    /// Age after which an unattached run is dropped
    pub session_ttl: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 64,
            log_buffer_size: 1000,
            sink_type: "Result Node".to_string(),
            session_ttl: Duration::from_secs(600),
        }
    }
}
