use crate::builder::WorkflowGraph;
use crate::evaluator::execute_run;
use crate::registry::NodeRegistry;
use crate::stream::RunStream;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use graphcore::{LogBus, SessionError, WorkflowDocument};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Lifecycle state of a live session. Consumed sessions are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    Streaming,
}

/// A built graph waiting for its consumer
struct PreparedRun {
    graph: WorkflowGraph,
}

enum SessionState {
    Pending(PreparedRun),
    Streaming,
}

struct Session {
    state: SessionState,
    created_at: DateTime<Utc>,
}

type SessionTable = Arc<DashMap<String, Session>>;

/// Holds submitted runs under single-use tokens until they are drained
pub struct SessionManager {
    sessions: SessionTable,
    registry: Arc<NodeRegistry>,
    logs: LogBus,
    sink_type: String,
    event_buffer_size: usize,
}

impl SessionManager {
    pub fn new(
        registry: Arc<NodeRegistry>,
        logs: LogBus,
        sink_type: impl Into<String>,
        event_buffer_size: usize,
    ) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            registry,
            logs,
            sink_type: sink_type.into(),
            event_buffer_size: event_buffer_size.max(1),
        }
    }

    /// Build the document's graph and park it under a fresh token.
    ///
    /// No node body runs until the token is attached.
    pub fn submit(&self, doc: &WorkflowDocument) -> String {
        let graph = WorkflowGraph::build(doc, &self.registry);
        let token = Uuid::new_v4().simple().to_string();

        tracing::info!("Run {} submitted with {} nodes", token, graph.len());
        self.logs
            .emitter("engine")
            .info(format!("Run submitted with {} nodes", graph.len()));

        self.sessions.insert(
            token.clone(),
            Session {
                state: SessionState::Pending(PreparedRun { graph }),
                created_at: Utc::now(),
            },
        );
        token
    }

    /// Start the run behind `token` and hand out its event stream.
    ///
    /// Succeeds once per token. The session is removed when the stream
    /// yields its terminal event or is dropped.
    pub fn attach(&self, token: &str) -> Result<RunStream, SessionError> {
        let run = {
            let mut session = self
                .sessions
                .get_mut(token)
                .ok_or_else(|| SessionError::InvalidToken(token.to_string()))?;
            match std::mem::replace(&mut session.state, SessionState::Streaming) {
                SessionState::Pending(run) => run,
                SessionState::Streaming => {
                    return Err(SessionError::InvalidToken(token.to_string()))
                }
            }
        };

        tracing::info!("Run {} attached", token);

        let (tx, rx) = mpsc::channel(self.event_buffer_size);
        let cancellation = CancellationToken::new();
        let guard = SessionGuard {
            sessions: self.sessions.clone(),
            token: token.to_string(),
            cancellation: cancellation.clone(),
        };

        // Node bodies may block, so the run gets its own thread and the
        // consumer keeps receiving events while a body is running.
        let sink_type = self.sink_type.clone();
        let logs = self.logs.clone();
        let handle = Handle::current();
        tokio::task::spawn_blocking(move || {
            handle.block_on(execute_run(run.graph, &sink_type, tx, logs, cancellation));
        });

        Ok(RunStream::new(rx, guard))
    }

    pub fn status(&self, token: &str) -> Option<SessionStatus> {
        self.sessions.get(token).map(|session| match session.state {
            SessionState::Pending(_) => SessionStatus::Pending,
            SessionState::Streaming => SessionStatus::Streaming,
        })
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop pending sessions older than `max_age`. Streaming sessions are kept.
    pub fn reap_expired(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut reaped = 0;
        self.sessions.retain(|_, session| {
            let keep =
                matches!(session.state, SessionState::Streaming) || session.created_at > cutoff;
            if !keep {
                reaped += 1;
            }
            keep
        });
        if reaped > 0 {
            tracing::info!("Reaped {} unattached run sessions", reaped);
        }
        reaped
    }
}

/// Removes its session and cancels the run when dropped
pub struct SessionGuard {
    sessions: SessionTable,
    token: String,
    cancellation: CancellationToken,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.cancellation.cancel();
        if self.sessions.remove(&self.token).is_some() {
            tracing::debug!("Run {} consumed", self.token);
        }
    }
}
