use crate::{NodeId, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Lifecycle events emitted while a run is drained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    /// The node's inputs are resolved and its body is about to run
    Processing { node_id: NodeId },
    /// The node's body returned and its result is memoized
    Done { node_id: NodeId },
    /// Terminal event, always the last one of a run
    End(RunOutcome),
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::End(_))
    }
}

/// Payload of the terminal `END` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Node ids in completion order, each exactly once
    pub order: Vec<NodeId>,
    /// Memoized result of every node reached from the sinks
    pub results: HashMap<NodeId, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Nodes whose execution failed and were given the fallback value
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub failures: HashMap<NodeId, String>,
}

impl RunOutcome {
    /// Outcome of a run that failed as a whole
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One freeform line on the log channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub source: String,
    pub message: String,
}

impl LogLine {
    /// Human readable form sent to log stream clients
    pub fn render(&self) -> String {
        format!(
            "[{}] {} {}: {}",
            self.timestamp.format("%H:%M:%S"),
            match self.level {
                LogLevel::Info => "INFO",
                LogLevel::Warn => "WARN",
                LogLevel::Error => "ERROR",
            },
            self.source,
            self.message
        )
    }
}

/// Handle for publishing log lines under a fixed source label
#[derive(Clone)]
pub struct LogEmitter {
    source: String,
    sender: broadcast::Sender<LogLine>,
}

impl LogEmitter {
    pub fn new(source: impl Into<String>, sender: broadcast::Sender<LogLine>) -> Self {
        Self {
            source: source.into(),
            sender,
        }
    }

    pub fn emit(&self, level: LogLevel, message: impl Into<String>) {
        // No subscribers is not an error
        let _ = self.sender.send(LogLine {
            timestamp: Utc::now(),
            level,
            source: self.source.clone(),
            message: message.into(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message);
    }
}

/// Process-wide log channel
#[derive(Clone)]
pub struct LogBus {
    sender: broadcast::Sender<LogLine>,
}

impl LogBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogLine> {
        self.sender.subscribe()
    }

    pub fn emitter(&self, source: impl Into<String>) -> LogEmitter {
        LogEmitter::new(source, self.sender.clone())
    }
}
