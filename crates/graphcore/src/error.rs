use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Invalid input type for '{field}': expected {expected}, got {actual}")]
    InvalidInputType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Cancelled")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Cycle detected at node {0}")]
    CyclicDependency(String),
}

/// Errors a client can cause when addressing a run session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}
