use thiserror::Error;

use crate::shared::timestamp::Timestamp;

use super::graph_config::GraphConfigError;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("invalid graph config: {0}")]
    InvalidConfig(#[from] GraphConfigError),
    #[error("failed to start graph: {0}")]
    Start(String),
    #[error("timestamp {current} is not after previous input timestamp {previous}")]
    TimestampMismatch {
        previous: Timestamp,
        current: Timestamp,
    },
    #[error("input stream {0} is closed")]
    InputClosed(String),
    #[error("output stream {0} is closed")]
    OutputClosed(String),
    #[error("calculator failed at {timestamp}: {message}")]
    Calculator {
        timestamp: Timestamp,
        message: String,
    },
    #[error("graph worker thread panicked")]
    WorkerPanicked,
}
