use thiserror::Error;

use crate::graph::domain::graph_error::GraphError;
use crate::shared::frame::FrameError;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("failed to initialize hand tracking graph: {0}")]
    Initialization(#[source] GraphError),
    #[error("invalid frame: {0}")]
    InvalidArgument(#[from] FrameError),
    #[error("failed to enqueue frame: {0}")]
    Enqueue(#[source] GraphError),
    #[error("no output packet available: {0}")]
    NoOutput(#[source] GraphError),
    #[error("detector is not running")]
    NotRunning,
    #[error("hand tracking graph did not shut down cleanly: {0}")]
    Shutdown(#[source] GraphError),
}
