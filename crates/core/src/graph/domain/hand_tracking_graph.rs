use crate::shared::frame::Frame;
use crate::shared::timestamp::Timestamp;

use super::graph_config::GraphConfig;
use super::graph_error::GraphError;
use super::packet::HandTrackingOutput;

/// A running hand tracking graph: one image input stream, one output record
/// per input frame.
///
/// Frames must arrive with strictly increasing timestamps. Outputs come back
/// in input order; `next_output` blocks until the next one is ready.
pub trait HandTrackingGraph: Send {
    fn add_frame(&mut self, frame: Frame, timestamp: Timestamp) -> Result<(), GraphError>;

    fn next_output(&mut self) -> Result<HandTrackingOutput, GraphError>;

    /// Signals end of input. Frames added afterwards are rejected.
    fn close_all_inputs(&mut self) -> Result<(), GraphError>;

    /// Blocks until every pending frame has been processed and the graph has
    /// halted.
    fn wait_until_done(&mut self) -> Result<(), GraphError>;
}

/// Builds and starts graphs from a topology.
pub trait GraphFactory: Send + Sync {
    fn start(&self, config: &GraphConfig) -> Result<Box<dyn HandTrackingGraph>, GraphError>;
}
