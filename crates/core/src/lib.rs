//! Hand landmark detection over a pluggable hand-tracking graph.
//!
//! [`detector::frame_detector::FrameDetector`] owns one running graph, feeds it
//! BGR frames and flattens the per-hand landmark lists it produces. The graph
//! itself sits behind [`graph::domain::hand_tracking_graph::GraphFactory`]; the
//! shipped implementation runs an ONNX palm detector and hand landmarker on a
//! worker thread.

pub mod detector;
pub mod graph;
pub mod shared;
pub mod tracking;
