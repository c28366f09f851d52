pub mod landmark_tracker;
mod math;
pub mod onnx_hand_landmarker;
pub mod onnx_palm_detector;
pub mod onnx_session;
