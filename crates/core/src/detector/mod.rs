pub mod detection_result;
pub mod detector_error;
pub mod frame_detector;
