pub mod hand_landmarker;
pub mod hand_roi;
pub mod hand_tracker;
pub mod palm_detector;
