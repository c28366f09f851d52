pub const INPUT_STREAM: &str = "input_video";
pub const LANDMARKS_STREAM: &str = "hand_landmarks";
pub const HANDEDNESS_STREAM: &str = "handedness";

pub const HAND_TRACKING_CALCULATOR: &str = "HandLandmarkTrackingCpu";
pub const HAND_TRACKING_OPTIONS_TYPE: &str = "type.googleapis.com/mediapipe.HandLandmarkTrackingCpuOptions";

pub const DEFAULT_NUM_HANDS: u32 = 2;
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.5;
pub const DEFAULT_MIN_TRACKING_CONFIDENCE: f32 = 0.5;

/// Row alignment of frames handed to the graph, in bytes.
pub const DEFAULT_ALIGNMENT_BOUNDARY: usize = 16;

pub const PALM_MODEL_NAME: &str = "palm_detection_lite.onnx";
pub const LANDMARK_MODEL_NAME: &str = "hand_landmark_lite.onnx";

/// Frames queued between the caller and the graph worker.
pub const GRAPH_CHANNEL_CAPACITY: usize = 2;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
