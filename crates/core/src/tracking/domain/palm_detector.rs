use crate::shared::frame::Frame;

/// A palm found by the palm detection model.
///
/// Coordinates are normalized to the image. `keypoints` holds the seven palm
/// keypoints in model order, starting with the wrist center.
#[derive(Clone, Debug, PartialEq)]
pub struct PalmDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub keypoints: [[f32; 2]; 7],
}

impl PalmDetection {
    pub fn bounding_box(&self) -> [f64; 4] {
        [
            self.x1 as f64,
            self.y1 as f64,
            self.x2 as f64,
            self.y2 as f64,
        ]
    }
}

/// Finds palms in a whole frame.
///
/// Implementations return detections above their confidence threshold,
/// already de-duplicated, best first.
pub trait PalmDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<PalmDetection>, Box<dyn std::error::Error>>;
}
