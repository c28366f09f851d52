use crate::shared::frame::Frame;

use super::hand_roi::HandRoi;
use super::hand_tracker::TrackedHand;

/// Estimates the landmarks of the hand inside a region of a frame.
pub trait HandLandmarker: Send {
    /// The returned hand's landmarks are in normalized image coordinates.
    /// A low `presence` means the region holds no hand.
    fn estimate(
        &mut self,
        frame: &Frame,
        roi: &HandRoi,
    ) -> Result<TrackedHand, Box<dyn std::error::Error>>;
}
