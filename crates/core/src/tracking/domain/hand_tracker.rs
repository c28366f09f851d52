use crate::shared::frame::Frame;
use crate::shared::landmark::{Handedness, Landmark};

/// One hand found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedHand {
    /// Landmarks in normalized image coordinates.
    pub landmarks: Vec<Landmark>,
    pub handedness: Handedness,
    /// Raw handedness score of the landmark model (probability of a right hand).
    pub handedness_score: f32,
    /// Probability that the hand is present in its region.
    pub presence: f32,
}

/// Domain interface for per-frame hand tracking.
///
/// Implementations carry state between frames (regions of interest of hands
/// already being tracked), hence `&mut self`.
pub trait HandTracker: Send {
    fn track(&mut self, frame: &Frame) -> Result<Vec<TrackedHand>, Box<dyn std::error::Error>>;
}
