use crate::shared::landmark::{Handedness, Landmark};
use crate::shared::timestamp::Timestamp;

/// Landmarks of one hand, in the order the landmark model emits them.
///
/// Usually 21 entries, but consumers must not rely on it.
pub type NormalizedLandmarkList = Vec<Landmark>;

/// One entry of the graph's handedness signal.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub index: i32,
    pub label: String,
    pub score: f32,
}

impl Classification {
    pub fn from_handedness(handedness: Handedness, score: f32) -> Self {
        Self {
            index: handedness.tag(),
            label: handedness.label().to_string(),
            score,
        }
    }

    pub fn handedness(&self) -> Option<Handedness> {
        Handedness::from_label(&self.label)
    }
}

/// The packets the hand tracking graph emits for one input frame.
///
/// `handedness[i]` classifies `landmarks[i]`; the two lists have equal length
/// when the graph fills both streams.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandTrackingOutput {
    pub timestamp: Option<Timestamp>,
    pub landmarks: Vec<NormalizedLandmarkList>,
    pub handedness: Vec<Classification>,
}

impl HandTrackingOutput {
    pub fn empty(timestamp: Timestamp) -> Self {
        Self {
            timestamp: Some(timestamp),
            landmarks: Vec::new(),
            handedness: Vec::new(),
        }
    }

    pub fn hand_count(&self) -> usize {
        self.landmarks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_from_handedness() {
        let c = Classification::from_handedness(Handedness::Right, 0.93);
        assert_eq!(c.index, 1);
        assert_eq!(c.label, "Right");
        assert_eq!(c.handedness(), Some(Handedness::Right));
    }

    #[test]
    fn test_unknown_label_has_no_handedness() {
        let c = Classification {
            index: 0,
            label: "Unknown".into(),
            score: 0.1,
        };
        assert_eq!(c.handedness(), None);
    }

    #[test]
    fn test_empty_output() {
        let out = HandTrackingOutput::empty(Timestamp::from_micros(7));
        assert_eq!(out.hand_count(), 0);
        assert_eq!(out.timestamp, Some(Timestamp::from_micros(7)));
    }
}
