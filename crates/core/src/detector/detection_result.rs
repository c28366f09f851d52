use crate::graph::domain::packet::HandTrackingOutput;
use crate::shared::landmark::{Handedness, Landmark, NUM_LANDMARKS};
use crate::shared::timestamp::Timestamp;

/// Handedness tag written when the graph did not classify a hand.
pub const UNKNOWN_HANDEDNESS: i32 = -1;

/// C layout of one landmark: five floats.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
    pub presence: f32,
}

impl From<&Landmark> for RawLandmark {
    fn from(lm: &Landmark) -> Self {
        Self {
            x: lm.x,
            y: lm.y,
            z: lm.z,
            visibility: lm.visibility,
            presence: lm.presence,
        }
    }
}

/// C layout of one hand: 21 landmarks and an integer handedness tag.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawHand {
    pub landmarks: [RawLandmark; NUM_LANDMARKS],
    pub handedness: i32,
}

/// One detected hand.
#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    /// The first `landmark_count` entries come from the graph; the rest are
    /// zero.
    pub landmarks: [Landmark; NUM_LANDMARKS],
    /// How many landmarks the graph reported, capped at 21.
    pub landmark_count: usize,
    /// `None` when the graph's handedness stream had no entry for this hand.
    pub handedness: Option<Handedness>,
    pub handedness_score: f32,
}

impl Hand {
    pub fn is_complete(&self) -> bool {
        self.landmark_count == NUM_LANDMARKS
    }

    /// Full C record: all 21 slots and the classified handedness.
    pub fn to_raw(&self) -> RawHand {
        let mut raw = RawHand::default();
        for (dst, lm) in raw.landmarks.iter_mut().zip(&self.landmarks) {
            *dst = lm.into();
        }
        raw.handedness = self.handedness.map_or(UNKNOWN_HANDEDNESS, |h| h.tag());
        raw
    }

    /// Legacy C record update: only the reported landmarks are written and
    /// the handedness tag is the hand's position in the result.
    fn write_legacy(&self, position: usize, out: &mut RawHand) {
        for (dst, lm) in out
            .landmarks
            .iter_mut()
            .zip(&self.landmarks[..self.landmark_count])
        {
            *dst = lm.into();
        }
        out.handedness = position as i32;
    }
}

/// The hands found in one frame, in graph output order.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    timestamp: Timestamp,
    hands: Vec<Hand>,
}

impl DetectionResult {
    pub fn from_output(output: HandTrackingOutput, timestamp: Timestamp) -> Self {
        let HandTrackingOutput {
            landmarks,
            handedness,
            ..
        } = output;

        let hands = landmarks
            .into_iter()
            .enumerate()
            .map(|(i, list)| {
                let mut landmarks = [Landmark::default(); NUM_LANDMARKS];
                let landmark_count = list.len().min(NUM_LANDMARKS);
                landmarks[..landmark_count].copy_from_slice(&list[..landmark_count]);

                let classification = handedness.get(i);
                Hand {
                    landmarks,
                    landmark_count,
                    handedness: classification.and_then(|c| c.handedness()),
                    handedness_score: classification.map_or(0.0, |c| c.score),
                }
            })
            .collect();

        Self { timestamp, hands }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    pub fn len(&self) -> usize {
        self.hands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    /// Copies up to `out.len()` hands with the legacy layout rules and
    /// returns how many were written.
    pub fn write_legacy(&self, out: &mut [RawHand]) -> usize {
        let count = self.hands.len().min(out.len());
        for (position, (hand, dst)) in self.hands.iter().zip(out.iter_mut()).enumerate() {
            hand.write_legacy(position, dst);
        }
        count
    }

    /// Copies up to `out.len()` full records and returns how many were
    /// written.
    pub fn write_raw(&self, out: &mut [RawHand]) -> usize {
        let count = self.hands.len().min(out.len());
        for (hand, dst) in self.hands.iter().zip(out.iter_mut()) {
            *dst = hand.to_raw();
        }
        count
    }
}
