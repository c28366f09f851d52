use crate::graph::domain::graph_config::HandTrackingOptions;
use crate::shared::frame::Frame;
use crate::shared::settings::ModelPaths;
use crate::tracking::domain::hand_landmarker::HandLandmarker;
use crate::tracking::domain::hand_roi::HandRoi;
use crate::tracking::domain::hand_tracker::{HandTracker, TrackedHand};
use crate::tracking::domain::palm_detector::{PalmDetection, PalmDetector};

use super::math::{bbox_iou, coverage, points_bbox};
use super::onnx_hand_landmarker::OnnxHandLandmarker;
use super::onnx_palm_detector::OnnxPalmDetector;

/// Landmark bounding boxes overlapping more than this are the same hand.
const DUPLICATE_HAND_IOU: f64 = 0.5;

/// A palm mostly inside a tracked hand's bounds is that hand.
const TRACKED_PALM_COVERAGE: f64 = 0.5;

/// Two-stage hand tracker: palm detection finds new hands, the landmark
/// model follows them from frame to frame.
///
/// Each tracked hand's landmarks yield the region searched in the next frame.
/// A hand stays tracked while its presence is at least
/// `min_tracking_confidence`. Palm detection only runs while fewer than
/// `num_hands` hands are tracked.
pub struct LandmarkTracker {
    palm_detector: Box<dyn PalmDetector>,
    landmarker: Box<dyn HandLandmarker>,
    options: HandTrackingOptions,
    tracked: Vec<HandRoi>,
}

impl LandmarkTracker {
    pub fn new(
        palm_detector: Box<dyn PalmDetector>,
        landmarker: Box<dyn HandLandmarker>,
        options: HandTrackingOptions,
    ) -> Self {
        Self {
            palm_detector,
            landmarker,
            options,
            tracked: Vec::new(),
        }
    }

    /// Tracker running the ONNX palm detection and hand landmark models.
    pub fn onnx(
        models: &ModelPaths,
        options: &HandTrackingOptions,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let palm_detector =
            OnnxPalmDetector::new(&models.palm_model, options.min_detection_confidence)?;
        let landmarker = OnnxHandLandmarker::new(&models.landmark_model)?;
        log::info!(
            "Loaded hand models: palm={}, landmark={}",
            models.palm_model.display(),
            models.landmark_model.display()
        );
        Ok(Self::new(
            Box::new(palm_detector),
            Box::new(landmarker),
            *options,
        ))
    }

    /// Hands that will be looked for without palm detection on the next frame.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    fn is_tracked(hands: &[TrackedHand], palm: &PalmDetection) -> bool {
        let palm_box = palm.bounding_box();
        hands.iter().any(|hand| {
            hand_bbox(hand).is_some_and(|b| coverage(&palm_box, &b) > TRACKED_PALM_COVERAGE)
        })
    }
}

impl HandTracker for LandmarkTracker {
    fn track(&mut self, frame: &Frame) -> Result<Vec<TrackedHand>, Box<dyn std::error::Error>> {
        let (fw, fh) = (frame.width(), frame.height());
        let num_hands = self.options.num_hands as usize;
        let mut hands: Vec<TrackedHand> = Vec::with_capacity(num_hands);

        // 1. Follow hands from the previous frame
        for roi in std::mem::take(&mut self.tracked) {
            let hand = self.landmarker.estimate(frame, &roi)?;
            if hand.presence >= self.options.min_tracking_confidence {
                push_distinct(&mut hands, hand);
            }
        }

        // 2. Look for new hands while below capacity
        if hands.len() < num_hands {
            let palms = self.palm_detector.detect(frame)?;
            log::trace!(
                "Frame {}: {} tracked, {} palm(s) detected",
                frame.index(),
                hands.len(),
                palms.len()
            );
            for palm in palms {
                if hands.len() >= num_hands {
                    break;
                }
                if Self::is_tracked(&hands, &palm) {
                    continue;
                }
                let roi = HandRoi::from_palm(&palm, fw, fh);
                let hand = self.landmarker.estimate(frame, &roi)?;
                if hand.presence >= self.options.min_tracking_confidence {
                    push_distinct(&mut hands, hand);
                }
            }
        }

        // 3. Regions for the next frame
        self.tracked = hands
            .iter()
            .filter_map(|hand| HandRoi::from_landmarks(&hand.landmarks, fw, fh))
            .collect();

        Ok(hands)
    }
}

fn hand_bbox(hand: &TrackedHand) -> Option<[f64; 4]> {
    points_bbox(hand.landmarks.iter().map(|lm| (lm.x, lm.y)))
}

/// Adds `hand` unless it duplicates one already found.
fn push_distinct(hands: &mut Vec<TrackedHand>, hand: TrackedHand) {
    if let Some(bbox) = hand_bbox(&hand) {
        let duplicate = hands.iter().any(|other| {
            hand_bbox(other).is_some_and(|b| bbox_iou(&bbox, &b) > DUPLICATE_HAND_IOU)
        });
        if duplicate {
            return;
        }
    }
    hands.push(hand);
}
