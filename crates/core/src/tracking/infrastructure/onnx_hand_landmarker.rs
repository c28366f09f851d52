/// Hand landmark model using ONNX Runtime via `ort`.
///
/// Crops the hand's region to 224×224, runs the lite landmark model and maps
/// its 21 keypoints back into the frame.
use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::landmark::{Handedness, Landmark, NUM_LANDMARKS};
use crate::tracking::domain::hand_landmarker::HandLandmarker;
use crate::tracking::domain::hand_roi::HandRoi;
use crate::tracking::domain::hand_tracker::TrackedHand;

use super::onnx_session::{load_session, InputLayout};

/// Hand landmark model input resolution.
const INPUT_SIZE: u32 = 224;

/// x, y, z per landmark.
const LANDMARK_VALUES: usize = NUM_LANDMARKS * 3;

/// Hand landmark estimator backed by an ONNX Runtime session.
pub struct OnnxHandLandmarker {
    session: ort::session::Session,
    layout: InputLayout,
}

impl OnnxHandLandmarker {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let layout = InputLayout::of(&session);
        Ok(Self { session, layout })
    }
}

impl HandLandmarker for OnnxHandLandmarker {
    fn estimate(
        &mut self,
        frame: &Frame,
        roi: &HandRoi,
    ) -> Result<TrackedHand, Box<dyn std::error::Error>> {
        let input_tensor = self.layout.arrange(roi.crop_tensor(frame, INPUT_SIZE));

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // Outputs in model order:
        // - landmarks: [1, 63] in crop pixels
        // - presence: [1, 1] probability
        // - handedness: [1, 1] probability of a right hand
        // - world landmarks: [1, 63] (unused)
        if outputs.len() < 3 {
            return Err(format!(
                "Hand landmark model expected at least 3 outputs, got {}",
                outputs.len()
            )
            .into());
        }
        let landmarks = outputs[0].try_extract_array::<f32>()?;
        let presence = outputs[1].try_extract_array::<f32>()?;
        let handedness = outputs[2].try_extract_array::<f32>()?;

        let landmark_data = landmarks.as_slice().ok_or("Cannot get landmark slice")?;
        let presence = *presence.iter().next().ok_or("Empty presence output")?;
        let handedness = *handedness.iter().next().ok_or("Empty handedness output")?;

        decode(
            landmark_data,
            presence,
            handedness,
            roi,
            frame.width(),
            frame.height(),
        )
    }
}

/// Maps raw model outputs for one crop into a [`TrackedHand`].
pub(super) fn decode(
    landmark_data: &[f32],
    presence: f32,
    handedness_score: f32,
    roi: &HandRoi,
    image_width: u32,
    image_height: u32,
) -> Result<TrackedHand, Box<dyn std::error::Error>> {
    if landmark_data.len() < LANDMARK_VALUES {
        return Err(format!(
            "Hand landmark output has {} values, expected {LANDMARK_VALUES}",
            landmark_data.len()
        )
        .into());
    }

    let presence = presence.clamp(0.0, 1.0);
    let size = INPUT_SIZE as f32;
    let landmarks = landmark_data[..LANDMARK_VALUES]
        .chunks_exact(3)
        .map(|xyz| {
            let (x, y) = roi.project(xyz[0] / size, xyz[1] / size, image_width, image_height);
            Landmark {
                x,
                y,
                z: xyz[2] / size * roi.width,
                visibility: presence,
                presence,
            }
        })
        .collect();

    Ok(TrackedHand {
        landmarks,
        handedness: Handedness::from_score(handedness_score),
        handedness_score,
        presence,
    })
}
