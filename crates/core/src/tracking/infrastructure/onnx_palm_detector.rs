/// Palm detector using ONNX Runtime via `ort`.
///
/// Runs the lite palm detection SSD on a letterboxed copy of the whole frame
/// and returns palms with their seven keypoints.
use std::path::Path;

use crate::shared::frame::Frame;
use crate::tracking::domain::hand_roi::HandRoi;
use crate::tracking::domain::palm_detector::{PalmDetection, PalmDetector};

use super::math::bbox_iou;
use super::onnx_session::{load_session, InputLayout};

/// Palm detection model input resolution.
const INPUT_SIZE: u32 = 192;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Number of palm detection anchors (lite model).
const NUM_ANCHORS: usize = 2016;

/// Values per anchor in the regressor output: box (4) + 7 keypoints (14).
const NUM_COORDS: usize = 18;

const NUM_KEYPOINTS: usize = 7;

/// Raw scores are clipped to this magnitude before the sigmoid.
const SCORE_CLIP: f32 = 100.0;

/// Palm detector backed by an ONNX Runtime session.
pub struct OnnxPalmDetector {
    session: ort::session::Session,
    layout: InputLayout,
    confidence: f32,
    anchors: Vec<[f32; 2]>,
}

impl OnnxPalmDetector {
    /// Load a palm detection ONNX model.
    pub fn new(model_path: &Path, confidence: f32) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let layout = InputLayout::of(&session);
        Ok(Self {
            session,
            layout,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl PalmDetector for OnnxPalmDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<PalmDetection>, Box<dyn std::error::Error>> {
        let (fw, fh) = (frame.width(), frame.height());
        let letterbox = HandRoi::full_frame(fw, fh);

        // 1. Preprocess: letterbox to 192x192, [0,1]
        let input_tensor = self.layout.arrange(letterbox.crop_tensor(frame, INPUT_SIZE));

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // Two outputs, told apart by their last dimension:
        // - regressors: [1, 2016, 18] (box + keypoints)
        // - classificators: [1, 2016, 1] (scores)
        if outputs.len() < 2 {
            return Err(
                format!("Palm model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }
        let mut regressors = None;
        let mut scores = None;
        for i in 0..outputs.len() {
            let array = outputs[i].try_extract_array::<f32>()?;
            match array.shape().last() {
                Some(&NUM_COORDS) => regressors = Some(array),
                Some(&1) => scores = Some(array),
                _ => {}
            }
        }
        let regressors = regressors.ok_or("Palm model has no regressor output")?;
        let scores = scores.ok_or("Palm model has no score output")?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        // 3. Decode anchors, filter by confidence, NMS
        let mut raw = decode(reg_data, score_data, &self.anchors, self.confidence);
        let kept = nms(&mut raw, NMS_IOU_THRESH);

        // 4. Undo the letterbox
        Ok(kept
            .into_iter()
            .map(|p| to_image(&p, &letterbox, fw, fh))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes regressors relative to their anchors. Coordinates stay in the
/// model's input space, normalized to `[0, 1]`.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    confidence: f32,
) -> Vec<PalmDetection> {
    let scale = INPUT_SIZE as f32;
    let mut dets = Vec::new();

    for (i, &raw_score) in score_data.iter().enumerate().take(anchors.len()) {
        let score = sigmoid(raw_score.clamp(-SCORE_CLIP, SCORE_CLIP));
        if score < confidence {
            continue;
        }

        let reg_offset = i * NUM_COORDS;
        if reg_offset + NUM_COORDS > reg_data.len() {
            break;
        }
        let reg = &reg_data[reg_offset..reg_offset + NUM_COORDS];
        let anchor = anchors[i];

        let cx = anchor[0] + reg[0] / scale;
        let cy = anchor[1] + reg[1] / scale;
        let w = reg[2] / scale;
        let h = reg[3] / scale;

        let mut keypoints = [[0.0f32; 2]; NUM_KEYPOINTS];
        for (k, kp) in keypoints.iter_mut().enumerate() {
            kp[0] = anchor[0] + reg[4 + 2 * k] / scale;
            kp[1] = anchor[1] + reg[4 + 2 * k + 1] / scale;
        }

        dets.push(PalmDetection {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            score,
            keypoints,
        });
    }

    dets
}

fn to_image(palm: &PalmDetection, letterbox: &HandRoi, fw: u32, fh: u32) -> PalmDetection {
    let (x1, y1) = letterbox.project(palm.x1, palm.y1, fw, fh);
    let (x2, y2) = letterbox.project(palm.x2, palm.y2, fw, fh);
    PalmDetection {
        x1,
        y1,
        x2,
        y2,
        score: palm.score,
        keypoints: palm.keypoints.map(|[x, y]| {
            let (ix, iy) = letterbox.project(x, y, fw, fh);
            [ix, iy]
        }),
    }
}

// ---------------------------------------------------------------------------
// Anchor generation (palm detection lite)
// ---------------------------------------------------------------------------

/// Generate SSD anchors for the lite palm model.
///
/// Feature maps are 24×24 (stride 8) and 12×12 (stride 16), with 2 and 6
/// anchors per cell respectively. Anchor sizes are fixed, so only centers
/// are kept.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

fn nms(dets: &mut [PalmDetection], iou_thresh: f64) -> Vec<PalmDetection> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        let bbox_i = dets[i].bounding_box();
        for j in (i + 1)..dets.len() {
            if suppressed[j] {
                continue;
            }
            if bbox_iou(&bbox_i, &dets[j].bounding_box()) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
