use std::f32::consts::{FRAC_PI_2, PI};

use ndarray::Array4;

use crate::shared::frame::Frame;
use crate::shared::landmark::{landmark_index, Landmark};

use super::palm_detector::PalmDetection;

/// Palm keypoint at the center of the wrist.
const PALM_WRIST: usize = 0;
/// Palm keypoint at the middle finger's MCP joint.
const PALM_MIDDLE_MCP: usize = 2;

const PALM_ROI_SCALE: f32 = 2.6;
const PALM_ROI_SHIFT_Y: f32 = -0.5;
const LANDMARK_ROI_SCALE: f32 = 2.0;
const LANDMARK_ROI_SHIFT_Y: f32 = -0.1;

/// A rotated rectangle in normalized image coordinates that a hand is
/// cropped from.
///
/// `rotation` is in radians, clockwise in image space, and rotates the crop
/// so the hand points up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandRoi {
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
}

impl HandRoi {
    /// The whole image, padded on the short side to a square.
    ///
    /// Cropping it letterboxes the frame; projecting through it undoes the
    /// letterbox.
    pub fn full_frame(image_width: u32, image_height: u32) -> Self {
        let (w, h) = (image_width as f32, image_height as f32);
        let long_side = w.max(h);
        Self {
            x_center: 0.5,
            y_center: 0.5,
            width: long_side / w,
            height: long_side / h,
            rotation: 0.0,
        }
    }

    /// Region expected to contain the whole hand around a detected palm.
    pub fn from_palm(palm: &PalmDetection, image_width: u32, image_height: u32) -> Self {
        let wrist = palm.keypoints[PALM_WRIST];
        let middle = palm.keypoints[PALM_MIDDLE_MCP];
        let rotation = hand_rotation(wrist, middle, image_width, image_height);

        Self {
            x_center: (palm.x1 + palm.x2) / 2.0,
            y_center: (palm.y1 + palm.y2) / 2.0,
            width: palm.x2 - palm.x1,
            height: palm.y2 - palm.y1,
            rotation,
        }
        .transformed(image_width, image_height, PALM_ROI_SCALE, PALM_ROI_SHIFT_Y)
    }

    /// Region to look for the same hand in the next frame.
    ///
    /// Returns `None` when fewer than 21 landmarks are given.
    pub fn from_landmarks(
        landmarks: &[Landmark],
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        if landmarks.len() <= landmark_index::PINKY_TIP {
            return None;
        }
        let (w, h) = (image_width as f32, image_height as f32);

        let wrist = point(&landmarks[landmark_index::WRIST]);
        let index = point(&landmarks[landmark_index::INDEX_FINGER_MCP]);
        let middle = point(&landmarks[landmark_index::MIDDLE_FINGER_MCP]);
        let ring = point(&landmarks[landmark_index::RING_FINGER_MCP]);
        let knuckles = [
            ((index[0] + ring[0]) / 2.0 + middle[0]) / 2.0,
            ((index[1] + ring[1]) / 2.0 + middle[1]) / 2.0,
        ];
        let rotation = hand_rotation(wrist, knuckles, image_width, image_height);

        // Axis-aligned center in pixels, then the extent along the hand's axes.
        let (mut min_x, mut max_x, mut min_y, mut max_y) = bounds(
            landmarks.iter().map(|lm| (lm.x * w, lm.y * h)),
        );
        let axis_center = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);

        let (sin_r, cos_r) = (-rotation).sin_cos();
        (min_x, max_x, min_y, max_y) = bounds(landmarks.iter().map(|lm| {
            let dx = lm.x * w - axis_center.0;
            let dy = lm.y * h - axis_center.1;
            (dx * cos_r - dy * sin_r, dx * sin_r + dy * cos_r)
        }));

        let projected = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
        let (sin_r, cos_r) = rotation.sin_cos();
        let cx = projected.0 * cos_r - projected.1 * sin_r + axis_center.0;
        let cy = projected.0 * sin_r + projected.1 * cos_r + axis_center.1;

        Some(
            Self {
                x_center: cx / w,
                y_center: cy / h,
                width: (max_x - min_x) / w,
                height: (max_y - min_y) / h,
                rotation,
            }
            .transformed(
                image_width,
                image_height,
                LANDMARK_ROI_SCALE,
                LANDMARK_ROI_SHIFT_Y,
            ),
        )
    }

    /// Maps a point given in crop-normalized coordinates back to normalized
    /// image coordinates.
    pub fn project(&self, x: f32, y: f32, image_width: u32, image_height: u32) -> (f32, f32) {
        let (w, h) = (image_width as f32, image_height as f32);
        let (px, py) = self.crop_to_pixel(x, y, w, h);
        (px / w, py / h)
    }

    /// Samples the region into a `size × size` NCHW tensor with values in
    /// `[0, 1]`. Samples outside the image are zero.
    pub fn crop_tensor(&self, frame: &Frame, size: u32) -> Array4<f32> {
        let src = frame.as_ndarray();
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let s = size as usize;

        let mut tensor = Array4::<f32>::zeros((1, 3, s, s));
        for y in 0..s {
            let v = (y as f32 + 0.5) / s as f32;
            for x in 0..s {
                let u = (x as f32 + 0.5) / s as f32;
                let (px, py) = self.crop_to_pixel(u, v, w, h);
                if px < 0.0 || py < 0.0 || px >= w || py >= h {
                    continue;
                }
                let (sx, sy) = (px as usize, py as usize);
                for c in 0..3 {
                    tensor[[0, c, y, x]] = src[[sy, sx, c]] as f32 / 255.0;
                }
            }
        }

        tensor
    }

    /// Axis-aligned bounds of the rotated rectangle as normalized
    /// `[x1, y1, x2, y2]`.
    pub fn bounding_box(&self, image_width: u32, image_height: u32) -> [f64; 4] {
        let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
            .map(|(u, v)| self.project(u, v, image_width, image_height));
        let (x1, x2, y1, y2) = bounds(corners.into_iter());
        [x1 as f64, y1 as f64, x2 as f64, y2 as f64]
    }

    fn crop_to_pixel(&self, x: f32, y: f32, w: f32, h: f32) -> (f32, f32) {
        let dx = (x - 0.5) * self.width * w;
        let dy = (y - 0.5) * self.height * h;
        let (sin_r, cos_r) = self.rotation.sin_cos();
        (
            self.x_center * w + dx * cos_r - dy * sin_r,
            self.y_center * h + dx * sin_r + dy * cos_r,
        )
    }

    /// Shifts along the rotated y axis, squares on the long side and scales.
    fn transformed(self, image_width: u32, image_height: u32, scale: f32, shift_y: f32) -> Self {
        let (w, h) = (image_width as f32, image_height as f32);
        let (sin_r, cos_r) = self.rotation.sin_cos();

        let x_shift = -(h * self.height * shift_y * sin_r) / w;
        let y_shift = (h * self.height * shift_y * cos_r) / h;

        let long_side = (self.width * w).max(self.height * h);
        Self {
            x_center: self.x_center + x_shift,
            y_center: self.y_center + y_shift,
            width: long_side / w * scale,
            height: long_side / h * scale,
            rotation: self.rotation,
        }
    }
}

fn point(lm: &Landmark) -> [f32; 2] {
    [lm.x, lm.y]
}

/// Rotation that brings the `from → to` direction to point straight up.
fn hand_rotation(from: [f32; 2], to: [f32; 2], image_width: u32, image_height: u32) -> f32 {
    let dx = (to[0] - from[0]) * image_width as f32;
    let dy = (to[1] - from[1]) * image_height as f32;
    normalize_radians(FRAC_PI_2 - (-dy).atan2(dx))
}

fn normalize_radians(angle: f32) -> f32 {
    angle - 2.0 * PI * ((angle + PI) / (2.0 * PI)).floor()
}

/// `(min_x, max_x, min_y, max_y)` of the given points.
fn bounds(points: impl Iterator<Item = (f32, f32)>) -> (f32, f32, f32, f32) {
    points.fold(
        (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
        |(min_x, max_x, min_y, max_y), (x, y)| {
            (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
        },
    )
}
