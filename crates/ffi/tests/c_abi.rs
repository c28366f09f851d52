use std::ffi::CString;
use std::ptr;

use handtrack::*;
use handtrack_core::detector::frame_detector::FrameDetector;
use handtrack_core::graph::infrastructure::threaded_graph::ThreadedGraphFactory;
use handtrack_core::shared::frame::Frame;
use handtrack_core::shared::landmark::{Handedness, Landmark};
use handtrack_core::tracking::domain::hand_tracker::{HandTracker, TrackedHand};

/// Reads the scene from the first pixel: red is the number of hands, green
/// the landmarks per hand (0 means 21).
struct PixelTracker;

impl HandTracker for PixelTracker {
    fn track(&mut self, frame: &Frame) -> Result<Vec<TrackedHand>, Box<dyn std::error::Error>> {
        let px = &frame.row(0)[..3];
        let hands = px[0] as usize;
        let landmarks = if px[1] == 0 { 21 } else { px[1] as usize };
        Ok((0..hands)
            .map(|i| TrackedHand {
                landmarks: (0..landmarks)
                    .map(|j| Landmark {
                        x: 0.1 * (i + 1) as f32,
                        y: j as f32 / 21.0,
                        z: -0.05,
                        visibility: 0.0,
                        presence: 0.0,
                    })
                    .collect(),
                handedness: Handedness::Right,
                handedness_score: 0.9,
                presence: 1.0,
            })
            .collect())
    }
}

const W: i32 = 8;
const H: i32 = 6;

fn handle() -> *mut MediaPipeHandDetector {
    let factory =
        ThreadedGraphFactory::new(|_| Ok(Box::new(PixelTracker) as Box<dyn HandTracker>));
    into_handle(FrameDetector::create(&factory).unwrap())
}

/// BGR image showing `hands` hands with `landmarks` landmarks each.
fn scene(hands: u8, landmarks: u8) -> Vec<u8> {
    let mut bgr = vec![0u8; (W * H * 3) as usize];
    bgr[2] = hands;
    bgr[1] = landmarks;
    bgr
}

fn poisoned() -> MediaPipeHand {
    let mut hand = MediaPipeHand::default();
    for lm in hand.landmarks.iter_mut() {
        lm.x = 42.0;
    }
    hand.handedness = 7;
    hand
}

fn process(detector: *mut MediaPipeHandDetector, image: &[u8], out: &mut [MediaPipeHand]) -> i32 {
    unsafe {
        mediapipe_hand_detector_process(detector, image.as_ptr(), W, H, out.as_mut_ptr(), out.len() as i32)
    }
}

#[test]
fn create_with_missing_models_returns_null() {
    let palm = CString::new("/nonexistent/palm_detection_lite.onnx").unwrap();
    let landmark = CString::new("/nonexistent/hand_landmark_lite.onnx").unwrap();
    let detector =
        unsafe { mediapipe_hand_detector_create_with_models(palm.as_ptr(), landmark.as_ptr()) };
    assert!(detector.is_null());
}

#[test]
fn destroy_null_is_noop() {
    unsafe { mediapipe_hand_detector_destroy(ptr::null_mut()) };
}

#[test]
fn null_arguments_return_zero_without_writes() {
    let detector = handle();
    let image = scene(1, 0);
    let mut out = [poisoned(), poisoned()];

    let n = unsafe {
        mediapipe_hand_detector_process(ptr::null_mut(), image.as_ptr(), W, H, out.as_mut_ptr(), 2)
    };
    assert_eq!(n, 0);
    let n = unsafe {
        mediapipe_hand_detector_process(detector, ptr::null(), W, H, out.as_mut_ptr(), 2)
    };
    assert_eq!(n, 0);
    let n = unsafe {
        mediapipe_hand_detector_process(detector, image.as_ptr(), W, H, ptr::null_mut(), 2)
    };
    assert_eq!(n, 0);
    let n = unsafe {
        mediapipe_hand_detector_process(detector, image.as_ptr(), 0, H, out.as_mut_ptr(), 2)
    };
    assert_eq!(n, 0);

    assert_eq!(out, [poisoned(), poisoned()]);
    unsafe { mediapipe_hand_detector_destroy(detector) };
}

#[test]
fn empty_frame_returns_zero() {
    let detector = handle();
    let mut out = [poisoned(), poisoned()];
    assert_eq!(process(detector, &scene(0, 0), &mut out), 0);
    assert_eq!(out, [poisoned(), poisoned()]);
    unsafe { mediapipe_hand_detector_destroy(detector) };
}

#[test]
fn one_hand_writes_21_landmarks_with_index_handedness() {
    let detector = handle();
    let mut out = [poisoned(), poisoned()];
    assert_eq!(process(detector, &scene(1, 0), &mut out), 1);

    let hand = &out[0];
    assert_eq!(hand.handedness, 0);
    for (j, lm) in hand.landmarks.iter().enumerate() {
        assert_eq!(lm.x, 0.1);
        assert_eq!(lm.y, j as f32 / 21.0);
        assert!((0.0..=1.0).contains(&lm.y));
    }
    assert_eq!(out[1], poisoned());
    unsafe { mediapipe_hand_detector_destroy(detector) };
}

#[test]
fn two_hands_truncated_to_capacity() {
    let detector = handle();
    let mut out = [poisoned(), poisoned()];
    let n = unsafe {
        mediapipe_hand_detector_process(
            detector,
            scene(2, 0).as_ptr(),
            W,
            H,
            out.as_mut_ptr(),
            1,
        )
    };
    assert_eq!(n, 1);
    assert_eq!(out[0].landmarks[0].x, 0.1);
    assert_eq!(out[1], poisoned());
    unsafe { mediapipe_hand_detector_destroy(detector) };
}

#[test]
fn short_landmark_list_leaves_trailing_slots() {
    let detector = handle();
    let mut out = [poisoned()];
    assert_eq!(process(detector, &scene(1, 5), &mut out), 1);
    assert_eq!(out[0].landmarks[4].x, 0.1);
    assert_eq!(out[0].landmarks[5].x, 42.0);
    unsafe { mediapipe_hand_detector_destroy(detector) };
}

#[test]
fn rapid_calls_never_collide() {
    let detector = handle();
    let image = scene(1, 0);
    let mut out = [MediaPipeHand::default(); 2];
    for _ in 0..200 {
        assert_eq!(process(detector, &image, &mut out), 1);
    }
    unsafe { mediapipe_hand_detector_destroy(detector) };
}

#[test]
fn process_ex_zero_fills_and_classifies() {
    let detector = handle();
    let image = scene(2, 5);
    let mut out = [poisoned(), poisoned()];
    let mut count = -1;
    let status = unsafe {
        mediapipe_hand_detector_process_ex(
            detector,
            image.as_ptr(),
            W,
            H,
            out.as_mut_ptr(),
            2,
            &mut count,
        )
    };
    assert_eq!(status, HandDetectorStatus::Ok);
    assert_eq!(count, 2);
    for hand in &out {
        assert_eq!(hand.handedness, 1);
        assert_eq!(hand.landmarks[5], MediaPipeLandmark::default());
    }
    assert_eq!(out[1].landmarks[0].x, 0.2);
    unsafe { mediapipe_hand_detector_destroy(detector) };
}

#[test]
fn process_ex_reports_invalid_arguments() {
    let detector = handle();
    let image = scene(1, 0);
    let mut out = [poisoned()];
    let mut count = -1;

    let status = unsafe {
        mediapipe_hand_detector_process_ex(
            ptr::null_mut(),
            image.as_ptr(),
            W,
            H,
            out.as_mut_ptr(),
            1,
            &mut count,
        )
    };
    assert_eq!(status, HandDetectorStatus::NotInitialized);
    assert_eq!(count, 0);

    let status = unsafe {
        mediapipe_hand_detector_process_ex(
            detector,
            ptr::null(),
            W,
            H,
            out.as_mut_ptr(),
            1,
            &mut count,
        )
    };
    assert_eq!(status, HandDetectorStatus::InvalidArgument);

    let status = unsafe {
        mediapipe_hand_detector_process_ex(
            detector,
            image.as_ptr(),
            W,
            -3,
            out.as_mut_ptr(),
            1,
            &mut count,
        )
    };
    assert_eq!(status, HandDetectorStatus::InvalidArgument);
    assert_eq!(out[0], poisoned());

    unsafe { mediapipe_hand_detector_destroy(detector) };
}

#[test]
fn process_ex_accepts_null_count() {
    let detector = handle();
    let image = scene(0, 0);
    let mut out = [poisoned()];
    let status = unsafe {
        mediapipe_hand_detector_process_ex(
            detector,
            image.as_ptr(),
            W,
            H,
            out.as_mut_ptr(),
            1,
            ptr::null_mut(),
        )
    };
    assert_eq!(status, HandDetectorStatus::Ok);
    unsafe { mediapipe_hand_detector_destroy(detector) };
}

#[test]
fn tracker_failure_is_reported_as_no_output() {
    struct Broken;
    impl HandTracker for Broken {
        fn track(&mut self, _: &Frame) -> Result<Vec<TrackedHand>, Box<dyn std::error::Error>> {
            Err("model crashed".into())
        }
    }
    let factory = ThreadedGraphFactory::new(|_| Ok(Box::new(Broken) as Box<dyn HandTracker>));
    let detector = into_handle(FrameDetector::create(&factory).unwrap());

    let image = scene(1, 0);
    let mut out = [poisoned()];
    assert_eq!(process(detector, &image, &mut out), 0);
    assert_eq!(out[0], poisoned());

    let mut count = -1;
    let status = unsafe {
        mediapipe_hand_detector_process_ex(
            detector,
            image.as_ptr(),
            W,
            H,
            out.as_mut_ptr(),
            1,
            &mut count,
        )
    };
    assert_eq!(status, HandDetectorStatus::NoOutput);
    assert_eq!(count, 0);
    unsafe { mediapipe_hand_detector_destroy(detector) };
}
