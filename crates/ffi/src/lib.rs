//! C ABI over [`FrameDetector`].
//!
//! The declarations live in `include/hand_detector.h`. Every entry point
//! catches panics; none unwinds into the caller.

use std::ffi::{c_char, c_int, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::slice;

use handtrack_core::detector::detection_result::{RawHand, RawLandmark};
use handtrack_core::detector::detector_error::DetectorError;
use handtrack_core::detector::frame_detector::FrameDetector;
use handtrack_core::graph::domain::graph_config::GraphConfig;
use handtrack_core::graph::infrastructure::threaded_graph::ThreadedGraphFactory;
use handtrack_core::shared::settings::TrackerSettings;

pub type MediaPipeLandmark = RawLandmark;
pub type MediaPipeHand = RawHand;

/// Opaque detector handle handed out to C callers.
pub struct MediaPipeHandDetector {
    detector: FrameDetector,
}

/// Outcome of [`mediapipe_hand_detector_process_ex`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandDetectorStatus {
    Ok = 0,
    InvalidArgument = 1,
    NotInitialized = 2,
    EnqueueFailed = 3,
    NoOutput = 4,
    Panic = 5,
}

impl From<&DetectorError> for HandDetectorStatus {
    fn from(e: &DetectorError) -> Self {
        match e {
            DetectorError::InvalidArgument(_) => HandDetectorStatus::InvalidArgument,
            DetectorError::Enqueue(_) => HandDetectorStatus::EnqueueFailed,
            DetectorError::NoOutput(_) => HandDetectorStatus::NoOutput,
            DetectorError::Initialization(_)
            | DetectorError::NotRunning
            | DetectorError::Shutdown(_) => HandDetectorStatus::NotInitialized,
        }
    }
}

/// Boxes a detector into a handle owned by the caller, to be released with
/// [`mediapipe_hand_detector_destroy`].
pub fn into_handle(detector: FrameDetector) -> *mut MediaPipeHandDetector {
    Box::into_raw(Box::new(MediaPipeHandDetector { detector }))
}

/// Creates a detector running the ONNX hand models found through the user's
/// settings. `num_hands` and the confidence thresholds also come from the
/// settings, defaulting to 2 hands and 0.5. Returns null on failure.
#[no_mangle]
pub extern "C" fn mediapipe_hand_detector_create() -> *mut MediaPipeHandDetector {
    create_with_models(None, None)
}

/// Like [`mediapipe_hand_detector_create`], with explicit model files. A null
/// path falls back to the settings.
///
/// # Safety
///
/// Non-null paths must point to NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn mediapipe_hand_detector_create_with_models(
    palm_model_path: *const c_char,
    landmark_model_path: *const c_char,
) -> *mut MediaPipeHandDetector {
    init_logging();
    let (palm, landmark) = match (path_arg(palm_model_path), path_arg(landmark_model_path)) {
        (Ok(palm), Ok(landmark)) => (palm, landmark),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("Invalid model path: {e}");
            return std::ptr::null_mut();
        }
    };
    create_with_models(palm, landmark)
}

/// Stops the detector, waiting for in-flight frames, and frees the handle.
/// Null is a no-op.
///
/// # Safety
///
/// `detector` must be null or a handle from this library that has not been
/// destroyed yet.
#[no_mangle]
pub unsafe extern "C" fn mediapipe_hand_detector_destroy(detector: *mut MediaPipeHandDetector) {
    if detector.is_null() {
        return;
    }
    let handle = Box::from_raw(detector);
    let result = catch_unwind(AssertUnwindSafe(move || handle.detector.shutdown()));
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("{e}"),
        Err(_) => log::error!("Panic while destroying hand detector"),
    }
}

/// Detects hands in a packed BGR image of `width * height * 3` bytes and
/// writes up to `max_hands` of them to `hands`.
///
/// Returns the number of hands written. Any failure returns 0 and leaves
/// `hands` untouched. Only the landmarks a hand reports are written, and
/// `handedness` is the hand's position in the result.
///
/// # Safety
///
/// `detector` must be null or a live handle. Non-null `image_data` must hold
/// `width * height * 3` bytes and non-null `hands` must have room for
/// `max_hands` records. Calls on one handle must not overlap.
#[no_mangle]
pub unsafe extern "C" fn mediapipe_hand_detector_process(
    detector: *mut MediaPipeHandDetector,
    image_data: *const u8,
    width: c_int,
    height: c_int,
    hands: *mut MediaPipeHand,
    max_hands: c_int,
) -> c_int {
    if detector.is_null() || image_data.is_null() || hands.is_null() || max_hands <= 0 {
        return 0;
    }
    let Some((w, h, len)) = image_dims(width, height) else {
        return 0;
    };

    let handle = &mut *detector;
    let image = slice::from_raw_parts(image_data, len);
    let out = slice::from_raw_parts_mut(hands, max_hands as usize);

    catch_unwind(AssertUnwindSafe(|| {
        handle.detector.process_into(image, w, h, out) as c_int
    }))
    .unwrap_or_else(|_| {
        log::error!("Panic while processing frame");
        0
    })
}

/// Like [`mediapipe_hand_detector_process`], but reports why a call failed.
///
/// On success `*out_count` receives the number of hands written; every
/// record gets all 21 landmarks (zero past the ones reported) and the
/// classified handedness (0 left, 1 right, -1 unknown).
///
/// # Safety
///
/// Same as [`mediapipe_hand_detector_process`]; non-null `out_count` must be
/// writable.
#[no_mangle]
pub unsafe extern "C" fn mediapipe_hand_detector_process_ex(
    detector: *mut MediaPipeHandDetector,
    image_data: *const u8,
    width: c_int,
    height: c_int,
    hands: *mut MediaPipeHand,
    max_hands: c_int,
    out_count: *mut c_int,
) -> HandDetectorStatus {
    if !out_count.is_null() {
        *out_count = 0;
    }
    if detector.is_null() {
        return HandDetectorStatus::NotInitialized;
    }
    if image_data.is_null() || hands.is_null() || max_hands < 0 {
        return HandDetectorStatus::InvalidArgument;
    }
    let Some((w, h, len)) = image_dims(width, height) else {
        return HandDetectorStatus::InvalidArgument;
    };

    let handle = &mut *detector;
    let image = slice::from_raw_parts(image_data, len);
    let out = slice::from_raw_parts_mut(hands, max_hands as usize);

    let result = catch_unwind(AssertUnwindSafe(|| handle.detector.process(image, w, h)));
    match result {
        Ok(Ok(detection)) => {
            let written = detection.write_raw(out);
            if !out_count.is_null() {
                *out_count = written as c_int;
            }
            HandDetectorStatus::Ok
        }
        Ok(Err(e)) => {
            log::warn!("Dropping frame: {e}");
            HandDetectorStatus::from(&e)
        }
        Err(_) => {
            log::error!("Panic while processing frame");
            HandDetectorStatus::Panic
        }
    }
}

fn create_with_models(
    palm_model: Option<PathBuf>,
    landmark_model: Option<PathBuf>,
) -> *mut MediaPipeHandDetector {
    init_logging();
    let result = catch_unwind(move || -> Result<FrameDetector, Box<dyn std::error::Error>> {
        let mut settings = TrackerSettings::load()?;
        if palm_model.is_some() {
            settings.palm_model = palm_model;
        }
        if landmark_model.is_some() {
            settings.landmark_model = landmark_model;
        }
        let config = detector_config(&settings);
        Ok(FrameDetector::with_config(
            &config,
            &ThreadedGraphFactory::onnx(settings),
        )?)
    });
    match result {
        Ok(Ok(detector)) => into_handle(detector),
        Ok(Err(e)) => {
            log::warn!("Failed to create hand detector: {e}");
            std::ptr::null_mut()
        }
        Err(_) => {
            log::error!("Panic while creating hand detector");
            std::ptr::null_mut()
        }
    }
}

/// The hand tracking topology with the tracking options from `settings`;
/// unset options keep their defaults.
fn detector_config(settings: &TrackerSettings) -> GraphConfig {
    GraphConfig::hand_tracking_with(settings.hand_tracking_options())
}

/// Validated `(width, height, byte length)` of a packed BGR image. The length
/// must fit a slice, i.e. stay within `isize::MAX` bytes.
fn image_dims(width: c_int, height: c_int) -> Option<(u32, u32, usize)> {
    if width <= 0 || height <= 0 {
        return None;
    }
    let (w, h) = (width as u32, height as u32);
    let len = (w as usize).checked_mul(h as usize)?.checked_mul(3)?;
    if len > isize::MAX as usize {
        return None;
    }
    Some((w, h, len))
}

unsafe fn path_arg(ptr: *const c_char) -> Result<Option<PathBuf>, std::str::Utf8Error> {
    if ptr.is_null() {
        return Ok(None);
    }
    let s = CStr::from_ptr(ptr).to_str()?;
    Ok(Some(PathBuf::from(s)))
}

fn init_logging() {
    let _ = env_logger::try_init();
}
