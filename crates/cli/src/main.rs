use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use serde::Serialize;

use handtrack_core::detector::detection_result::{DetectionResult, Hand};
use handtrack_core::detector::frame_detector::FrameDetector;
use handtrack_core::graph::domain::graph_config::GraphConfig;
use handtrack_core::graph::infrastructure::threaded_graph::ThreadedGraphFactory;
use handtrack_core::shared::bgr_image::{is_image, BgrImage};
use handtrack_core::shared::settings::TrackerSettings;

/// Hand landmark detection for images.
#[derive(Parser)]
#[command(name = "handtrack")]
struct Cli {
    /// Input image files.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Maximum number of hands to report per image.
    #[arg(long)]
    max_hands: Option<u32>,

    /// Palm detection confidence threshold (0.0-1.0).
    #[arg(long)]
    min_detection_confidence: Option<f32>,

    /// Landmark presence threshold for keeping a hand (0.0-1.0).
    #[arg(long)]
    min_tracking_confidence: Option<f32>,

    /// Palm detection ONNX model (overrides settings).
    #[arg(long)]
    palm_model: Option<PathBuf>,

    /// Hand landmark ONNX model (overrides settings).
    #[arg(long)]
    landmark_model: Option<PathBuf>,

    /// Print results as JSON lines instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ImageReport {
    path: String,
    width: u32,
    height: u32,
    hands: Vec<HandReport>,
}

#[derive(Serialize)]
struct HandReport {
    handedness: Option<&'static str>,
    score: f32,
    landmarks: Vec<[f32; 3]>,
}

impl From<&Hand> for HandReport {
    fn from(hand: &Hand) -> Self {
        Self {
            handedness: hand.handedness.map(|h| h.label()),
            score: hand.handedness_score,
            landmarks: hand.landmarks[..hand.landmark_count]
                .iter()
                .map(|lm| [lm.x, lm.y, lm.z])
                .collect(),
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let settings = build_settings(&cli)?;
    let config = GraphConfig::hand_tracking_with(settings.hand_tracking_options());

    for path in &cli.images {
        let image = BgrImage::open(path)?;
        // Unrelated images share no motion, so each gets its own tracking state.
        let mut detector =
            FrameDetector::with_config(&config, &ThreadedGraphFactory::onnx(settings.clone()))?;
        let result = detector.process(&image.data, image.width, image.height)?;
        detector.shutdown()?;

        let report = ImageReport {
            path: path.display().to_string(),
            width: image.width,
            height: image.height,
            hands: result.hands().iter().map(HandReport::from).collect(),
        };
        if cli.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print_text(&report, &result);
        }
    }
    Ok(())
}

/// Settings file and environment, overridden by flags, with both models
/// resolved up front so downloads report progress.
fn build_settings(cli: &Cli) -> Result<TrackerSettings, Box<dyn std::error::Error>> {
    let mut settings = TrackerSettings::load()?;
    if cli.palm_model.is_some() {
        settings.palm_model = cli.palm_model.clone();
    }
    if cli.landmark_model.is_some() {
        settings.landmark_model = cli.landmark_model.clone();
    }
    if cli.max_hands.is_some() {
        settings.num_hands = cli.max_hands;
    }
    if cli.min_detection_confidence.is_some() {
        settings.min_detection_confidence = cli.min_detection_confidence;
    }
    if cli.min_tracking_confidence.is_some() {
        settings.min_tracking_confidence = cli.min_tracking_confidence;
    }

    log::info!("Resolving hand models");
    let models = settings.resolve_models(Some(download_progress))?;
    if end_progress_line() {
        eprintln!();
    }
    settings.palm_model = Some(models.palm_model);
    settings.landmark_model = Some(models.landmark_model);
    Ok(settings)
}

fn print_text(report: &ImageReport, result: &DetectionResult) {
    println!(
        "{} ({}x{}): {} hand(s)",
        report.path,
        report.width,
        report.height,
        result.len()
    );
    for (i, hand) in report.hands.iter().enumerate() {
        let wrist = hand.landmarks.first().copied().unwrap_or_default();
        println!(
            "  #{i} {} ({:.2}), {} landmarks, wrist at ({:.3}, {:.3})",
            hand.handedness.unwrap_or("Unknown"),
            hand.score,
            hand.landmarks.len(),
            wrist[0],
            wrist[1]
        );
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for path in &cli.images {
        if !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
        if !is_image(path) {
            return Err(format!("Unsupported image format: {}", path.display()).into());
        }
    }
    if cli.max_hands == Some(0) {
        return Err("Max hands must be at least 1".into());
    }
    for (flag, value) in [
        ("Min detection confidence", cli.min_detection_confidence),
        ("Min tracking confidence", cli.min_tracking_confidence),
    ] {
        if let Some(v) = value {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("{flag} must be between 0.0 and 1.0, got {v}").into());
            }
        }
    }
    Ok(())
}

/// Set once a download has printed a progress line.
static PROGRESS_SHOWN: AtomicBool = AtomicBool::new(false);

/// True when a progress line is left open, clearing the flag.
fn end_progress_line() -> bool {
    PROGRESS_SHOWN.swap(false, Ordering::Relaxed)
}

fn download_progress(downloaded: u64, total: u64) {
    PROGRESS_SHOWN.store(true, Ordering::Relaxed);
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading hand model... {pct}%");
    } else {
        eprint!("\rDownloading hand model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line_only_ended_after_download() {
        assert!(!end_progress_line());
        download_progress(10, 100);
        assert!(end_progress_line());
        assert!(!end_progress_line());
    }
}
