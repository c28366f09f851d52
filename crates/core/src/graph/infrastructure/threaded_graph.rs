use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::graph::domain::graph_config::{GraphConfig, HandTrackingOptions};
use crate::graph::domain::graph_error::GraphError;
use crate::graph::domain::hand_tracking_graph::{GraphFactory, HandTrackingGraph};
use crate::graph::domain::packet::{Classification, HandTrackingOutput};
use crate::shared::constants::GRAPH_CHANNEL_CAPACITY;
use crate::shared::frame::Frame;
use crate::shared::settings::TrackerSettings;
use crate::shared::timestamp::Timestamp;
use crate::tracking::domain::hand_tracker::{HandTracker, TrackedHand};
use crate::tracking::infrastructure::landmark_tracker::LandmarkTracker;

/// Builds the tracker a graph runs, from the tracking node's options.
pub type TrackerBuilder = Box<
    dyn Fn(&HandTrackingOptions) -> Result<Box<dyn HandTracker>, Box<dyn std::error::Error>>
        + Send
        + Sync,
>;

type OutputResult = Result<HandTrackingOutput, GraphError>;

const WORKER_THREAD_NAME: &str = "hand-tracking-graph";

/// Starts [`ThreadedHandGraph`]s around trackers produced by a builder.
pub struct ThreadedGraphFactory {
    builder: TrackerBuilder,
    channel_capacity: usize,
}

impl ThreadedGraphFactory {
    pub fn new(
        builder: impl Fn(&HandTrackingOptions) -> Result<Box<dyn HandTracker>, Box<dyn std::error::Error>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            builder: Box::new(builder),
            channel_capacity: GRAPH_CHANNEL_CAPACITY,
        }
    }

    /// Factory for graphs running the ONNX palm detection and hand landmark
    /// models. Models are resolved from `settings` each time a graph starts.
    pub fn onnx(settings: TrackerSettings) -> Self {
        Self::new(move |options| {
            let models = settings.resolve_models(None)?;
            let tracker = LandmarkTracker::onnx(&models, options)?;
            Ok(Box::new(tracker) as Box<dyn HandTracker>)
        })
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

impl GraphFactory for ThreadedGraphFactory {
    fn start(&self, config: &GraphConfig) -> Result<Box<dyn HandTrackingGraph>, GraphError> {
        config.validate()?;
        let options = config.hand_tracking_options();
        let node = config
            .hand_tracking_node()
            .ok_or_else(|| GraphError::Start("no hand tracking node".into()))?;
        let input_stream = node
            .input_for_tag("IMAGE")
            .unwrap_or(&config.input_streams[0])
            .to_string();
        let output_stream = node
            .output_for_tag("LANDMARKS")
            .ok_or_else(|| GraphError::Start("hand tracking node has no LANDMARKS output".into()))?
            .to_string();

        let tracker = (self.builder)(&options).map_err(|e| GraphError::Start(e.to_string()))?;
        log::debug!(
            "Starting hand tracking graph: {input_stream} -> {output_stream}, num_hands={}",
            options.num_hands
        );

        Ok(Box::new(ThreadedHandGraph::spawn(
            tracker,
            options.num_hands as usize,
            input_stream,
            output_stream,
            self.channel_capacity,
        )?))
    }
}

/// Runs a [`HandTracker`] on a dedicated worker thread.
///
/// Layout: `add_frame → [frames] → worker(track) → [outputs] → next_output`
///
/// Both queues are bounded; a caller that keeps adding frames without taking
/// outputs eventually blocks in `add_frame`.
pub struct ThreadedHandGraph {
    input_stream: String,
    output_stream: String,
    frame_tx: Option<Sender<(Frame, Timestamp)>>,
    output_rx: Receiver<OutputResult>,
    worker: Option<JoinHandle<()>>,
    last_timestamp: Option<Timestamp>,
}

impl ThreadedHandGraph {
    pub fn spawn(
        tracker: Box<dyn HandTracker>,
        num_hands: usize,
        input_stream: String,
        output_stream: String,
        channel_capacity: usize,
    ) -> Result<Self, GraphError> {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(channel_capacity);
        let (output_tx, output_rx) = crossbeam_channel::bounded(channel_capacity);
        let worker = spawn_worker(tracker, num_hands, frame_rx, output_tx)
            .map_err(|e| GraphError::Start(format!("failed to spawn graph worker: {e}")))?;
        Ok(Self {
            input_stream,
            output_stream,
            frame_tx: Some(frame_tx),
            output_rx,
            worker: Some(worker),
            last_timestamp: None,
        })
    }
}

impl HandTrackingGraph for ThreadedHandGraph {
    fn add_frame(&mut self, frame: Frame, timestamp: Timestamp) -> Result<(), GraphError> {
        if let Some(previous) = self.last_timestamp {
            if timestamp <= previous {
                return Err(GraphError::TimestampMismatch {
                    previous,
                    current: timestamp,
                });
            }
        }
        let tx = self
            .frame_tx
            .as_ref()
            .ok_or_else(|| GraphError::InputClosed(self.input_stream.clone()))?;
        tx.send((frame, timestamp))
            .map_err(|_| GraphError::InputClosed(self.input_stream.clone()))?;
        self.last_timestamp = Some(timestamp);
        Ok(())
    }

    fn next_output(&mut self) -> Result<HandTrackingOutput, GraphError> {
        self.output_rx
            .recv()
            .map_err(|_| GraphError::OutputClosed(self.output_stream.clone()))?
    }

    fn close_all_inputs(&mut self) -> Result<(), GraphError> {
        self.frame_tx = None;
        Ok(())
    }

    fn wait_until_done(&mut self) -> Result<(), GraphError> {
        self.close_all_inputs()?;
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        // The worker may be blocked on a full output queue.
        let discarded = self.output_rx.iter().count();
        if discarded > 0 {
            log::debug!("Discarded {discarded} unread output packet(s) on shutdown");
        }

        worker.join().map_err(|_| GraphError::WorkerPanicked)
    }
}

impl Drop for ThreadedHandGraph {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.wait_until_done() {
                log::warn!("Hand tracking graph did not shut down cleanly: {e}");
            }
        }
    }
}

fn spawn_worker(
    mut tracker: Box<dyn HandTracker>,
    num_hands: usize,
    frame_rx: Receiver<(Frame, Timestamp)>,
    output_tx: Sender<OutputResult>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name(WORKER_THREAD_NAME.into())
        .spawn(move || {
            for (frame, timestamp) in frame_rx {
                let result = match tracker.track(&frame) {
                    Ok(hands) => Ok(to_output(timestamp, hands, num_hands)),
                    Err(e) => Err(GraphError::Calculator {
                        timestamp,
                        message: e.to_string(),
                    }),
                };
                if output_tx.send(result).is_err() {
                    break;
                }
            }
        })
}

fn to_output(timestamp: Timestamp, hands: Vec<TrackedHand>, num_hands: usize) -> HandTrackingOutput {
    let mut output = HandTrackingOutput::empty(timestamp);
    for hand in hands.into_iter().take(num_hands) {
        output.handedness.push(Classification::from_handedness(
            hand.handedness,
            hand.handedness_score,
        ));
        output.landmarks.push(hand.landmarks);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::landmark::{Handedness, Landmark};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeTracker {
        hands_per_frame: usize,
        calls: Arc<AtomicUsize>,
    }

    impl HandTracker for FakeTracker {
        fn track(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<TrackedHand>, Box<dyn std::error::Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..self.hands_per_frame)
                .map(|i| hand(i, frame.index()))
                .collect())
        }
    }

    struct FailingTracker;

    impl HandTracker for FailingTracker {
        fn track(&mut self, _frame: &Frame) -> Result<Vec<TrackedHand>, Box<dyn std::error::Error>> {
            Err("inference failed".into())
        }
    }

    struct PanickingTracker;

    impl HandTracker for PanickingTracker {
        fn track(&mut self, _frame: &Frame) -> Result<Vec<TrackedHand>, Box<dyn std::error::Error>> {
            panic!("tracker exploded");
        }
    }

    struct ThreadNameTracker {
        seen: Arc<std::sync::Mutex<Option<String>>>,
    }

    impl HandTracker for ThreadNameTracker {
        fn track(&mut self, _frame: &Frame) -> Result<Vec<TrackedHand>, Box<dyn std::error::Error>> {
            *self.seen.lock().unwrap() = std::thread::current().name().map(str::to_string);
            Ok(Vec::new())
        }
    }

    fn hand(i: usize, frame_index: usize) -> TrackedHand {
        TrackedHand {
            landmarks: vec![
                Landmark {
                    x: frame_index as f32,
                    y: i as f32,
                    ..Default::default()
                };
                21
            ],
            handedness: if i == 0 {
                Handedness::Left
            } else {
                Handedness::Right
            },
            handedness_score: if i == 0 { 0.1 } else { 0.9 },
            presence: 0.99,
        }
    }

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, index)
    }

    fn graph(tracker: Box<dyn HandTracker>, num_hands: usize) -> ThreadedHandGraph {
        ThreadedHandGraph::spawn(
            tracker,
            num_hands,
            "input_video".into(),
            "hand_landmarks".into(),
            2,
        )
        .unwrap()
    }

    fn fake(hands_per_frame: usize) -> (Box<dyn HandTracker>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let tracker = FakeTracker {
            hands_per_frame,
            calls: calls.clone(),
        };
        (Box::new(tracker), calls)
    }

    fn ts(us: i64) -> Timestamp {
        Timestamp::from_micros(us)
    }

    #[test]
    fn test_worker_thread_is_named() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let mut g = graph(Box::new(ThreadNameTracker { seen: seen.clone() }), 2);
        g.add_frame(frame(0), Timestamp::from_micros(1)).unwrap();
        g.next_output().unwrap();
        assert_eq!(seen.lock().unwrap().as_deref(), Some(WORKER_THREAD_NAME));
    }

    #[test]
    fn test_one_output_per_frame_in_order() {
        let (tracker, calls) = fake(1);
        let mut g = graph(tracker, 2);

        for i in 0..5 {
            g.add_frame(frame(i), ts(i as i64 + 1)).unwrap();
            let out = g.next_output().unwrap();
            assert_eq!(out.timestamp, Some(ts(i as i64 + 1)));
            assert_eq!(out.hand_count(), 1);
            assert_eq!(out.landmarks[0][0].x, i as f32);
        }
        g.wait_until_done().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_output_capped_at_num_hands_with_parallel_handedness() {
        let (tracker, _) = fake(3);
        let mut g = graph(tracker, 2);
        g.add_frame(frame(0), ts(1)).unwrap();
        let out = g.next_output().unwrap();
        assert_eq!(out.landmarks.len(), 2);
        assert_eq!(out.handedness.len(), 2);
        assert_eq!(out.handedness[0].label, "Left");
        assert_eq!(out.handedness[1].label, "Right");
    }

    #[test]
    fn test_rejects_non_increasing_timestamp() {
        let (tracker, _) = fake(0);
        let mut g = graph(tracker, 2);
        g.add_frame(frame(0), ts(10)).unwrap();
        g.next_output().unwrap();

        let err = g.add_frame(frame(1), ts(10)).unwrap_err();
        assert!(matches!(
            err,
            GraphError::TimestampMismatch { previous, current } if previous == ts(10) && current == ts(10)
        ));
        assert!(g.add_frame(frame(2), ts(5)).is_err());
        assert!(g.add_frame(frame(3), ts(11)).is_ok());
    }

    #[test]
    fn test_add_after_close_is_rejected() {
        let (tracker, _) = fake(0);
        let mut g = graph(tracker, 2);
        g.close_all_inputs().unwrap();
        assert!(matches!(
            g.add_frame(frame(0), ts(1)),
            Err(GraphError::InputClosed(ref s)) if s == "input_video"
        ));
    }

    #[test]
    fn test_tracker_error_becomes_error_packet() {
        let mut g = graph(Box::new(FailingTracker), 2);
        g.add_frame(frame(0), ts(1)).unwrap();
        let err = g.next_output().unwrap_err();
        assert!(err.to_string().contains("inference failed"));
        // The graph keeps running after a failed frame.
        g.add_frame(frame(1), ts(2)).unwrap();
        assert!(g.next_output().is_err());
        g.wait_until_done().unwrap();
    }

    #[test]
    fn test_wait_until_done_drains_unread_outputs() {
        let (tracker, calls) = fake(1);
        let mut g = graph(tracker, 2);
        for i in 0..3 {
            g.add_frame(frame(i), ts(i as i64 + 1)).unwrap();
        }
        g.wait_until_done().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_wait_until_done_is_idempotent() {
        let (tracker, _) = fake(0);
        let mut g = graph(tracker, 2);
        g.wait_until_done().unwrap();
        g.wait_until_done().unwrap();
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let mut g = graph(Box::new(PanickingTracker), 2);
        g.add_frame(frame(0), ts(1)).unwrap();
        assert!(matches!(
            g.next_output(),
            Err(GraphError::OutputClosed(ref s)) if s == "hand_landmarks"
        ));
        assert!(matches!(g.wait_until_done(), Err(GraphError::WorkerPanicked)));
    }

    #[test]
    fn test_factory_starts_graph_from_config() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_builder = seen.clone();
        let factory = ThreadedGraphFactory::new(move |options| {
            seen_in_builder.store(options.num_hands as usize, Ordering::SeqCst);
            Ok(Box::new(FakeTracker {
                hands_per_frame: 1,
                calls: Arc::new(AtomicUsize::new(0)),
            }) as Box<dyn HandTracker>)
        });

        let mut g = factory.start(&GraphConfig::hand_tracking()).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        g.add_frame(frame(0), ts(1)).unwrap();
        assert_eq!(g.next_output().unwrap().hand_count(), 1);
        g.close_all_inputs().unwrap();
        g.wait_until_done().unwrap();
    }

    #[test]
    fn test_factory_reports_builder_failure() {
        let factory = ThreadedGraphFactory::new(|_| Err("model missing".into()));
        let err = factory.start(&GraphConfig::hand_tracking()).err().unwrap();
        assert!(matches!(err, GraphError::Start(ref m) if m.contains("model missing")));
    }

    #[test]
    fn test_onnx_factory_reports_missing_models() {
        let settings = TrackerSettings {
            palm_model: Some("/nonexistent/palm.onnx".into()),
            landmark_model: Some("/nonexistent/hand.onnx".into()),
            ..Default::default()
        };
        let err = ThreadedGraphFactory::onnx(settings)
            .start(&GraphConfig::hand_tracking())
            .err()
            .unwrap();
        assert!(matches!(err, GraphError::Start(ref m) if m.contains("model not found")));
    }

    #[test]
    fn test_factory_rejects_invalid_config() {
        let factory = ThreadedGraphFactory::new(|_| Err("unreachable".into()));
        let mut config = GraphConfig::hand_tracking();
        config.output_streams.push("nowhere".into());
        let err = factory.start(&config).err().unwrap();
        assert!(matches!(err, GraphError::InvalidConfig(_)));
    }
}
