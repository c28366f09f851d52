use std::time::Instant;

use crate::graph::domain::graph_config::GraphConfig;
use crate::graph::domain::graph_error::GraphError;
use crate::graph::domain::hand_tracking_graph::{GraphFactory, HandTrackingGraph};
use crate::shared::constants::DEFAULT_ALIGNMENT_BOUNDARY;
use crate::shared::frame::Frame;
use crate::shared::timestamp::MonotonicClock;

use super::detection_result::{DetectionResult, RawHand};
use super::detector_error::DetectorError;

/// Owns one running hand tracking graph and feeds it frames one at a time.
///
/// Each call to [`process`](Self::process) pushes one frame and blocks until
/// the graph's output for that frame arrives. Call [`shutdown`](Self::shutdown)
/// to drain the graph and observe teardown errors; dropping the detector
/// tears it down too, logging any error.
pub struct FrameDetector {
    graph: Option<Box<dyn HandTrackingGraph>>,
    clock: MonotonicClock,
    frames_processed: usize,
}

impl FrameDetector {
    /// Starts the default two-hand tracking topology.
    pub fn create(factory: &dyn GraphFactory) -> Result<Self, DetectorError> {
        Self::with_config(&GraphConfig::hand_tracking(), factory)
    }

    pub fn with_config(
        config: &GraphConfig,
        factory: &dyn GraphFactory,
    ) -> Result<Self, DetectorError> {
        let started = config
            .validate()
            .map_err(GraphError::from)
            .and_then(|()| factory.start(config));
        let graph = match started {
            Ok(graph) => graph,
            Err(e) => {
                log::warn!("Hand detector initialization failed: {e}");
                return Err(DetectorError::Initialization(e));
            }
        };

        log::info!(
            "Hand detector started (num_hands={})",
            config.hand_tracking_options().num_hands
        );
        Ok(Self {
            graph: Some(graph),
            clock: MonotonicClock::new(),
            frames_processed: 0,
        })
    }

    pub fn is_running(&self) -> bool {
        self.graph.is_some()
    }

    /// Runs one packed BGR frame (`width * height * 3` bytes) through the
    /// graph.
    pub fn process(
        &mut self,
        bgr: &[u8],
        width: u32,
        height: u32,
    ) -> Result<DetectionResult, DetectorError> {
        let graph = self.graph.as_mut().ok_or(DetectorError::NotRunning)?;
        let start = Instant::now();

        let frame = Frame::from_bgr(
            bgr,
            width,
            height,
            DEFAULT_ALIGNMENT_BOUNDARY,
            self.frames_processed,
        )?;
        let timestamp = self.clock.next();

        graph
            .add_frame(frame, timestamp)
            .map_err(DetectorError::Enqueue)?;
        self.frames_processed += 1;

        let output = graph.next_output().map_err(DetectorError::NoOutput)?;
        if let Some(ts) = output.timestamp.filter(|ts| *ts != timestamp) {
            log::warn!("Output packet for {ts} does not match input {timestamp}");
        }

        let result = DetectionResult::from_output(output, timestamp);
        log::debug!(
            "Frame {}: {} hand(s) in {:.1}ms",
            self.frames_processed - 1,
            result.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(result)
    }

    /// Legacy flattening: writes up to `out.len()` hands and returns the
    /// count. Every failure reads as zero hands and leaves `out` untouched.
    pub fn process_into(
        &mut self,
        bgr: &[u8],
        width: u32,
        height: u32,
        out: &mut [RawHand],
    ) -> usize {
        match self.process(bgr, width, height) {
            Ok(result) => result.write_legacy(out),
            Err(e) => {
                log::warn!("Dropping frame: {e}");
                0
            }
        }
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    /// Closes the graph's inputs and blocks until it has drained and halted.
    pub fn shutdown(mut self) -> Result<(), DetectorError> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<(), DetectorError> {
        let Some(mut graph) = self.graph.take() else {
            return Ok(());
        };
        graph.close_all_inputs().map_err(DetectorError::Shutdown)?;
        graph.wait_until_done().map_err(DetectorError::Shutdown)?;
        log::info!(
            "Hand detector stopped after {} frame(s)",
            self.frames_processed
        );
        Ok(())
    }
}

impl Drop for FrameDetector {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::warn!("{e}");
        }
    }
}
