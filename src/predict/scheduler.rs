//! Prediction scheduler
//!
//! One lane per channel. Each lane grabs the latest camera frame, runs its
//! predictor, feeds the result through the channel's confidence gate, then
//! sleeps for the poll interval before the next cycle. Lanes never overlap
//! themselves but run concurrently with each other, so a slow or hung
//! classifier only delays its own channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{CameraSource, Clock, Predictor};
use crate::channel::{Channel, GateOutcome};
use crate::error::PredictError;
use crate::telemetry::{report_failure, FailureSource, PipelineMetrics};

/// A channel paired with the classifier that drives it
pub struct Lane {
    pub channel: Channel,
    pub predictor: Arc<dyn Predictor>,
}

impl Lane {
    pub fn new(channel: Channel, predictor: Arc<dyn Predictor>) -> Self {
        Self { channel, predictor }
    }

    /// Run one prediction cycle.
    ///
    /// Returns the gate outcome, or `None` when the cycle produced nothing to
    /// gate (no frame, failed call, or stopped while in flight).
    async fn run_cycle(
        &self,
        camera: &dyn CameraSource,
        metrics: &PipelineMetrics,
        stop: &watch::Receiver<bool>,
    ) -> Option<GateOutcome> {
        let id = self.channel.id;

        let Some(frame) = camera.current_frame() else {
            metrics.record_missing_frame();
            tracing::debug!(channel = %id, "No camera frame; skipping cycle");
            return None;
        };

        // Run the call as its own task so a panicking predictor is contained
        let predictor = Arc::clone(&self.predictor);
        let result = match tokio::spawn(async move { predictor.predict(frame).await }).await {
            Ok(result) => result,
            Err(join_error) => Err(PredictError::Aborted(join_error.to_string())),
        };
        metrics.record_cycle(id);

        if *stop.borrow() {
            metrics.record_discarded();
            tracing::debug!(channel = %id, "Discarding prediction that finished after stop");
            return None;
        }

        let predictions = match result {
            Ok(predictions) => predictions,
            Err(error) => {
                report_failure(metrics, FailureSource::Prediction(id), &error);
                return None;
            }
        };

        // Stop is checked again under the channel lock so a stop that lands
        // after the check above still keeps this result out
        let Some(outcome) = self.channel.gate.apply_while(
            &self.channel.registry,
            &self.channel.handle,
            &predictions,
            || !*stop.borrow(),
        ) else {
            metrics.record_discarded();
            tracing::debug!(channel = %id, "Discarding prediction that finished after stop");
            return None;
        };
        self.channel.handle.record_predictions(&predictions);

        match &outcome {
            GateOutcome::Accepted(key) => {
                metrics.record_accepted(id);
                tracing::info!(channel = %id, target = %key, "New target");
            }
            other => tracing::trace!(channel = %id, outcome = ?other, "Prediction gated out"),
        }
        Some(outcome)
    }
}

/// Builder for the polling lanes
pub struct PredictionScheduler {
    lanes: Vec<Lane>,
    camera: Arc<dyn CameraSource>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    metrics: Arc<PipelineMetrics>,
}

impl PredictionScheduler {
    pub fn new(
        camera: Arc<dyn CameraSource>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            lanes: Vec::new(),
            camera,
            clock,
            interval,
            metrics,
        }
    }

    /// Add a lane for `channel`
    pub fn with_lane(mut self, channel: Channel, predictor: Arc<dyn Predictor>) -> Self {
        self.lanes.push(Lane::new(channel, predictor));
        self
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Spawn every lane on `runtime` and return the stop handle
    pub fn start(self, runtime: &tokio::runtime::Handle) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);

        let tasks = self
            .lanes
            .into_iter()
            .map(|lane| {
                let camera = Arc::clone(&self.camera);
                let clock = Arc::clone(&self.clock);
                let metrics = Arc::clone(&self.metrics);
                let stop = stop_rx.clone();
                let interval = self.interval;
                runtime.spawn(run_lane(lane, camera, clock, interval, metrics, stop))
            })
            .collect();

        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Prediction scheduler started");

        SchedulerHandle { stop_tx, tasks }
    }
}

async fn run_lane(
    lane: Lane,
    camera: Arc<dyn CameraSource>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    metrics: Arc<PipelineMetrics>,
    mut stop: watch::Receiver<bool>,
) {
    let id = lane.channel.id;
    tracing::debug!(channel = %id, "Prediction lane running");

    loop {
        if *stop.borrow() {
            break;
        }

        lane.run_cycle(camera.as_ref(), &metrics, &stop).await;

        if *stop.borrow() {
            break;
        }

        tokio::select! {
            _ = clock.sleep(interval) => {}
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(channel = %id, "Prediction lane stopped");
}

/// Running scheduler. Dropping the handle stops it.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Prevent any further cycles. In-flight calls finish and are discarded.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Whether every lane task has exited
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|task| task.is_finished())
    }

    /// Stop and wait for every lane to exit, including in-flight calls
    pub async fn join(mut self) {
        self.stop();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::warn!("Prediction lane ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
