//! Pose estimation cadence
//!
//! The render loop asks for an estimate every few ticks. At most one estimate
//! is in flight; ticks that land while one is running are skipped. Results
//! travel back to the render loop over a channel tagged with the run they
//! were issued in, and are dropped if that run has ended.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use super::{Pose, PoseEstimator};
use crate::error::PredictError;
use crate::predict::CameraSource;
use crate::telemetry::{report_failure, FailureSource, PipelineMetrics};

/// Issues pose estimates and collects their results
pub struct PoseDriver {
    estimator: Arc<dyn PoseEstimator>,
    camera: Arc<dyn CameraSource>,
    every_n_ticks: u64,
    busy: Arc<AtomicBool>,
    running: AtomicBool,
    /// Bumped on every start and stop; a result is live only while it matches
    generation: Arc<AtomicU64>,
    results_tx: Sender<(u64, Option<Pose>)>,
    results_rx: Receiver<(u64, Option<Pose>)>,
    metrics: Arc<PipelineMetrics>,
}

impl PoseDriver {
    pub fn new(
        estimator: Arc<dyn PoseEstimator>,
        camera: Arc<dyn CameraSource>,
        every_n_ticks: u64,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        let (results_tx, results_rx) = crossbeam_channel::unbounded();
        Self {
            estimator,
            camera,
            every_n_ticks: every_n_ticks.max(1),
            busy: Arc::new(AtomicBool::new(false)),
            running: AtomicBool::new(false),
            generation: Arc::new(AtomicU64::new(0)),
            results_tx,
            results_rx,
            metrics,
        }
    }

    pub fn set_running(&self, running: bool) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.running.store(running, Ordering::Release);
        if !running {
            // Anything already queued belongs to the previous run
            while self.results_rx.try_recv().is_ok() {}
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether an estimate is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Called once per render tick. Returns `true` if an estimate was issued.
    pub fn on_tick(&self, tick: u64, runtime: &tokio::runtime::Handle) -> bool {
        if !self.is_running() || tick % self.every_n_ticks != 0 {
            return false;
        }
        if self.busy.swap(true, Ordering::AcqRel) {
            tracing::trace!("Pose estimate still in flight; skipping");
            return false;
        }

        let Some(frame) = self.camera.current_frame() else {
            self.busy.store(false, Ordering::Release);
            self.metrics.record_missing_frame();
            return false;
        };

        let estimator = Arc::clone(&self.estimator);
        let busy = Arc::clone(&self.busy);
        let generation = Arc::clone(&self.generation);
        let issued_in = generation.load(Ordering::Acquire);
        let results = self.results_tx.clone();
        let metrics = Arc::clone(&self.metrics);

        runtime.spawn(async move {
            let call = tokio::spawn(async move { estimator.estimate(frame).await });
            let result = match call.await {
                Ok(result) => result,
                Err(join_error) => Err(PredictError::Aborted(join_error.to_string())),
            };
            metrics.record_pose_estimate();

            if generation.load(Ordering::Acquire) != issued_in {
                metrics.record_discarded();
                tracing::debug!("Discarding pose estimate from a stopped run");
            } else {
                match result {
                    Ok(pose) => {
                        // Receiver lives as long as the driver; a send error means shutdown
                        let _ = results.send((issued_in, pose));
                    }
                    Err(error) => report_failure(&metrics, FailureSource::Pose, &error),
                }
            }
            busy.store(false, Ordering::Release);
        });

        true
    }

    /// Most recent estimate delivered since the last call.
    ///
    /// `None` when nothing new arrived, when the newest estimate found no
    /// body, or when the driver is stopped. Results issued before the last
    /// start or stop are dropped here as well, which covers a send that
    /// raced the generation bump.
    pub fn take_latest(&self) -> Option<Pose> {
        if !self.is_running() {
            self.results_rx.try_iter().for_each(drop);
            return None;
        }
        let current = self.generation.load(Ordering::Acquire);
        let mut latest = None;
        for (issued_in, pose) in self.results_rx.try_iter() {
            if issued_in == current {
                latest = Some(pose);
            } else {
                self.metrics.record_discarded();
            }
        }
        latest.flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Keypoint;
    use crate::sim::{ScriptedPoseEstimator, SyntheticCamera};

    fn nose_pose() -> Pose {
        Pose::new(vec![Keypoint::new("nose", 100.0, 100.0, 0.9)])
    }

    fn driver(estimator: Arc<ScriptedPoseEstimator>, metrics: &Arc<PipelineMetrics>) -> PoseDriver {
        PoseDriver::new(estimator, Arc::new(SyntheticCamera::new(8, 8)), 12, Arc::clone(metrics))
    }

    async fn settle(driver: &PoseDriver) {
        for _ in 0..1_000 {
            if !driver.is_busy() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_estimates_only_on_cadence_ticks() {
        let metrics = Arc::new(PipelineMetrics::new());
        let estimator = Arc::new(ScriptedPoseEstimator::constant(Some(nose_pose())));
        let driver = driver(estimator.clone(), &metrics);
        driver.set_running(true);
        let runtime = tokio::runtime::Handle::current();

        for tick in 1..12 {
            assert!(!driver.on_tick(tick, &runtime));
        }
        assert!(driver.on_tick(12, &runtime));
        settle(&driver).await;

        assert_eq!(estimator.calls(), 1);
        assert_eq!(driver.take_latest(), Some(nose_pose()));
        assert_eq!(driver.take_latest(), None);
    }

    #[tokio::test]
    async fn test_busy_estimate_blocks_next_issue() {
        let metrics = Arc::new(PipelineMetrics::new());
        let estimator = Arc::new(ScriptedPoseEstimator::constant(Some(nose_pose())));
        let driver = driver(estimator.clone(), &metrics);
        driver.set_running(true);
        let runtime = tokio::runtime::Handle::current();

        assert!(driver.on_tick(0, &runtime));
        // Nothing has been polled yet on the current-thread runtime
        assert!(!driver.on_tick(12, &runtime));
        settle(&driver).await;
        assert!(driver.on_tick(24, &runtime));
        settle(&driver).await;
        assert_eq!(estimator.calls(), 2);
    }

    #[tokio::test]
    async fn test_not_running_issues_nothing() {
        let metrics = Arc::new(PipelineMetrics::new());
        let estimator = Arc::new(ScriptedPoseEstimator::constant(Some(nose_pose())));
        let driver = driver(estimator.clone(), &metrics);
        assert!(!driver.on_tick(0, &tokio::runtime::Handle::current()));
        assert_eq!(estimator.calls(), 0);
    }

    #[tokio::test]
    async fn test_result_after_stop_is_discarded() {
        let metrics = Arc::new(PipelineMetrics::new());
        let estimator = Arc::new(ScriptedPoseEstimator::constant(Some(nose_pose())));
        let driver = driver(estimator, &metrics);
        driver.set_running(true);

        assert!(driver.on_tick(0, &tokio::runtime::Handle::current()));
        driver.set_running(false);
        settle(&driver).await;

        assert_eq!(driver.take_latest(), None);
        assert_eq!(metrics.snapshot().discarded, 1);
    }

    #[tokio::test]
    async fn test_result_from_previous_run_is_discarded() {
        let metrics = Arc::new(PipelineMetrics::new());
        let estimator = Arc::new(ScriptedPoseEstimator::constant(Some(nose_pose())));
        let driver = driver(estimator, &metrics);
        let runtime = tokio::runtime::Handle::current();
        driver.set_running(true);

        assert!(driver.on_tick(0, &runtime));
        // Quick restart while the first estimate is still in flight
        driver.set_running(false);
        driver.set_running(true);
        settle(&driver).await;

        assert!(driver.is_running());
        assert_eq!(driver.take_latest(), None);
        assert_eq!(metrics.snapshot().discarded, 1);

        // The new run still delivers its own estimates
        assert!(driver.on_tick(12, &runtime));
        settle(&driver).await;
        assert_eq!(driver.take_latest(), Some(nose_pose()));
    }

    #[tokio::test]
    async fn test_failures_are_reported_and_recovered() {
        let metrics = Arc::new(PipelineMetrics::new());
        let estimator = Arc::new(ScriptedPoseEstimator::new(vec![
            Err(PredictError::Inference("tensor shape".to_string())),
            Ok(Some(nose_pose())),
        ]));
        let driver = driver(estimator, &metrics);
        driver.set_running(true);
        let runtime = tokio::runtime::Handle::current();

        assert!(driver.on_tick(0, &runtime));
        settle(&driver).await;
        assert_eq!(driver.take_latest(), None);
        assert_eq!(metrics.snapshot().pose_failures, 1);

        assert!(driver.on_tick(12, &runtime));
        settle(&driver).await;
        assert_eq!(driver.take_latest(), Some(nose_pose()));
    }
}
