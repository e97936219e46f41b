//! Pipeline counters
//!
//! Lock-free counters shared between the render loop and background tasks.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::channel::ChannelId;

/// Where a caught failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSource {
    /// A channel's classifier call
    Prediction(ChannelId),
    /// The pose estimator
    Pose,
    /// The camera
    Camera,
}

impl std::fmt::Display for FailureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureSource::Prediction(channel) => write!(f, "{} predictor", channel),
            FailureSource::Pose => f.write_str("pose estimator"),
            FailureSource::Camera => f.write_str("camera"),
        }
    }
}

#[derive(Debug, Default)]
struct ChannelCounters {
    cycles: AtomicU64,
    accepted: AtomicU64,
    failures: AtomicU64,
}

/// Snapshot of one channel's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Completed predictor calls (success or failure)
    pub cycles: u64,
    /// Gate acceptances
    pub accepted: u64,
    /// Failed predictor calls
    pub failures: u64,
}

/// Snapshot of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub channels: [ChannelStats; 2],
    pub pose_estimates: u64,
    pub pose_failures: u64,
    pub camera_failures: u64,
    pub missing_frames: u64,
    /// Results that arrived after stop and were dropped
    pub discarded: u64,
}

impl MetricsSnapshot {
    pub fn channel(&self, id: ChannelId) -> ChannelStats {
        self.channels[id.index()]
    }

    pub fn total_failures(&self) -> u64 {
        self.channels.iter().map(|c| c.failures).sum::<u64>() + self.pose_failures + self.camera_failures
    }
}

/// Counters for the prediction and pose pipelines
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    channels: [ChannelCounters; 2],
    pose_estimates: AtomicU64,
    pose_failures: AtomicU64,
    camera_failures: AtomicU64,
    missing_frames: AtomicU64,
    discarded: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self, channel: ChannelId) {
        self.channels[channel.index()].cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accepted(&self, channel: ChannelId) {
        self.channels[channel.index()].accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pose_estimate(&self) {
        self.pose_estimates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_frame(&self) {
        self.missing_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, source: FailureSource) {
        let counter = match source {
            FailureSource::Prediction(channel) => &self.channels[channel.index()].failures,
            FailureSource::Pose => &self.pose_failures,
            FailureSource::Camera => &self.camera_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let channel = |c: &ChannelCounters| ChannelStats {
            cycles: c.cycles.load(Ordering::Relaxed),
            accepted: c.accepted.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
        };
        MetricsSnapshot {
            channels: [channel(&self.channels[0]), channel(&self.channels[1])],
            pose_estimates: self.pose_estimates.load(Ordering::Relaxed),
            pose_failures: self.pose_failures.load(Ordering::Relaxed),
            camera_failures: self.camera_failures.load(Ordering::Relaxed),
            missing_frames: self.missing_frames.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}
