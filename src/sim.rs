//! Simulated collaborators
//!
//! Stand-ins for the webcam, the classifiers, the pose model and the render
//! surface. The demo binary runs the engine headless on these and the tests
//! script them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use glam::Vec2;
use image::{Rgba, RgbaImage};

use crate::channel::ChannelId;
use crate::error::{PredictError, SetupError};
use crate::pose::{Pose, PoseEstimator};
use crate::predict::{CameraSource, Frame, Prediction, Predictor};
use crate::render::{Primitive, RenderSurface, Style};

/// Camera producing one solid-color frame
pub struct SyntheticCamera {
    frame: Option<Frame>,
    /// Starts that still fail before the camera opens; `usize::MAX` never opens
    failures_left: AtomicUsize,
    failure_reason: String,
    starts: AtomicUsize,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_color(width, height, [200, 40, 40, 255])
    }

    pub fn with_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            frame: Some(Arc::new(RgbaImage::from_pixel(width, height, Rgba(color)))),
            failures_left: AtomicUsize::new(0),
            failure_reason: String::new(),
            starts: AtomicUsize::new(0),
        }
    }

    /// Opens fine but never has a frame
    pub fn without_frames() -> Self {
        Self {
            frame: None,
            ..Self::new(1, 1)
        }
    }

    /// Every start fails
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::failing_times(usize::MAX, reason)
    }

    /// The first `times` starts fail, later ones succeed
    pub fn failing_times(times: usize, reason: impl Into<String>) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            failure_reason: reason.into(),
            ..Self::new(8, 8)
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl CameraSource for SyntheticCamera {
    fn start(&self) -> Result<(), SetupError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left == 0 {
            return Ok(());
        }
        if left != usize::MAX {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
        }
        Err(SetupError::Camera(self.failure_reason.clone()))
    }

    fn current_frame(&self) -> Option<Frame> {
        self.frame.clone()
    }
}

/// Predictor that replays a script of results, cycling when it runs out
pub struct ScriptedPredictor {
    steps: Vec<Result<Vec<Prediction>, PredictError>>,
    calls: AtomicUsize,
    load_error: Option<SetupError>,
}

impl ScriptedPredictor {
    pub fn new(steps: Vec<Result<Vec<Prediction>, PredictError>>) -> Self {
        Self {
            steps,
            calls: AtomicUsize::new(0),
            load_error: None,
        }
    }

    /// Same predictions on every call
    pub fn constant(predictions: Vec<Prediction>) -> Self {
        Self::new(vec![Ok(predictions)])
    }

    /// Loading the model fails for `channel`
    pub fn failing_load(channel: ChannelId, reason: impl Into<String>) -> Self {
        Self {
            load_error: Some(SetupError::Model {
                channel,
                reason: reason.into(),
            }),
            ..Self::new(Vec::new())
        }
    }

    /// Number of predict calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Predictor for ScriptedPredictor {
    fn load(&self) -> Result<(), SetupError> {
        match &self.load_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn predict(&self, _frame: Frame) -> BoxFuture<'_, Result<Vec<Prediction>, PredictError>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = if self.steps.is_empty() {
            Ok(Vec::new())
        } else {
            self.steps[call % self.steps.len()].clone()
        };
        future::ready(step).boxed()
    }
}

/// Pose estimator that replays a script of results, cycling when it runs out
pub struct ScriptedPoseEstimator {
    steps: Vec<Result<Option<Pose>, PredictError>>,
    calls: AtomicUsize,
    load_error: Option<String>,
}

impl ScriptedPoseEstimator {
    pub fn new(steps: Vec<Result<Option<Pose>, PredictError>>) -> Self {
        Self {
            steps,
            calls: AtomicUsize::new(0),
            load_error: None,
        }
    }

    pub fn constant(pose: Option<Pose>) -> Self {
        Self::new(vec![Ok(pose)])
    }

    pub fn failing_load(reason: impl Into<String>) -> Self {
        Self {
            load_error: Some(reason.into()),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PoseEstimator for ScriptedPoseEstimator {
    fn load(&self) -> Result<(), SetupError> {
        match &self.load_error {
            Some(reason) => Err(SetupError::Pose(reason.clone())),
            None => Ok(()),
        }
    }

    fn estimate(&self, _frame: Frame) -> BoxFuture<'_, Result<Option<Pose>, PredictError>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = if self.steps.is_empty() {
            Ok(None)
        } else {
            self.steps[call % self.steps.len()].clone()
        };
        future::ready(step).boxed()
    }
}

/// Surface that keeps every draw call
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: Vec2,
    calls: Vec<(Primitive, Style)>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[(Primitive, Style)] {
        &self.calls
    }

    /// Content of every text primitive, in draw order
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|(primitive, _)| match primitive {
                Primitive::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn draw(&mut self, primitive: &Primitive, style: &Style) {
        self.calls.push((primitive.clone(), *style));
    }
}
