//! Body pose collaborator and particle attraction
//!
//! The pose estimator is a black box returning at most one body. Tracked
//! keypoints pull groups of particles toward the subject's hands, elbows
//! and nose.

pub mod driver;
pub mod mapper;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::{PredictError, SetupError};
use crate::predict::Frame;

pub use driver::PoseDriver;
pub use mapper::{PoseMapper, PoseParams, TRACKED_PARTS};

/// Body landmarks the particle groups follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPart {
    Nose,
    LeftWrist,
    RightWrist,
    LeftElbow,
    RightElbow,
}

impl BodyPart {
    /// Keypoint name as reported by MoveNet-style estimators
    pub fn keypoint_name(&self) -> &'static str {
        match self {
            BodyPart::Nose => "nose",
            BodyPart::LeftWrist => "left_wrist",
            BodyPart::RightWrist => "right_wrist",
            BodyPart::LeftElbow => "left_elbow",
            BodyPart::RightElbow => "right_elbow",
        }
    }
}

/// One named, scored landmark in detector input coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    /// Detection confidence (0.0-1.0)
    pub score: f32,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f32, y: f32, score: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            score,
        }
    }

    /// Strictly above `floor`
    pub fn is_confident(&self, floor: f32) -> bool {
        self.score > floor
    }
}

/// Keypoints of a single detected body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// First keypoint named after `part`
    pub fn keypoint(&self, part: BodyPart) -> Option<&Keypoint> {
        let name = part.keypoint_name();
        self.keypoints.iter().find(|k| k.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Single-subject pose estimator
pub trait PoseEstimator: Send + Sync {
    /// Load the model. Failure is fatal to starting the system.
    fn load(&self) -> Result<(), SetupError> {
        Ok(())
    }

    /// Zero or one pose for the frame
    fn estimate(&self, frame: Frame) -> BoxFuture<'_, Result<Option<Pose>, PredictError>>;
}
