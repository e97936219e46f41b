//! Classifier collaborators and the prediction scheduler
//!
//! The camera and the image classifiers are black boxes behind traits. The
//! scheduler polls each channel's classifier on its own lane and feeds the
//! results to that channel's confidence gate.

pub mod clock;
pub mod scheduler;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{PredictError, SetupError};

pub use clock::{Clock, TokioClock};
pub use scheduler::{Lane, PredictionScheduler, SchedulerHandle};

/// A captured camera frame, cheap to share between lanes
pub type Frame = Arc<RgbaImage>;

/// One labeled probability from a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }

    /// "Red: 95.0%"
    pub fn readout(&self) -> String {
        format!("{}: {:.1}%", self.label, self.probability * 100.0)
    }
}

/// Source of camera frames
pub trait CameraSource: Send + Sync {
    /// Open the device. Failure is fatal to starting the system.
    fn start(&self) -> Result<(), SetupError>;

    /// Latest frame, or `None` when no frame is available
    fn current_frame(&self) -> Option<Frame>;

    /// Release the device
    fn stop(&self) {}
}

/// Image classifier for one channel
pub trait Predictor: Send + Sync {
    /// Load or warm up the model. Failure is fatal to starting the system.
    fn load(&self) -> Result<(), SetupError> {
        Ok(())
    }

    /// Classify a frame into labeled probabilities.
    fn predict(&self, frame: Frame) -> BoxFuture<'_, Result<Vec<Prediction>, PredictError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_readout() {
        assert_eq!(Prediction::new("Red", 0.95).readout(), "Red: 95.0%");
        assert_eq!(Prediction::new("Wavy", 0.1234).readout(), "Wavy: 12.3%");
    }
}
