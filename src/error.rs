//! Error types

use std::path::PathBuf;

use thiserror::Error;

use crate::channel::ChannelId;

/// A single call to an external model or camera failed
#[derive(Debug, Clone, Error)]
pub enum PredictError {
    /// The model rejected or failed the inference call
    #[error("inference failed: {0}")]
    Inference(String),
    /// The predictor task panicked or was aborted
    #[error("prediction task aborted: {0}")]
    Aborted(String),
}

/// Failure while bringing the system up. Fatal to `start`, retryable.
#[derive(Debug, Clone, Error)]
pub enum SetupError {
    #[error("camera setup failed: {0}")]
    Camera(String),
    #[error("{channel} model failed to load: {reason}")]
    Model { channel: ChannelId, reason: String },
    #[error("pose model failed to load: {0}")]
    Pose(String),
    #[error("no {0} predictor configured")]
    MissingPredictor(ChannelId),
    #[error("already running")]
    AlreadyRunning,
}

/// Failure loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
