//! Cheese Vision Library
//!
//! Turns noisy webcam classifier output (shirt color, hairstyle) into smooth,
//! themed particle transitions, optionally steered by body pose keypoints.
//! Cameras, models and the drawing surface are collaborators behind traits.

pub mod app;
pub mod channel;
pub mod config;
pub mod error;
pub mod input;
pub mod label;
pub mod particles;
pub mod pose;
pub mod predict;
pub mod render;
pub mod sim;
pub mod telemetry;
pub mod theme;

pub use app::{CheeseApp, Collaborators, Status, Summary};
pub use channel::{blended_theme, Channel, ChannelHandle, ChannelId, ChannelState, ConfidenceGate, GateOutcome, Phase};
pub use config::{AppConfig, ChannelConfig};
pub use error::{ConfigError, PredictError, SetupError};
pub use input::{InputEvent, InputQueue};
pub use particles::{Particle, ParticleParams, ParticleSystem};
pub use pose::{Keypoint, Pose, PoseEstimator, PoseMapper};
pub use predict::{CameraSource, Clock, Frame, Prediction, PredictionScheduler, Predictor, SchedulerHandle, TokioClock};
pub use render::{Primitive, RenderSurface, Style};
pub use theme::{Rgb, TextureTag, Theme, ThemeRegistry, ThemeSpec};
