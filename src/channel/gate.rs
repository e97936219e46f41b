//! Confidence gate
//!
//! Decides whether one inference call's output should become a channel's
//! next target. Noisy or repeated detections are filtered out here so the
//! transition machine only ever sees real changes.

use super::state::ChannelState;
use super::ChannelHandle;
use crate::label::normalize;
use crate::predict::Prediction;
use crate::theme::ThemeRegistry;

/// Result of evaluating one inference call
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// The resolved theme key becomes the new target
    Accepted(String),
    /// No usable prediction in the call
    Empty,
    /// Top prediction was under the channel threshold
    BelowThreshold { label: String, probability: f32 },
    /// Top label has no theme in this channel
    UnknownLabel(String),
    /// Top label resolves to the theme already being targeted
    AlreadyTarget(String),
}

impl GateOutcome {
    pub fn accepted_key(&self) -> Option<&str> {
        match self {
            GateOutcome::Accepted(key) => Some(key),
            _ => None,
        }
    }
}

/// Highest-probability prediction; ties go to the earliest entry.
/// NaN probabilities are ignored.
pub fn top_prediction(predictions: &[Prediction]) -> Option<&Prediction> {
    let mut best: Option<&Prediction> = None;
    for prediction in predictions.iter().filter(|p| !p.probability.is_nan()) {
        match best {
            Some(current) if prediction.probability <= current.probability => {}
            _ => best = Some(prediction),
        }
    }
    best
}

/// Key that `predictions` would retarget the channel to, if any
pub fn decide(
    registry: &ThemeRegistry,
    state: &ChannelState,
    predictions: &[Prediction],
    threshold: f32,
) -> Option<String> {
    match ConfidenceGate::new(threshold).evaluate(registry, state, predictions) {
        GateOutcome::Accepted(key) => Some(key),
        _ => None,
    }
}

/// Per-channel confidence gate with a fixed threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    threshold: f32,
}

impl ConfidenceGate {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Evaluate predictions against `state` without mutating anything
    pub fn evaluate(
        &self,
        registry: &ThemeRegistry,
        state: &ChannelState,
        predictions: &[Prediction],
    ) -> GateOutcome {
        let Some(best) = top_prediction(predictions) else {
            return GateOutcome::Empty;
        };

        if best.probability < self.threshold {
            return GateOutcome::BelowThreshold {
                label: best.label.clone(),
                probability: best.probability,
            };
        }

        let label = normalize(&best.label);
        let Some(key) = registry.resolve(&label) else {
            return GateOutcome::UnknownLabel(label);
        };

        if key == state.target_key() {
            return GateOutcome::AlreadyTarget(key.to_string());
        }

        GateOutcome::Accepted(key.to_string())
    }

    /// Evaluate and, on acceptance, retarget the channel.
    ///
    /// Evaluation and write happen under one write lock.
    pub fn apply(
        &self,
        registry: &ThemeRegistry,
        handle: &ChannelHandle,
        predictions: &[Prediction],
    ) -> GateOutcome {
        handle.update(|state| self.retarget(registry, state, predictions))
    }

    /// Like [`apply`](Self::apply), but `live` is checked under the same
    /// write lock and the channel is left alone when it returns `false`.
    pub fn apply_while(
        &self,
        registry: &ThemeRegistry,
        handle: &ChannelHandle,
        predictions: &[Prediction],
        live: impl FnOnce() -> bool,
    ) -> Option<GateOutcome> {
        handle.update(|state| live().then(|| self.retarget(registry, state, predictions)))
    }

    fn retarget(&self, registry: &ThemeRegistry, state: &mut ChannelState, predictions: &[Prediction]) -> GateOutcome {
        let outcome = self.evaluate(registry, state, predictions);
        if let GateOutcome::Accepted(key) = &outcome {
            state.set_target(key.clone());
        }
        outcome
    }
}
