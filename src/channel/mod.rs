//! Visual channels
//!
//! A channel is an independent visual attribute track ("color", "hair") with
//! its own theme registry, confidence gate and transition state. State is
//! owned by a [`ChannelHandle`] and shared explicitly between the render loop
//! and the prediction scheduler.

pub mod gate;
pub mod state;
pub mod transition;

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::predict::Prediction;
use crate::theme::{Theme, ThemeRegistry};

pub use gate::{decide, ConfidenceGate, GateOutcome};
pub use state::{ChannelState, Phase};
pub use transition::blended_theme;

/// Identifies a visual channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelId {
    /// Shirt color
    Color,
    /// Hairstyle
    Hair,
}

impl ChannelId {
    pub const ALL: [ChannelId; 2] = [ChannelId::Color, ChannelId::Hair];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelId::Color => "color",
            ChannelId::Hair => "hair",
        }
    }

    /// Position in [`ChannelId::ALL`]
    pub fn index(&self) -> usize {
        match self {
            ChannelId::Color => 0,
            ChannelId::Hair => 1,
        }
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct ChannelShared {
    state: ChannelState,
    last_predictions: Vec<Prediction>,
}

/// Shared handle to one channel's transition state.
///
/// All writes go through the inner lock; readers get a consistent snapshot
/// of `(current, target, progress)`.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    inner: Arc<RwLock<ChannelShared>>,
}

impl ChannelHandle {
    pub fn new(state: ChannelState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ChannelShared {
                state,
                last_predictions: Vec::new(),
            })),
        }
    }

    /// Consistent copy of the current state
    pub fn snapshot(&self) -> ChannelState {
        self.inner.read().state.clone()
    }

    /// Mutate the state under the write lock
    pub fn update<R>(&self, f: impl FnOnce(&mut ChannelState) -> R) -> R {
        f(&mut self.inner.write().state)
    }

    /// Advance one tick; returns the committed key when the transition completes
    pub fn advance(&self, step: f32) -> Option<String> {
        self.update(|state| {
            if state.advance(step) {
                Some(state.current_key().to_string())
            } else {
                None
            }
        })
    }

    /// Manual override: retarget unconditionally and restart progress
    pub fn force_target(&self, key: impl Into<String>) {
        self.update(|state| state.set_target(key));
    }

    /// Keep the latest classifier output for status readouts
    pub fn record_predictions(&self, predictions: &[Prediction]) {
        let mut inner = self.inner.write();
        inner.last_predictions.clear();
        inner.last_predictions.extend_from_slice(predictions);
    }

    pub fn last_predictions(&self) -> Vec<Prediction> {
        self.inner.read().last_predictions.clone()
    }
}

/// Everything that defines one channel
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    pub registry: Arc<ThemeRegistry>,
    pub gate: ConfidenceGate,
    pub handle: ChannelHandle,
    /// Key `i` selects the `i`-th registered theme as a manual override
    pub key_bindings: Vec<char>,
}

impl Channel {
    /// Build a channel resting on `default_key`, or on the registry's first
    /// theme when the default is not registered.
    pub fn new(
        id: ChannelId,
        registry: ThemeRegistry,
        threshold: f32,
        default_key: &str,
        key_bindings: Vec<char>,
    ) -> Self {
        let default_key = registry
            .get(default_key)
            .map(|theme| theme.key.clone())
            .or_else(|| registry.first_key().map(str::to_string))
            .unwrap_or_default();

        Self {
            id,
            registry: Arc::new(registry),
            gate: ConfidenceGate::new(threshold),
            handle: ChannelHandle::new(ChannelState::new(default_key)),
            key_bindings,
        }
    }

    /// Theme to render this frame
    pub fn blended_theme(&self) -> Theme {
        blended_theme(&self.registry, &self.handle.snapshot())
    }

    /// Committed theme (ignores any running transition)
    pub fn current_theme(&self) -> &Theme {
        let state = self.handle.snapshot();
        self.registry.lookup(state.current_key())
    }

    /// Theme key bound to `key`, if any. Matching is case-insensitive.
    pub fn binding_for(&self, key: char) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        let index = self
            .key_bindings
            .iter()
            .position(|bound| bound.to_ascii_lowercase() == key)?;
        self.registry.key_at(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::builtin;

    fn color_channel() -> Channel {
        Channel::new(
            ChannelId::Color,
            ThemeRegistry::from_specs(builtin::color_themes(), Vec::new()),
            0.7,
            "red",
            "12345".chars().collect(),
        )
    }

    #[test]
    fn test_channel_id_names() {
        assert_eq!(ChannelId::Color.to_string(), "color");
        assert_eq!(ChannelId::Hair.as_str(), "hair");
        assert_eq!(ChannelId::Hair.index(), 1);
    }

    #[test]
    fn test_unknown_default_falls_back_to_first() {
        let channel = Channel::new(
            ChannelId::Hair,
            ThemeRegistry::from_specs(builtin::hair_themes(), Vec::new()),
            0.75,
            "mohawk",
            Vec::new(),
        );
        assert_eq!(channel.handle.snapshot().current_key(), "kinky");
    }

    #[test]
    fn test_key_bindings_follow_registry_order() {
        let channel = color_channel();
        assert_eq!(channel.binding_for('1'), Some("red"));
        assert_eq!(channel.binding_for('5'), Some("white"));
        assert_eq!(channel.binding_for('6'), None);
        assert_eq!(channel.binding_for('q'), None);
    }

    #[test]
    fn test_force_target_restarts_progress() {
        let channel = color_channel();
        channel.handle.force_target("red");
        let state = channel.handle.snapshot();
        assert_eq!(state.progress(), 0.0);
        assert_eq!(state.target_key(), "red");
        assert_eq!(channel.handle.advance(1.0), Some("red".to_string()));
    }

    #[test]
    fn test_record_predictions_replaces_previous() {
        let channel = color_channel();
        channel.handle.record_predictions(&[Prediction::new("Red", 0.9)]);
        channel.handle.record_predictions(&[Prediction::new("Blue", 0.6)]);
        let last = channel.handle.last_predictions();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].label, "Blue");
    }

    #[test]
    fn test_handle_clones_share_state() {
        let channel = color_channel();
        let other = channel.handle.clone();
        other.force_target("green");
        assert_eq!(channel.handle.snapshot().target_key(), "green");
    }
}
