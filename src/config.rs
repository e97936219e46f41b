//! Application configuration
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! none at all) is fine. Values are clamped into range after loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::channel::{Channel, ChannelId};
use crate::error::ConfigError;
use crate::particles::ParticleParams;
use crate::pose::PoseParams;
use crate::telemetry::LogConfig;
use crate::theme::{builtin, ThemeRegistry, ThemeSpec};

/// Per-channel overrides. Anything left out falls back to the channel's
/// built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Minimum top-prediction probability to accept a new target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    /// Theme the channel rests on at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_key: Option<String>,
    /// Override keys; the i-th character selects the i-th theme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<String>,
    /// Replaces the built-in theme table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub themes: Option<Vec<ThemeSpec>>,
    /// Extra classifier label to theme key mappings
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
}

impl ChannelConfig {
    pub fn threshold_for(&self, id: ChannelId) -> f32 {
        self.threshold.unwrap_or(match id {
            ChannelId::Color => 0.70,
            ChannelId::Hair => 0.75,
        })
    }

    pub fn default_key_for(&self, id: ChannelId) -> &str {
        self.default_key.as_deref().unwrap_or(match id {
            ChannelId::Color => "red",
            ChannelId::Hair => "kinky",
        })
    }

    pub fn keys_for(&self, id: ChannelId) -> Vec<char> {
        let keys = self.keys.as_deref().unwrap_or(match id {
            ChannelId::Color => "12345",
            ChannelId::Hair => "qwert",
        });
        keys.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Theme registry for `id`: the configured table or the built-in one,
    /// with built-in aliases followed by configured ones
    pub fn registry_for(&self, id: ChannelId) -> ThemeRegistry {
        let (builtin_themes, builtin_aliases) = match id {
            ChannelId::Color => (builtin::color_themes(), Vec::new()),
            ChannelId::Hair => (builtin::hair_themes(), builtin::hair_aliases()),
        };
        let themes = self.themes.clone().unwrap_or(builtin_themes);
        let aliases = builtin_aliases
            .into_iter()
            .chain(self.aliases.iter().map(|(label, key)| (label.clone(), key.clone())));
        ThemeRegistry::from_specs(themes, aliases)
    }

    /// Assemble the channel resting on its default theme
    pub fn build(&self, id: ChannelId) -> Channel {
        Channel::new(
            id,
            self.registry_for(id),
            self.threshold_for(id),
            self.default_key_for(id),
            self.keys_for(id),
        )
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Transition progress added per render tick
    pub transition_step: f32,
    /// Classifier polling interval
    pub poll_interval_ms: u64,
    pub particles: ParticleParams,
    pub pose: PoseParams,
    pub logging: LogConfig,
    pub color: ChannelConfig,
    pub hair: ChannelConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 600.0,
            transition_step: 0.05,
            poll_interval_ms: 100,
            particles: ParticleParams::default(),
            pose: PoseParams::default(),
            logging: LogConfig::default(),
            color: ChannelConfig::default(),
            hair: ChannelConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate();
        Ok(config)
    }

    /// Load `path` when given, otherwise the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Clamp every value into its usable range
    pub fn validate(&mut self) {
        let defaults = Self::default();

        if !(self.canvas_width.is_finite() && self.canvas_width >= 1.0) {
            self.canvas_width = defaults.canvas_width;
        }
        if !(self.canvas_height.is_finite() && self.canvas_height >= 1.0) {
            self.canvas_height = defaults.canvas_height;
        }
        self.transition_step = if self.transition_step.is_finite() && self.transition_step > 0.0 {
            self.transition_step.min(1.0)
        } else {
            defaults.transition_step
        };
        self.poll_interval_ms = self.poll_interval_ms.max(1);

        self.particles.pool_size = self.particles.pool_size.max(1);
        self.pose.every_n_ticks = self.pose.every_n_ticks.max(1);
        self.pose.min_score = clamp_unit(self.pose.min_score, defaults.pose.min_score);

        for channel in [&mut self.color, &mut self.hair] {
            if let Some(threshold) = channel.threshold.as_mut() {
                *threshold = clamp_unit(*threshold, 0.0);
            }
        }
    }

    pub fn canvas_size(&self) -> Vec2 {
        Vec2::new(self.canvas_width, self.canvas_height)
    }

    pub fn channel(&self, id: ChannelId) -> &ChannelConfig {
        match id {
            ChannelId::Color => &self.color,
            ChannelId::Hair => &self.hair,
        }
    }
}

/// Clamp to 0.0-1.0, using `fallback` for NaN
fn clamp_unit(value: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}
