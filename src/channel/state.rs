//! Per-channel transition state

/// Accumulated progress within this distance of a whole number of steps
/// counts as exactly that many steps.
const PROGRESS_EPSILON: f32 = 1e-4;

/// Slack when asking whether a whole number of steps reaches 1.0
const COMMIT_EPSILON: f64 = 1e-6;

/// Whether a channel is settled or moving toward a new target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `progress == 1.0`, current and target agree
    Stable,
    /// `progress < 1.0`
    Transitioning,
}

/// Current/target theme keys and the progress between them.
///
/// Invariant: `progress == 1.0` implies `current == target`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    current: String,
    target: String,
    progress: f32,
}

impl ChannelState {
    /// A stable state resting on `default_key`
    pub fn new(default_key: impl Into<String>) -> Self {
        let key = default_key.into();
        Self {
            current: key.clone(),
            target: key,
            progress: 1.0,
        }
    }

    /// Last fully committed theme key
    pub fn current_key(&self) -> &str {
        &self.current
    }

    /// Theme key being transitioned toward
    pub fn target_key(&self) -> &str {
        &self.target
    }

    /// Transition completion in 0.0-1.0
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn phase(&self) -> Phase {
        if self.progress >= 1.0 {
            Phase::Stable
        } else {
            Phase::Transitioning
        }
    }

    pub fn is_stable(&self) -> bool {
        self.phase() == Phase::Stable
    }

    /// Start a transition toward `key` from the current committed theme
    pub fn set_target(&mut self, key: impl Into<String>) {
        self.target = key.into();
        self.progress = 0.0;
    }

    /// Advance one tick.
    ///
    /// Returns `true` when this tick completed the transition and committed
    /// the target as the current theme. Progress is `min(1, progress + step)`,
    /// except that a run of `n` steps where `n * step` reaches 1.0 commits on
    /// tick `n` even if float accumulation leaves it a hair short.
    /// Non-positive or non-finite steps complete the transition immediately.
    pub fn advance(&mut self, step: f32) -> bool {
        if self.progress >= 1.0 {
            return false;
        }
        let step = if step.is_finite() && step > 0.0 { step } else { 1.0 };
        let next = self.progress + step;
        if next >= 1.0 || whole_steps_reach_one(next, step) {
            self.progress = 1.0;
            self.current = self.target.clone();
            true
        } else {
            self.progress = next;
            false
        }
    }
}

/// Whether `progress` is a whole number of `step`s that together make 1.0
fn whole_steps_reach_one(progress: f32, step: f32) -> bool {
    let ticks = (progress / step).round();
    let on_a_step = (progress - ticks * step).abs() <= PROGRESS_EPSILON;
    on_a_step && f64::from(ticks) * f64::from(step) >= 1.0 - COMMIT_EPSILON
}
