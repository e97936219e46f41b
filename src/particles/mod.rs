//! Particle pool
//!
//! Each channel owns a fixed-size pool of drifting particles. A particle's
//! look is never stored on it: the renderer reads the channel's blended theme
//! every frame, so a whole pool changes in lockstep during a transition.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Motion and spawn parameters shared by every pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleParams {
    /// Particles per channel
    pub pool_size: usize,
    /// Multiplicative velocity damping per tick
    pub damping: f32,
    /// Max random velocity nudge per axis per tick
    pub jitter: f32,
    /// Fraction of velocity kept (and inverted) when leaving the canvas
    pub bounce: f32,
    /// Life at spawn; alpha is `life / initial_life`
    pub initial_life: f32,
    /// Spawn velocity range per axis is `-spawn_speed..spawn_speed`
    pub spawn_speed: f32,
    pub size_range: [f32; 2],
    pub decay_range: [f32; 2],
    /// Angular velocity range is `-max_spin..max_spin`
    pub max_spin: f32,
    pub follow_range: [f32; 2],
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            pool_size: 60,
            damping: 0.97,
            jitter: 0.05,
            bounce: 0.5,
            initial_life: 255.0,
            spawn_speed: 2.0,
            size_range: [10.0, 25.0],
            decay_range: [0.3, 1.0],
            max_spin: 0.05,
            follow_range: [0.005, 0.02],
        }
    }
}

/// Uniform sample in `lo..hi`, or `lo` for an empty range
fn sample(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        lo
    }
}

/// A single animated particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    /// Remaining life; the particle is replaced at or below zero
    pub life: f32,
    /// Life lost per tick
    pub decay: f32,
    pub rotation: f32,
    pub angular_velocity: f32,
    /// Fraction of the offset to the target added to velocity per tick
    pub follow_strength: f32,
    /// Attraction point, if any
    pub target: Option<Vec2>,
}

impl Particle {
    /// Fresh particle at the center of `bounds`
    pub fn spawn(rng: &mut impl Rng, bounds: Vec2, params: &ParticleParams) -> Self {
        let speed = params.spawn_speed.abs();
        Self {
            position: bounds * 0.5,
            velocity: Vec2::new(sample(rng, -speed, speed), sample(rng, -speed, speed)),
            size: sample(rng, params.size_range[0], params.size_range[1]),
            life: params.initial_life,
            decay: sample(rng, params.decay_range[0], params.decay_range[1]),
            rotation: sample(rng, 0.0, std::f32::consts::TAU),
            angular_velocity: sample(rng, -params.max_spin.abs(), params.max_spin.abs()),
            follow_strength: sample(rng, params.follow_range[0], params.follow_range[1]),
            target: None,
        }
    }

    /// Advance one tick inside a canvas of `bounds`
    pub fn update(&mut self, rng: &mut impl Rng, bounds: Vec2, params: &ParticleParams) {
        if let Some(target) = self.target {
            self.velocity += (target - self.position) * self.follow_strength;
        }
        self.position += self.velocity;
        self.velocity *= params.damping;
        self.life -= self.decay;
        self.rotation += self.angular_velocity;

        let jitter = params.jitter.abs();
        self.velocity += Vec2::new(sample(rng, -jitter, jitter), sample(rng, -jitter, jitter));

        if self.position.x < 0.0 || self.position.x > bounds.x {
            self.velocity.x *= -params.bounce;
        }
        if self.position.y < 0.0 || self.position.y > bounds.y {
            self.velocity.y *= -params.bounce;
        }
    }

    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    /// Opacity in 0.0-1.0 derived from remaining life
    pub fn alpha(&self, initial_life: f32) -> f32 {
        if initial_life <= 0.0 {
            return 0.0;
        }
        (self.life / initial_life).clamp(0.0, 1.0)
    }
}

/// Fixed-size pool of particles for one channel
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    bounds: Vec2,
    params: ParticleParams,
    rng: StdRng,
}

impl ParticleSystem {
    /// Pool of `params.pool_size` particles (at least one), randomly seeded
    pub fn new(bounds: Vec2, params: ParticleParams) -> Self {
        Self::with_rng(bounds, params, StdRng::seed_from_u64(rand::random()))
    }

    /// Pool driven by a caller-supplied generator
    pub fn with_rng(bounds: Vec2, params: ParticleParams, mut rng: StdRng) -> Self {
        let size = params.pool_size.max(1);
        let particles = (0..size)
            .map(|_| Particle::spawn(&mut rng, bounds, &params))
            .collect();
        Self {
            particles,
            bounds,
            params,
            rng,
        }
    }

    /// Advance every particle one tick, replacing the dead in place
    pub fn update(&mut self) {
        let bounds = self.bounds;
        for particle in &mut self.particles {
            particle.update(&mut self.rng, bounds, &self.params);
            if particle.is_dead() {
                *particle = Particle::spawn(&mut self.rng, bounds, &self.params);
            }
        }
    }

    /// Point the first `count` particles at `position`
    pub fn attract_leaders(&mut self, position: Vec2, count: usize) {
        for particle in self.particles.iter_mut().take(count) {
            particle.target = Some(position);
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn params(&self) -> &ParticleParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: Vec2 = Vec2::new(800.0, 600.0);

    fn seeded(params: ParticleParams) -> ParticleSystem {
        ParticleSystem::with_rng(CANVAS, params, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_spawn_ranges() {
        let params = ParticleParams::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let p = Particle::spawn(&mut rng, CANVAS, &params);
            assert_eq!(p.position, Vec2::new(400.0, 300.0));
            assert!(p.velocity.x >= -2.0 && p.velocity.x <= 2.0);
            assert!(p.size >= 10.0 && p.size <= 25.0);
            assert!(p.decay >= 0.3 && p.decay <= 1.0);
            assert!(p.follow_strength >= 0.005 && p.follow_strength <= 0.02);
            assert_eq!(p.life, 255.0);
            assert!(p.target.is_none());
        }
    }

    #[test]
    fn test_pool_size_is_invariant() {
        let mut system = seeded(ParticleParams::default());
        assert_eq!(system.len(), 60);
        // Long enough for every particle to die several times
        for _ in 0..3000 {
            system.update();
            assert_eq!(system.len(), 60);
        }
        assert!(system.particles().iter().all(|p| !p.is_dead()));
    }

    #[test]
    fn test_zero_pool_size_keeps_one_particle() {
        let params = ParticleParams {
            pool_size: 0,
            ..ParticleParams::default()
        };
        assert_eq!(seeded(params).len(), 1);
    }

    #[test]
    fn test_motion_without_jitter() {
        let params = ParticleParams {
            jitter: 0.0,
            ..ParticleParams::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = Particle::spawn(&mut rng, CANVAS, &params);
        p.velocity = Vec2::new(1.0, -2.0);
        p.decay = 0.5;
        p.rotation = 0.0;
        p.angular_velocity = 0.01;

        p.update(&mut rng, CANVAS, &params);
        assert_eq!(p.position, Vec2::new(401.0, 298.0));
        assert!((p.velocity - Vec2::new(0.97, -1.94)).length() < 1e-6);
        assert_eq!(p.life, 254.5);
        assert!((p.rotation - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_attraction_pulls_toward_target() {
        let params = ParticleParams {
            jitter: 0.0,
            ..ParticleParams::default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        let mut p = Particle::spawn(&mut rng, CANVAS, &params);
        p.velocity = Vec2::ZERO;
        p.follow_strength = 0.01;
        p.target = Some(Vec2::new(500.0, 300.0));

        p.update(&mut rng, CANVAS, &params);
        assert!((p.position.x - 401.0).abs() < 1e-4);
        assert_eq!(p.position.y, 300.0);
    }

    #[test]
    fn test_bounce_at_canvas_edge() {
        let params = ParticleParams {
            jitter: 0.0,
            damping: 1.0,
            ..ParticleParams::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = Particle::spawn(&mut rng, CANVAS, &params);
        p.position = Vec2::new(799.0, 300.0);
        p.velocity = Vec2::new(4.0, 0.0);

        p.update(&mut rng, CANVAS, &params);
        assert_eq!(p.position.x, 803.0);
        assert_eq!(p.velocity.x, -2.0);
    }

    #[test]
    fn test_attract_leaders() {
        let mut system = seeded(ParticleParams::default());
        let point = Vec2::new(10.0, 20.0);
        system.attract_leaders(point, 3);
        let targets: Vec<Option<Vec2>> = system.particles().iter().map(|p| p.target).collect();
        assert!(targets[..3].iter().all(|t| *t == Some(point)));
        assert!(targets[3..].iter().all(|t| t.is_none()));
    }

    #[test]
    fn test_alpha_from_life() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut p = Particle::spawn(&mut rng, CANVAS, &ParticleParams::default());
        assert_eq!(p.alpha(255.0), 1.0);
        p.life = 127.5;
        assert_eq!(p.alpha(255.0), 0.5);
        p.life = -3.0;
        assert_eq!(p.alpha(255.0), 0.0);
    }
}
