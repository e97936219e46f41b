//! Pose keypoints to particle attraction targets

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{BodyPart, Pose};
use crate::particles::Particle;

/// Body parts in group order: particle `i` follows `TRACKED_PARTS[i % 5]`
pub const TRACKED_PARTS: [BodyPart; 5] = [
    BodyPart::Nose,
    BodyPart::LeftWrist,
    BodyPart::RightWrist,
    BodyPart::LeftElbow,
    BodyPart::RightElbow,
];

/// Pose tracking parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseParams {
    pub enabled: bool,
    /// Detector input resolution the keypoints are expressed in
    pub input_width: f32,
    pub input_height: f32,
    /// Keypoints must score strictly above this to be followed
    pub min_score: f32,
    /// Run an estimate every this many render ticks
    pub every_n_ticks: u64,
}

impl Default for PoseParams {
    fn default() -> Self {
        Self {
            enabled: true,
            input_width: 200.0,
            input_height: 200.0,
            min_score: 0.3,
            every_n_ticks: 12,
        }
    }
}

/// Maps detector keypoints into canvas space and onto particle groups
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseMapper {
    scale: Vec2,
    min_score: f32,
}

impl PoseMapper {
    pub fn new(input_size: Vec2, canvas_size: Vec2, min_score: f32) -> Self {
        let ratio = |canvas: f32, input: f32| if input > 0.0 { canvas / input } else { 1.0 };
        Self {
            scale: Vec2::new(ratio(canvas_size.x, input_size.x), ratio(canvas_size.y, input_size.y)),
            min_score,
        }
    }

    pub fn from_params(params: &PoseParams, canvas_size: Vec2) -> Self {
        Self::new(
            Vec2::new(params.input_width, params.input_height),
            canvas_size,
            params.min_score,
        )
    }

    /// Canvas-space target for each tracked part, `None` if absent or weak
    pub fn targets(&self, pose: &Pose) -> [Option<Vec2>; 5] {
        TRACKED_PARTS.map(|part| {
            pose.keypoint(part)
                .filter(|k| k.is_confident(self.min_score))
                .map(|k| Vec2::new(k.x, k.y) * self.scale)
        })
    }

    /// Retarget particles from `pose`.
    ///
    /// Without a pose, or with an empty one, targets are left untouched.
    /// Otherwise each particle follows its group's keypoint, or drifts freely
    /// when that keypoint is missing or below the confidence floor.
    pub fn assign_targets(&self, particles: &mut [Particle], pose: Option<&Pose>) {
        let Some(pose) = pose.filter(|p| !p.is_empty()) else {
            return;
        };
        let targets = self.targets(pose);
        for (index, particle) in particles.iter_mut().enumerate() {
            particle.target = targets[index % TRACKED_PARTS.len()];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{ParticleParams, ParticleSystem};
    use crate::pose::Keypoint;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CANVAS: Vec2 = Vec2::new(800.0, 600.0);

    fn system() -> ParticleSystem {
        ParticleSystem::with_rng(CANVAS, ParticleParams::default(), StdRng::seed_from_u64(11))
    }

    fn mapper() -> PoseMapper {
        PoseMapper::new(Vec2::new(200.0, 200.0), CANVAS, 0.3)
    }

    #[test]
    fn test_scaling_uses_independent_ratios() {
        let pose = Pose::new(vec![Keypoint::new("nose", 100.0, 50.0, 0.9)]);
        let targets = mapper().targets(&pose);
        assert_eq!(targets[0], Some(Vec2::new(400.0, 150.0)));
    }

    #[test]
    fn test_only_left_wrist_group_gets_targets() {
        let mut system = system();
        let sentinel = Vec2::new(-1.0, -1.0);
        for p in system.particles_mut() {
            p.target = Some(sentinel);
        }

        let pose = Pose::new(vec![
            Keypoint::new("nose", 100.0, 100.0, 0.1),
            Keypoint::new("left_wrist", 50.0, 100.0, 0.8),
            Keypoint::new("right_wrist", 150.0, 100.0, 0.3),
        ]);
        mapper().assign_targets(system.particles_mut(), Some(&pose));

        for (i, p) in system.particles().iter().enumerate() {
            if i % 5 == 1 {
                assert_eq!(p.target, Some(Vec2::new(200.0, 300.0)));
            } else {
                assert_eq!(p.target, None, "particle {} should drift", i);
            }
        }
    }

    #[test]
    fn test_missing_pose_leaves_targets_unchanged() {
        let mut system = system();
        let point = Vec2::new(5.0, 5.0);
        system.attract_leaders(point, 60);

        mapper().assign_targets(system.particles_mut(), None);
        mapper().assign_targets(system.particles_mut(), Some(&Pose::default()));

        assert!(system.particles().iter().all(|p| p.target == Some(point)));
    }

    #[test]
    fn test_zero_input_size_does_not_divide_by_zero() {
        let mapper = PoseMapper::new(Vec2::ZERO, CANVAS, 0.3);
        let pose = Pose::new(vec![Keypoint::new("nose", 3.0, 4.0, 0.9)]);
        assert_eq!(mapper.targets(&pose)[0], Some(Vec2::new(3.0, 4.0)));
    }
}
