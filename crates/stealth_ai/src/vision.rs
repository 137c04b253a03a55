//! Field-of-view and line-of-sight evaluation
//!
//! Visibility is a fraction in `[0, 1]`. A target without landmarks is either
//! fully visible or not at all; a target with landmarks is as visible as the
//! share of its landmarks that pass the cone and sight-ray tests.

use crate::services::{HitTag, RaycastService};
use crate::target::Target;
use crate::tuning::NEAR_ZERO;
use glam::Vec3;
use stealth_core::angle_between_degrees;

/// What an agent sees from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    /// Eye position
    pub eye: Vec3,
    /// Facing direction
    pub forward: Vec3,
    /// Full field of view angle in degrees
    pub fov: f32,
    /// Furthest visible distance
    pub vision_distance: f32,
}

impl Observer {
    /// Check if `point` lies inside the view cone (ignores distance and occlusion)
    pub fn in_cone(&self, point: Vec3) -> bool {
        angle_between_degrees(self.forward, point - self.eye) <= self.fov * 0.5
    }
}

/// Computes visibility fractions against a raycast service
pub struct VisibilityEvaluator<'a, R: RaycastService + ?Sized> {
    rays: &'a R,
}

impl<'a, R: RaycastService + ?Sized> VisibilityEvaluator<'a, R> {
    /// Create an evaluator over `rays`
    pub fn new(rays: &'a R) -> Self {
        Self { rays }
    }

    /// Visibility of `target` from `observer`
    pub fn visibility(&self, observer: &Observer, target: &Target) -> f32 {
        if observer.eye.distance(target.position) > observer.vision_distance {
            return 0.0;
        }

        let landmarks = target
            .profile
            .as_ref()
            .map(|profile| profile.landmarks.as_slice())
            .unwrap_or_default();

        if landmarks.is_empty() {
            let reach = observer.eye.distance(target.position);
            return if self.sees(observer, target.position, reach) {
                1.0
            } else {
                0.0
            };
        }

        let visible = landmarks
            .iter()
            .filter(|&&landmark| {
                let reach = observer.eye.distance(landmark);
                self.sees(observer, landmark, reach)
            })
            .count();
        visible as f32 / landmarks.len() as f32
    }

    /// Cone test followed by a sight ray toward `point`
    fn sees(&self, observer: &Observer, point: Vec3, reach: f32) -> bool {
        if !observer.in_cone(point) {
            return false;
        }
        let offset = point - observer.eye;
        if offset.length() < NEAR_ZERO {
            return true;
        }
        self.line_of_sight(observer.eye, offset.normalize(), reach)
    }

    /// Walk hits nearest first: the target ends the walk, glass is skipped,
    /// anything else blocks. No hits at all counts as clear.
    fn line_of_sight(&self, origin: Vec3, direction: Vec3, reach: f32) -> bool {
        for hit in self.rays.raycast_all(origin, direction, reach) {
            match hit.tag {
                HitTag::Target => return true,
                tag if tag.is_see_through() => continue,
                _ => return false,
            }
        }
        true
    }
}
