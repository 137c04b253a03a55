//! Detection level integration
//!
//! Each agent owns one [`DetectionIntegrator`]. The level rises while the
//! target is visible, decays while it is not, and always stays in `[0, 1]`.

use crate::meter::DetectionMeter;
use crate::tuning::{NEAR_ZERO, QUICK_FILL_RATE};
use serde::{Deserialize, Serialize};

/// Per-tick inputs to the integrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionInput {
    /// Visibility fraction in `[0, 1]`
    pub visibility: f32,
    /// Distance from agent body to target
    pub distance: f32,
    /// Agent vision distance
    pub vision_distance: f32,
    /// Agent perception rate
    pub perception_rate: f32,
    /// Agent decay rate
    pub decay_rate: f32,
    /// Disguise modifier when the target carries a profile
    pub disguise: Option<f32>,
}

/// Ramp that eases the level to full after the target is reacquired
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickFill {
    active: bool,
    elapsed: f32,
}

impl QuickFill {
    /// Check if the ramp is running
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds since the ramp started
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn start(&mut self) {
        self.active = true;
        self.elapsed = 0.0;
    }

    fn cancel(&mut self) {
        self.active = false;
        self.elapsed = 0.0;
    }
}

/// Clamped detection level with its quick-fill ramp
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionIntegrator {
    level: f32,
    quick_fill: QuickFill,
}

impl DetectionIntegrator {
    /// Create an integrator at level 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level in `[0, 1]`
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Overwrite the level (clamped)
    pub fn set_level(&mut self, level: f32) {
        self.level = clamp_level(level);
    }

    /// Quick-fill ramp state
    pub fn quick_fill(&self) -> &QuickFill {
        &self.quick_fill
    }

    /// Falloff factor: 1 at the agent, 0 at or beyond vision distance
    pub fn distance_scale(distance: f32, vision_distance: f32) -> f32 {
        if vision_distance <= 0.0 {
            return 0.0;
        }
        (1.0 - distance / vision_distance).max(0.0)
    }

    /// Advance one tick and return the new level
    pub fn integrate(&mut self, input: &DetectionInput, dt: f32) -> f32 {
        if input.visibility > 0.0 {
            let weight = input.disguise.map_or(1.0, |modifier| modifier / 2.0);
            let scale = Self::distance_scale(input.distance, input.vision_distance);
            self.level += weight * input.visibility * scale * input.perception_rate * dt;
        } else {
            self.level -= input.decay_rate * dt;
        }
        self.level = clamp_level(self.level);
        self.level
    }

    /// Begin easing toward full detection
    pub fn start_quick_fill(&mut self) {
        if self.level < 1.0 {
            self.quick_fill.start();
        }
    }

    /// Stop the ramp where it is
    pub fn cancel_quick_fill(&mut self) {
        self.quick_fill.cancel();
    }

    /// Run one ramp step if active; the ramp ends itself at full detection
    pub fn step_quick_fill(&mut self, perception_rate: f32, modifier: f32, dt: f32) {
        if !self.quick_fill.active {
            return;
        }

        let t = (QUICK_FILL_RATE * perception_rate * modifier * dt).clamp(0.0, 1.0);
        self.level = clamp_level(self.level + (1.0 - self.level) * t);
        if 1.0 - self.level < NEAR_ZERO {
            self.level = 1.0;
        }
        self.quick_fill.elapsed += dt;

        if self.level >= 1.0 {
            self.quick_fill.cancel();
        }
    }

    /// Hand the level to a meter once it reports ready
    pub fn publish(&self, meter: &mut dyn DetectionMeter, threshold: f32) {
        if meter.is_ready() {
            meter.set_fill(self.level, threshold);
        }
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
