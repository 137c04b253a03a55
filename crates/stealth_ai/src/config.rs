//! Per-agent configuration

use crate::error::{Result, StealthError};
use serde::{Deserialize, Serialize};

/// Field of view and movement speed for one behavior state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateProfile {
    /// Full field of view angle in degrees
    pub fov: f32,
    /// Movement speed handed to the navigator
    pub speed: f32,
}

impl StateProfile {
    /// Create a new profile
    pub const fn new(fov: f32, speed: f32) -> Self {
        Self { fov, speed }
    }
}

/// Agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Furthest distance the agent can see
    pub vision_distance: f32,

    /// How fast the agent recognises the target (detection per second)
    pub perception_rate: f32,

    /// Furthest distance the agent can hear
    pub audial_distance: f32,

    /// How far away the agent alerts allies while chasing (0 disables)
    pub ally_alert_range: f32,

    /// How fast the detection level decreases (per second)
    pub decay_rate: f32,

    /// Level at which an undisguised target makes the agent search
    pub suspicion_threshold: f32,

    /// Patrol state field of view and speed
    pub patrol: StateProfile,

    /// Chase state field of view and speed
    pub chase: StateProfile,

    /// Search state field of view and speed
    pub search: StateProfile,

    /// Sweep rotation speed while searching (degrees per second)
    pub sweep_speed: f32,

    /// Sweep bound measured from the heading on arrival (degrees)
    pub sweep_angle: f32,

    /// Height of the eyes/ears above the agent's position
    pub eye_height: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            vision_distance: 50.0,
            perception_rate: 1.0,
            audial_distance: 5.0,
            ally_alert_range: 5.0,
            decay_rate: 1.0,
            suspicion_threshold: 0.5,
            patrol: StateProfile::new(70.0, 2.0),
            chase: StateProfile::new(90.0, 2.0),
            search: StateProfile::new(90.0, 2.0),
            sweep_speed: 30.0,
            sweep_angle: 90.0,
            eye_height: 0.0,
        }
    }
}

impl AgentConfig {
    /// Set vision distance
    pub fn with_vision_distance(mut self, distance: f32) -> Self {
        self.vision_distance = distance;
        self
    }

    /// Set perception rate
    pub fn with_perception_rate(mut self, rate: f32) -> Self {
        self.perception_rate = rate;
        self
    }

    /// Set hearing distance
    pub fn with_audial_distance(mut self, distance: f32) -> Self {
        self.audial_distance = distance;
        self
    }

    /// Set ally alert range
    pub fn with_ally_alert_range(mut self, range: f32) -> Self {
        self.ally_alert_range = range;
        self
    }

    /// Set detection decay rate
    pub fn with_decay_rate(mut self, rate: f32) -> Self {
        self.decay_rate = rate;
        self
    }

    /// Set suspicion threshold
    pub fn with_suspicion_threshold(mut self, threshold: f32) -> Self {
        self.suspicion_threshold = threshold;
        self
    }

    /// Set the same speed for every state
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.patrol.speed = speed;
        self.chase.speed = speed;
        self.search.speed = speed;
        self
    }

    /// Set the eye height
    pub fn with_eye_height(mut self, height: f32) -> Self {
        self.eye_height = height;
        self
    }

    /// Check ranges, returning the first problem found
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("vision_distance", self.vision_distance),
            ("perception_rate", self.perception_rate),
            ("audial_distance", self.audial_distance),
            ("ally_alert_range", self.ally_alert_range),
            ("decay_rate", self.decay_rate),
            ("patrol.speed", self.patrol.speed),
            ("chase.speed", self.chase.speed),
            ("search.speed", self.search.speed),
            ("sweep_speed", self.sweep_speed),
            ("sweep_angle", self.sweep_angle),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(StealthError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.suspicion_threshold) {
            return Err(StealthError::InvalidConfig(format!(
                "suspicion_threshold must be within [0, 1], got {}",
                self.suspicion_threshold
            )));
        }

        for (name, profile) in [
            ("patrol", &self.patrol),
            ("chase", &self.chase),
            ("search", &self.search),
        ] {
            if !(0.0..=360.0).contains(&profile.fov) {
                return Err(StealthError::InvalidConfig(format!(
                    "{}.fov must be within [0, 360], got {}",
                    name, profile.fov
                )));
            }
        }

        Ok(())
    }
}
