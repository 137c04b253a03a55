//! The perception target

use crate::disguise::{Disguise, DisguiseTable};
use crate::error::Result;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Extra perception data a target may carry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetProfile {
    /// Sample points for partial-visibility tests
    #[serde(default)]
    pub landmarks: Vec<Vec3>,
    /// Disguise currently worn
    #[serde(default)]
    pub disguise: Disguise,
}

impl TargetProfile {
    /// Create a profile with no landmarks and no disguise
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a landmark (builder style)
    pub fn with_landmark(mut self, landmark: Vec3) -> Self {
        self.landmarks.push(landmark);
        self
    }

    /// Replace the worn disguise (builder style)
    pub fn with_disguise(mut self, disguise: Disguise) -> Self {
        self.disguise = disguise;
        self
    }

    /// Modifier of the worn disguise
    pub fn modifier(&self) -> f32 {
        self.disguise.modifier
    }
}

/// The entity agents try to perceive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// World position
    pub position: Vec3,
    /// Optional landmarks and disguise
    #[serde(default)]
    pub profile: Option<TargetProfile>,
}

impl Target {
    /// Create a target with no profile
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            profile: None,
        }
    }

    /// Attach a profile (builder style)
    pub fn with_profile(mut self, profile: TargetProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Effective disguise modifier (1.0 without a profile)
    pub fn disguise_modifier(&self) -> f32 {
        self.profile.as_ref().map_or(1.0, TargetProfile::modifier)
    }

    /// Put on a disguise from `table`, creating a profile if there is none
    pub fn apply_disguise(&mut self, table: &DisguiseTable, name: &str) -> Result<()> {
        let profile = self.profile.get_or_insert_with(TargetProfile::default);
        table.apply(&mut profile.disguise, name)
    }

    /// Take off the worn disguise
    pub fn remove_disguise(&mut self, table: &DisguiseTable) {
        if let Some(profile) = self.profile.as_mut() {
            table.remove(&mut profile.disguise);
        }
    }
}
