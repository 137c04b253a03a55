//! Detection meter collaborator

use serde::{Deserialize, Serialize};

/// Display that renders an agent's detection level
///
/// The integrator polls [`is_ready`](DetectionMeter::is_ready) every tick and
/// only then hands over the level and the agent's suspicion threshold.
pub trait DetectionMeter: Send {
    /// Whether the display finished its own setup
    fn is_ready(&self) -> bool;

    /// Show `level` in `[0, 1]` against `threshold`
    fn set_fill(&mut self, level: f32, threshold: f32);
}

/// Which face a meter shows for a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeterTier {
    /// Nothing noticed
    Unaware,
    /// Filling, at or below the suspicion threshold
    Suspicious,
    /// Above the suspicion threshold
    Alert,
}

impl MeterTier {
    /// Pick the tier for a level against a threshold
    pub fn from_level(level: f32, threshold: f32) -> Self {
        if level <= 0.0 {
            Self::Unaware
        } else if level > threshold {
            Self::Alert
        } else {
            Self::Suspicious
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        assert_eq!(MeterTier::from_level(0.0, 0.5), MeterTier::Unaware);
        assert_eq!(MeterTier::from_level(0.3, 0.5), MeterTier::Suspicious);
        assert_eq!(MeterTier::from_level(0.5, 0.5), MeterTier::Suspicious);
        assert_eq!(MeterTier::from_level(0.51, 0.5), MeterTier::Alert);
    }
}
