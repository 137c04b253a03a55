//! Host services the simulation consumes
//!
//! The core never casts rays or plans paths itself. A host (game engine,
//! test harness, the reference simulator) implements these traits.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use stealth_core::AgentId;

/// Classification of a surface hit by a ray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitTag {
    /// The perception target (or the source of a sound)
    Target,
    /// Ordinary opaque geometry
    Solid,
    /// See-through geometry that still counts as an obstacle for sound (glass)
    SightTransparent,
    /// Geometry that stops sound entirely and blocks sight
    SoundBlocking,
    /// Geometry that stops sound entirely but can be seen through
    SoundBlockingTransparent,
}

impl HitTag {
    /// Whether sight passes through this surface
    pub fn is_see_through(self) -> bool {
        matches!(self, Self::SightTransparent | Self::SoundBlockingTransparent)
    }

    /// Whether this surface vetoes sound propagation
    pub fn blocks_sound(self) -> bool {
        matches!(self, Self::SoundBlocking | Self::SoundBlockingTransparent)
    }
}

/// One hit along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Surface classification
    pub tag: HitTag,
    /// Hit point in world space
    pub point: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}

impl RaycastHit {
    /// Create a hit
    pub fn new(tag: HitTag, point: Vec3, distance: f32) -> Self {
        Self {
            tag,
            point,
            distance,
        }
    }
}

/// Ray intersection queries against the world
pub trait RaycastService {
    /// All hits along `direction` from `origin` up to `max_distance`, nearest first
    fn raycast_all(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Vec<RaycastHit>;
}

/// Movement and path queries for agents
pub trait Navigator {
    /// Order `agent` to walk toward `destination`
    fn set_destination(&mut self, agent: AgentId, destination: Vec3);

    /// Set the movement speed for `agent`
    fn set_speed(&mut self, agent: AgentId, speed: f32);

    /// Corner points of the shortest walkable path, excluding both endpoints
    ///
    /// An empty list means a straight walk (or no path information).
    fn shortest_path(&self, agent: AgentId, from: Vec3, to: Vec3) -> Vec<Vec3>;
}

/// Length of the polyline `from -> corners -> to`
pub fn polyline_length(from: Vec3, corners: &[Vec3], to: Vec3) -> f32 {
    let mut length = 0.0;
    let mut previous = from;
    for &corner in corners.iter().chain(std::iter::once(&to)) {
        length += previous.distance(corner);
        previous = corner;
    }
    length
}
