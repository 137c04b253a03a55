//! Test doubles for the host services

#![allow(dead_code)]

use stealth_ai::prelude::*;
use std::collections::HashMap;

/// Returns the same hits for every ray, clipped to the ray length
#[derive(Default)]
pub struct ScriptedRays {
    pub hits: Vec<RaycastHit>,
}

impl ScriptedRays {
    pub fn new(hits: Vec<RaycastHit>) -> Self {
        Self { hits }
    }

    pub fn open() -> Self {
        Self::default()
    }
}

impl RaycastService for ScriptedRays {
    fn raycast_all(&self, _origin: Vec3, _direction: Vec3, max: f32) -> Vec<RaycastHit> {
        let mut hits: Vec<_> = self.hits.iter().copied().filter(|h| h.distance <= max).collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// Records orders and answers path queries with fixed corners
#[derive(Default)]
pub struct RecordingNav {
    pub destinations: HashMap<AgentId, Vec3>,
    pub speeds: HashMap<AgentId, f32>,
    pub corners: Vec<Vec3>,
}

impl RecordingNav {
    pub fn with_corners(corners: Vec<Vec3>) -> Self {
        Self {
            corners,
            ..Self::default()
        }
    }
}

impl Navigator for RecordingNav {
    fn set_destination(&mut self, agent: AgentId, destination: Vec3) {
        self.destinations.insert(agent, destination);
    }

    fn set_speed(&mut self, agent: AgentId, speed: f32) {
        self.speeds.insert(agent, speed);
    }

    fn shortest_path(&self, _agent: AgentId, _from: Vec3, _to: Vec3) -> Vec<Vec3> {
        self.corners.clone()
    }
}

pub fn hit(tag: HitTag, distance: f32) -> RaycastHit {
    RaycastHit::new(tag, Vec3::new(distance, 0.0, 0.0), distance)
}

pub fn guard(x: f32, z: f32) -> Agent {
    Agent::new(AgentConfig::default(), Vec3::new(x, 0.0, z))
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
