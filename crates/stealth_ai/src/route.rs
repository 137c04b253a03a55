//! Patrol routes and traversal

use crate::error::{Result, StealthError};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use stealth_core::heading_from_yaw;

/// A point along a patrol route
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// World position
    pub position: Vec3,
    /// Yaw (degrees) the agent turns to while dwelling here
    #[serde(default)]
    pub facing: f32,
    /// Seconds to dwell before moving on
    #[serde(default)]
    pub dwell: f32,
}

impl Waypoint {
    /// Create a waypoint with no facing and no dwell
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            facing: 0.0,
            dwell: 0.0,
        }
    }

    /// Set facing yaw in degrees
    pub fn with_facing(mut self, facing: f32) -> Self {
        self.facing = facing;
        self
    }

    /// Set dwell time (negative values clamp to zero)
    pub fn with_dwell(mut self, seconds: f32) -> Self {
        self.dwell = seconds.max(0.0);
        self
    }

    /// Unit heading for this waypoint's facing
    pub fn facing_direction(&self) -> Vec3 {
        heading_from_yaw(self.facing)
    }
}

/// How a route continues past its last waypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Wrap from the last waypoint back to the first
    #[default]
    Loop,
    /// Walk back and forth, reversing at both ends
    PingPong,
}

/// An ordered list of waypoints shared by the agents walking it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathRoute {
    /// Traversal mode
    #[serde(default)]
    pub mode: RouteMode,
    waypoints: Vec<Waypoint>,
}

impl PathRoute {
    /// Create an empty route
    pub fn new(mode: RouteMode) -> Self {
        Self {
            mode,
            waypoints: Vec::new(),
        }
    }

    /// Create a route from waypoints
    pub fn from_waypoints(mode: RouteMode, waypoints: Vec<Waypoint>) -> Self {
        Self { mode, waypoints }
    }

    /// Add a waypoint (builder style)
    pub fn with_waypoint(mut self, waypoint: Waypoint) -> Self {
        self.waypoints.push(waypoint);
        self
    }

    /// Append a waypoint to the end
    pub fn push(&mut self, waypoint: Waypoint) -> usize {
        self.waypoints.push(waypoint);
        self.waypoints.len() - 1
    }

    /// Insert a waypoint right after `index`
    ///
    /// An index past the end appends instead. Returns where the waypoint landed.
    pub fn insert_after(&mut self, index: usize, waypoint: Waypoint) -> usize {
        if index < self.waypoints.len() {
            self.waypoints.insert(index + 1, waypoint);
            index + 1
        } else {
            self.push(waypoint)
        }
    }

    /// Remove the waypoint at `index`
    pub fn remove(&mut self, index: usize) -> Result<Waypoint> {
        if index >= self.waypoints.len() {
            return Err(StealthError::InvalidRoute(format!(
                "waypoint index {} out of range for route of {}",
                index,
                self.waypoints.len()
            )));
        }
        Ok(self.waypoints.remove(index))
    }

    /// Get a waypoint
    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// All waypoints in order
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Number of waypoints
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Check if the route has no waypoints
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Per-agent position along a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCursor {
    index: usize,
    direction: isize,
}

impl Default for RouteCursor {
    fn default() -> Self {
        Self {
            index: 0,
            direction: 1,
        }
    }
}

impl RouteCursor {
    /// Current waypoint index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current traversal direction (+1 or -1)
    pub fn direction(&self) -> isize {
        self.direction
    }

    /// Step to the next index for a route of `len` waypoints
    ///
    /// Loop wraps to zero; PingPong reverses exactly when it lands on the
    /// first or the last index. Does nothing for an empty route.
    pub fn advance(&mut self, len: usize, mode: RouteMode) {
        if len == 0 {
            self.index = 0;
            return;
        }

        if mode == RouteMode::Loop {
            self.direction = 1;
        }

        let len = len as isize;
        let current = (self.index as isize).min(len - 1);
        self.index = (current + self.direction).rem_euclid(len) as usize;

        if mode == RouteMode::PingPong && (self.index == 0 || self.index as isize == len - 1) {
            self.direction = -self.direction;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(mode: RouteMode, n: usize) -> PathRoute {
        (0..n).fold(PathRoute::new(mode), |route, i| {
            route.with_waypoint(Waypoint::new(Vec3::new(i as f32, 0.0, 0.0)))
        })
    }

    fn visit(route: &PathRoute, steps: usize) -> Vec<usize> {
        let mut cursor = RouteCursor::default();
        let mut order = vec![cursor.index()];
        for _ in 0..steps {
            cursor.advance(route.len(), route.mode);
            order.push(cursor.index());
        }
        order
    }

    #[test]
    fn test_loop_wraps() {
        let route = route(RouteMode::Loop, 3);
        assert_eq!(visit(&route, 6), vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_ping_pong_bounces() {
        let route = route(RouteMode::PingPong, 4);
        assert_eq!(visit(&route, 8), vec![0, 1, 2, 3, 2, 1, 0, 1, 2]);
    }

    #[test]
    fn test_ping_pong_two_points() {
        let route = route(RouteMode::PingPong, 2);
        assert_eq!(visit(&route, 4), vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_single_point_routes_stay_put() {
        assert_eq!(visit(&route(RouteMode::Loop, 1), 3), vec![0, 0, 0, 0]);
        assert_eq!(visit(&route(RouteMode::PingPong, 1), 3), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_route_cursor() {
        let mut cursor = RouteCursor::default();
        cursor.advance(0, RouteMode::Loop);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_cursor_survives_route_shrinking() {
        let mut cursor = RouteCursor::default();
        for _ in 0..4 {
            cursor.advance(5, RouteMode::Loop);
        }
        assert_eq!(cursor.index(), 4);
        cursor.advance(2, RouteMode::Loop);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_route_editing() {
        let mut route = route(RouteMode::Loop, 2);
        let at = route.insert_after(0, Waypoint::new(Vec3::new(0.5, 0.0, 0.0)));
        assert_eq!(at, 1);
        assert_eq!(route.get(1).unwrap().position.x, 0.5);

        let appended = route.insert_after(99, Waypoint::new(Vec3::splat(9.0)));
        assert_eq!(appended, 3);

        let removed = route.remove(0).unwrap();
        assert_eq!(removed.position, Vec3::ZERO);
        assert_eq!(route.len(), 3);
        assert!(matches!(route.remove(10), Err(StealthError::InvalidRoute(_))));
    }

    #[test]
    fn test_waypoint_dwell_clamped() {
        let waypoint = Waypoint::new(Vec3::ZERO).with_dwell(-2.0).with_facing(90.0);
        assert_eq!(waypoint.dwell, 0.0);
        assert!((waypoint.facing_direction() - Vec3::X).length() < 1e-5);
    }
}
