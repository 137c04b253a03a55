//! Behavior states
//!
//! Each state carries its own runtime data and keeps its enter and update
//! handlers side by side. Handlers never switch state themselves; they
//! return a [`Transition`] and the owning agent performs the exit/enter.

use crate::agent::AgentBody;
use crate::events::StealthEvent;
use crate::services::Navigator;
use crate::tuning::{
    CAPTURE_RADIUS, FACING_BLEND_RATE, MIN_REACQUIRE_MODIFIER, MIN_SEARCH_TIME, NEAR_ZERO,
    SEARCH_ARRIVAL_RADIUS, SHOUT_INTERVAL, WAYPOINT_ARRIVAL_RADIUS,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use stealth_core::{angle_between_degrees, blend_heading, rotate_about_up};
use std::fmt;

/// Behavior state kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StealthState {
    /// Walking the assigned route
    #[default]
    Patrol,
    /// Investigating a position
    Search,
    /// Pursuing a visible target
    Chase,
}

impl fmt::Display for StealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patrol => write!(f, "Patrol"),
            Self::Search => write!(f, "Search"),
            Self::Chase => write!(f, "Chase"),
        }
    }
}

/// A requested state change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Go back to the route
    Patrol,
    /// Investigate the given position
    Search(Vec3),
    /// Pursue the target
    Chase,
}

impl Transition {
    /// State this transition leads to
    pub fn state(&self) -> StealthState {
        match self {
            Self::Patrol => StealthState::Patrol,
            Self::Search(_) => StealthState::Search,
            Self::Chase => StealthState::Chase,
        }
    }
}

/// What the agent perceived this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Perception {
    pub target: Vec3,
    pub visibility: f32,
    pub modifier: f32,
}

/// Patrol runtime data
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PatrolState {
    /// Seconds spent dwelling at the current waypoint
    pub waiting: f32,
}

impl PatrolState {
    pub(crate) fn enter(body: &mut AgentBody, nav: &mut dyn Navigator) -> Self {
        let profile = body.config.patrol;
        body.apply_profile(profile, nav);
        Self::default()
    }

    pub(crate) fn update(
        &mut self,
        body: &mut AgentBody,
        nav: &mut dyn Navigator,
        seen: &Perception,
        dt: f32,
    ) -> Option<Transition> {
        if let Some(route) = body.route.clone() {
            if !route.is_empty() {
                let index = body.cursor.index().min(route.len() - 1);
                let waypoint = route.waypoints()[index];
                nav.set_destination(body.id, waypoint.position);

                if body.position.distance(waypoint.position) < WAYPOINT_ARRIVAL_RADIUS {
                    if self.waiting >= waypoint.dwell {
                        body.cursor.advance(route.len(), route.mode);
                        self.waiting = 0.0;
                    } else {
                        self.waiting += dt;
                        body.forward = blend_heading(
                            body.forward,
                            waypoint.facing_direction(),
                            FACING_BLEND_RATE * dt,
                        );
                    }
                }
            }
        }

        let detection = body.detection.level();
        if detection >= 1.0 && seen.visibility > 0.0 {
            return Some(Transition::Chase);
        }

        let disguised = seen.modifier < 1.0;
        let suspicious = if disguised {
            detection >= 1.0
        } else {
            detection > body.config.suspicion_threshold
        };
        if suspicious {
            return Some(Transition::Search(body.search_fallback()));
        }

        None
    }
}

/// Sweep progress once the search position is reached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    /// Heading on arrival
    pub origin: Vec3,
    /// Current rotation direction
    pub clockwise: bool,
}

/// Search runtime data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    /// Position being investigated
    pub destination: Vec3,
    /// Seconds since the search began
    pub elapsed: f32,
    /// Sweep progress, present once the destination was reached
    pub sweep: Option<Sweep>,
}

impl SearchState {
    pub(crate) fn enter(body: &mut AgentBody, nav: &mut dyn Navigator, destination: Vec3) -> Self {
        let profile = body.config.search;
        body.apply_profile(profile, nav);
        nav.set_destination(body.id, destination);
        Self {
            destination,
            elapsed: 0.0,
            sweep: None,
        }
    }

    /// Check if the agent already arrived at the search position
    pub fn reached(&self) -> bool {
        self.sweep.is_some()
    }

    pub(crate) fn update(
        &mut self,
        body: &mut AgentBody,
        seen: &Perception,
        dt: f32,
    ) -> Option<Transition> {
        self.elapsed += dt;

        if seen.visibility > 0.0 && seen.modifier >= MIN_REACQUIRE_MODIFIER {
            return Some(Transition::Chase);
        }

        if body.detection.level() < NEAR_ZERO && self.elapsed > MIN_SEARCH_TIME {
            return Some(Transition::Patrol);
        }

        if body.position.distance(self.destination) < SEARCH_ARRIVAL_RADIUS {
            let forward = body.forward;
            let sweep = self.sweep.get_or_insert(Sweep {
                origin: forward,
                clockwise: false,
            });

            let step = body.config.sweep_speed * dt;
            body.forward = rotate_about_up(forward, if sweep.clockwise { step } else { -step });

            if angle_between_degrees(sweep.origin, body.forward) > body.config.sweep_angle {
                sweep.clockwise = !sweep.clockwise;
            }
        }

        None
    }
}

/// Chase runtime data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaseState {
    /// Seconds until the next ally alert
    pub shout_timer: f32,
    /// Target is within capture radius
    pub caught: bool,
}

impl ChaseState {
    pub(crate) fn enter(body: &mut AgentBody, nav: &mut dyn Navigator) -> Self {
        if body.config.ally_alert_range > 0.0 {
            body.alert_requested = true;
        }
        let profile = body.config.chase;
        body.apply_profile(profile, nav);
        Self {
            shout_timer: SHOUT_INTERVAL,
            caught: false,
        }
    }

    pub(crate) fn update(
        &mut self,
        body: &mut AgentBody,
        nav: &mut dyn Navigator,
        seen: &Perception,
        dt: f32,
    ) -> Option<Transition> {
        self.shout_timer -= dt;
        if self.shout_timer <= 0.0 {
            if body.config.ally_alert_range > 0.0 {
                body.alert_requested = true;
            }
            self.shout_timer = SHOUT_INTERVAL;
        }

        if body.position.distance(seen.target) < CAPTURE_RADIUS {
            body.set_speed(0.0, nav);
            if !self.caught {
                self.caught = true;
                body.events.push(StealthEvent::TargetCaught { agent: body.id });
            }
        } else {
            body.set_speed(body.config.chase.speed, nav);
            if self.caught {
                self.caught = false;
                body.events.push(StealthEvent::TargetReleased { agent: body.id });
            }
        }

        if seen.visibility > 0.0 {
            nav.set_destination(body.id, seen.target);
            None
        } else {
            Some(Transition::Search(body.search_fallback()))
        }
    }
}

/// Current behavior state with its runtime data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Walking the route
    Patrol(PatrolState),
    /// Investigating a position
    Search(SearchState),
    /// Pursuing the target
    Chase(ChaseState),
}

impl Default for BehaviorState {
    fn default() -> Self {
        Self::Patrol(PatrolState::default())
    }
}

impl BehaviorState {
    /// State kind
    pub fn kind(&self) -> StealthState {
        match self {
            Self::Patrol(_) => StealthState::Patrol,
            Self::Search(_) => StealthState::Search,
            Self::Chase(_) => StealthState::Chase,
        }
    }

    /// Patrol data, if patrolling
    pub fn as_patrol(&self) -> Option<&PatrolState> {
        match self {
            Self::Patrol(state) => Some(state),
            _ => None,
        }
    }

    /// Search data, if searching
    pub fn as_search(&self) -> Option<&SearchState> {
        match self {
            Self::Search(state) => Some(state),
            _ => None,
        }
    }

    /// Chase data, if chasing
    pub fn as_chase(&self) -> Option<&ChaseState> {
        match self {
            Self::Chase(state) => Some(state),
            _ => None,
        }
    }
}
