//! Stealth AI - Perception and Behavior for Stealth NPCs
//!
//! This crate simulates guards that patrol, grow suspicious, search and chase.
//!
//! # Features
//!
//! - Patrol routes with Loop and PingPong traversal
//! - Vision cone plus line-of-sight visibility, with partial visibility from landmarks
//! - Detection level integration with distance falloff and disguises
//! - Patrol/Search/Chase behavior states
//! - Sound, footstep and ally-alert propagation through a central registry
//!
//! Ray casting and navigation are supplied by the host through
//! [`RaycastService`](services::RaycastService) and
//! [`Navigator`](services::Navigator).
//!
//! # Example
//!
//! ```ignore
//! use stealth_ai::prelude::*;
//!
//! let mut registry = AlertRegistry::new();
//! let guard = registry.register(Agent::new(AgentConfig::default(), Vec3::ZERO))?;
//! registry.tick(&player, &world, &mut navmesh, 1.0 / 60.0);
//! registry.propagate_sound(Vec3::new(3.0, 0.0, 0.0), 1.0, false, &world, &mut navmesh);
//! ```

pub mod agent;
pub mod config;
pub mod detection;
pub mod disguise;
pub mod error;
pub mod events;
pub mod meter;
pub mod registry;
pub mod route;
pub mod services;
pub mod state;
pub mod target;
pub mod tuning;
pub mod vision;

pub use error::{Result, StealthError};

pub mod prelude {
    pub use crate::agent::Agent;
    pub use crate::config::{AgentConfig, StateProfile};
    pub use crate::detection::{DetectionInput, DetectionIntegrator, QuickFill};
    pub use crate::disguise::{Disguise, DisguiseTable};
    pub use crate::error::{Result, StealthError};
    pub use crate::events::StealthEvent;
    pub use crate::meter::{DetectionMeter, MeterTier};
    pub use crate::registry::{AlertRegistry, RegistryConfig, SharedRegistry};
    pub use crate::route::{PathRoute, RouteCursor, RouteMode, Waypoint};
    pub use crate::services::{HitTag, Navigator, RaycastHit, RaycastService};
    pub use crate::state::{BehaviorState, StealthState, Transition};
    pub use crate::target::{Target, TargetProfile};
    pub use crate::vision::{Observer, VisibilityEvaluator};
    pub use glam::Vec3;
    pub use stealth_core::AgentId;
}
