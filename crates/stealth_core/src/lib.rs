//! # stealth_core - Stealth Toolkit Core
//!
//! Small shared primitives used by every other crate in the workspace:
//! - **Ids**: generational agent identifiers and a thread-safe generator
//! - **Geometry**: yaw/heading helpers on top of `glam::Vec3`
//!
//! World space follows the usual game convention: `+Y` is up, a yaw of zero
//! faces `+Z` and positive yaw turns toward `+X`.

pub mod geometry;
pub mod id;

pub use geometry::*;
pub use id::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::geometry::{
        angle_between_degrees, blend_heading, flatten, heading_from_yaw, rotate_about_up,
    };
    pub use crate::id::{AgentId, IdGenerator};
    pub use glam::Vec3;
}
