//! Stealth Sim - Headless Host for the Stealth AI
//!
//! Provides everything a game engine would normally supply to the guards:
//! - **Occluders**: tagged boxes and spheres answering ray queries
//! - **Navigation**: a grid nav mesh searched with A*
//! - **Scenarios**: TOML level descriptions
//! - **Simulation**: a fixed-step driver with a scripted player

pub mod error;
pub mod navmesh;
pub mod occluder;
pub mod scenario;
pub mod simulation;

pub use error::{SimError, SimResult};
pub use navmesh::{NavAgent, NavGrid, NavPath, NavWorld};
pub use occluder::{Occluder, OccluderWorld, Shape};
pub use scenario::{load_scenario, parse_scenario, Scenario, SimulationSettings};
pub use simulation::{AgentSummary, SimSummary, Simulation};
