//! Scenario parser - TOML to Scenario conversion
//!
//! A scenario describes one level: the occluders, the navigation grid, patrol
//! routes, accepted disguises, the player and the guards.
//!
//! # Scenario Format
//!
//! ```toml
//! [simulation]
//! duration = 30.0
//! step = 0.05
//!
//! [registry]
//! record_events = true
//!
//! [navmesh]
//! origin = [0.0, 0.0, 0.0]
//! width = 40.0
//! depth = 40.0
//! cell_size = 0.5
//!
//! [[occluders]]
//! shape = "box"
//! min = [10.0, 0.0, 0.0]
//! max = [11.0, 3.0, 20.0]
//! tag = "solid"
//! blocks_movement = true
//!
//! [[disguises]]
//! name = "janitor"
//! modifier = 0.4
//!
//! [[routes]]
//! name = "courtyard"
//! mode = "pingpong"
//! waypoints = [
//!     { position = [5.0, 0.0, 5.0], facing = 90.0, dwell = 2.0 },
//!     { position = [5.0, 0.0, 25.0] },
//! ]
//!
//! [target]
//! position = [30.0, 0.0, 5.0]
//! speed = 2.5
//! radius = 0.4
//! landmarks = [[0.0, 1.6, 0.0], [0.0, 0.4, 0.0]]
//! disguise = "janitor"
//! footstep_interval = 0.5
//! path = [[30.0, 0.0, 30.0]]
//!
//! [[agents]]
//! name = "north-guard"
//! position = [5.0, 0.0, 5.0]
//! yaw = 0.0
//! route = "courtyard"
//!
//! [agents.config]
//! vision_distance = 20.0
//!
//! [[sounds]]
//! at = 4.0
//! position = [12.0, 0.0, 12.0]
//! volume = 1.0
//! penetrates_walls = false
//! ```

use crate::error::{SimError, SimResult};
use crate::navmesh::NavGrid;
use crate::occluder::{Occluder, OccluderWorld};
use glam::Vec3;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use stealth_ai::prelude::{
    AgentConfig, Disguise, DisguiseTable, HitTag, PathRoute, RegistryConfig, RouteMode, Waypoint,
};

/// Raw TOML structure for the simulation section
#[derive(Debug, Deserialize)]
struct SimulationToml {
    duration: Option<f32>,
    step: Option<f32>,
}

/// Raw TOML structure for the navmesh section
#[derive(Debug, Deserialize)]
struct NavmeshToml {
    #[serde(default)]
    origin: Option<Vec3>,
    width: f32,
    depth: f32,
    cell_size: Option<f32>,
}

/// Raw TOML structure for an occluder
#[derive(Debug, Deserialize)]
struct OccluderToml {
    shape: String,
    min: Option<Vec3>,
    max: Option<Vec3>,
    center: Option<Vec3>,
    radius: Option<f32>,
    #[serde(default = "default_tag")]
    tag: HitTag,
    #[serde(default)]
    blocks_movement: bool,
}

fn default_tag() -> HitTag {
    HitTag::Solid
}

/// Raw TOML structure for a route
#[derive(Debug, Deserialize)]
struct RouteToml {
    name: String,
    #[serde(default)]
    mode: RouteMode,
    #[serde(default)]
    waypoints: Vec<Waypoint>,
}

/// Raw TOML structure for the target section
#[derive(Debug, Deserialize)]
struct TargetToml {
    position: Vec3,
    speed: Option<f32>,
    radius: Option<f32>,
    #[serde(default)]
    landmarks: Vec<Vec3>,
    disguise: Option<String>,
    footstep_interval: Option<f32>,
    #[serde(default)]
    path: Vec<Vec3>,
}

/// Raw TOML structure for an agent
#[derive(Debug, Deserialize)]
struct AgentToml {
    name: Option<String>,
    position: Vec3,
    #[serde(default)]
    yaw: f32,
    route: Option<String>,
    #[serde(default)]
    config: AgentConfig,
}

/// Raw TOML structure for a scheduled sound
#[derive(Debug, Deserialize)]
struct SoundToml {
    at: f32,
    position: Vec3,
    #[serde(default = "default_volume")]
    volume: f32,
    #[serde(default)]
    penetrates_walls: bool,
}

fn default_volume() -> f32 {
    1.0
}

/// Root TOML structure
#[derive(Debug, Deserialize)]
struct ScenarioToml {
    simulation: Option<SimulationToml>,
    registry: Option<RegistryConfig>,
    navmesh: NavmeshToml,
    #[serde(default)]
    occluders: Vec<OccluderToml>,
    #[serde(default)]
    disguises: Vec<Disguise>,
    #[serde(default)]
    routes: Vec<RouteToml>,
    target: Option<TargetToml>,
    #[serde(default)]
    agents: Vec<AgentToml>,
    #[serde(default)]
    sounds: Vec<SoundToml>,
}

/// Fixed-step timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    /// Seconds to simulate
    pub duration: f32,
    /// Seconds per step
    pub step: f32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            duration: 30.0,
            step: 1.0 / 30.0,
        }
    }
}

/// The player the guards try to perceive
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSpec {
    /// Start position
    pub position: Vec3,
    /// Walking speed
    pub speed: f32,
    /// Collider radius
    pub radius: f32,
    /// Landmark offsets from the player's position
    pub landmarks: Vec<Vec3>,
    /// Disguise worn at start
    pub disguise: Option<String>,
    /// Seconds between footsteps while walking (0 disables)
    pub footstep_interval: f32,
    /// Points walked through in order
    pub path: Vec<Vec3>,
}

/// A guard to place
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    /// Display name
    pub name: String,
    /// Start position
    pub position: Vec3,
    /// Start yaw in degrees
    pub yaw: f32,
    /// Patrol route
    pub route: Option<Arc<PathRoute>>,
    /// Tunables
    pub config: AgentConfig,
}

/// A sound fired at a fixed time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledSound {
    /// Seconds from start
    pub at: f32,
    /// Source position
    pub position: Vec3,
    /// Loudness
    pub volume: f32,
    /// Whether the sound passes through one wall
    pub penetrates_walls: bool,
}

/// A parsed, validated scenario
#[derive(Debug, Clone)]
pub struct Scenario {
    pub simulation: SimulationSettings,
    pub registry: RegistryConfig,
    pub world: OccluderWorld,
    pub grid: NavGrid,
    pub disguises: DisguiseTable,
    pub routes: HashMap<String, Arc<PathRoute>>,
    pub player: PlayerSpec,
    pub agents: Vec<AgentSpec>,
    pub sounds: Vec<ScheduledSound>,
}

fn parse_occluder(raw: &OccluderToml) -> SimResult<Occluder> {
    let occluder = match raw.shape.to_lowercase().as_str() {
        "box" => match (raw.min, raw.max) {
            (Some(min), Some(max)) => Occluder::cuboid(min, max, raw.tag),
            _ => return Err(SimError::InvalidShape("box needs min and max".to_string())),
        },
        "sphere" => match (raw.center, raw.radius) {
            (Some(center), Some(radius)) => Occluder::sphere(center, radius, raw.tag),
            _ => {
                return Err(SimError::InvalidShape(
                    "sphere needs center and radius".to_string(),
                ))
            }
        },
        other => return Err(SimError::InvalidShape(other.to_string())),
    };
    Ok(if raw.blocks_movement {
        occluder.blocking()
    } else {
        occluder
    })
}

/// Parse a scenario from TOML string
pub fn parse_scenario(content: &str) -> SimResult<Scenario> {
    let raw: ScenarioToml = toml::from_str(content)?;

    let has_agents = !raw.agents.is_empty();
    let target = match raw.target {
        Some(target) => target,
        None if has_agents => return Err(SimError::MissingTarget),
        None => TargetToml {
            position: Vec3::ZERO,
            speed: None,
            radius: None,
            landmarks: Vec::new(),
            disguise: None,
            footstep_interval: None,
            path: Vec::new(),
        },
    };
    let registry = match raw.registry {
        Some(registry) => registry,
        None if has_agents => return Err(SimError::MissingRegistry),
        None => RegistryConfig::default(),
    };

    let defaults = SimulationSettings::default();
    let simulation = raw.simulation.map_or(defaults, |sim| SimulationSettings {
        duration: sim.duration.unwrap_or(defaults.duration).max(0.0),
        step: sim.step.filter(|step| *step > 0.0).unwrap_or(defaults.step),
    });

    let mut world = OccluderWorld::new();
    let mut grid = NavGrid::new(
        raw.navmesh.origin.unwrap_or(Vec3::ZERO),
        raw.navmesh.width,
        raw.navmesh.depth,
        raw.navmesh.cell_size.unwrap_or(0.5),
    );
    for raw_occluder in &raw.occluders {
        let occluder = parse_occluder(raw_occluder)?;
        if occluder.blocks_movement {
            grid.carve(&occluder.shape);
        }
        world.add(occluder);
    }

    let mut disguises = DisguiseTable::new();
    for disguise in raw.disguises {
        disguises.insert(Disguise::new(disguise.name, disguise.modifier));
    }

    let routes: HashMap<String, Arc<PathRoute>> = raw
        .routes
        .into_iter()
        .map(|route| {
            (
                route.name,
                Arc::new(PathRoute::from_waypoints(route.mode, route.waypoints)),
            )
        })
        .collect();

    let mut agents = Vec::with_capacity(raw.agents.len());
    for (index, agent) in raw.agents.into_iter().enumerate() {
        agent.config.validate()?;
        let route = match agent.route {
            Some(name) => Some(
                routes
                    .get(&name)
                    .cloned()
                    .ok_or(SimError::UnknownRoute(name))?,
            ),
            None => None,
        };
        agents.push(AgentSpec {
            name: agent.name.unwrap_or_else(|| format!("guard-{}", index)),
            position: agent.position,
            yaw: agent.yaw,
            route,
            config: agent.config,
        });
    }

    let mut sounds: Vec<ScheduledSound> = raw
        .sounds
        .into_iter()
        .map(|sound| ScheduledSound {
            at: sound.at,
            position: sound.position,
            volume: sound.volume,
            penetrates_walls: sound.penetrates_walls,
        })
        .collect();
    sounds.sort_by(|a, b| a.at.total_cmp(&b.at));

    let player = PlayerSpec {
        position: target.position,
        speed: target.speed.unwrap_or(2.0).max(0.0),
        radius: target.radius.unwrap_or(0.4).max(0.0),
        landmarks: target.landmarks,
        disguise: target.disguise,
        footstep_interval: target.footstep_interval.unwrap_or(0.0).max(0.0),
        path: target.path,
    };

    Ok(Scenario {
        simulation,
        registry,
        world,
        grid,
        disguises,
        routes,
        player,
        agents,
        sounds,
    })
}

/// Load a scenario from file
pub fn load_scenario(path: impl AsRef<Path>) -> SimResult<Scenario> {
    let content = std::fs::read_to_string(path)?;
    parse_scenario(&content)
}
