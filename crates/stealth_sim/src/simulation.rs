//! Fixed-step simulation driver
//!
//! Owns the registry, the occluder world and the navigation world, walks the
//! player along its scripted path and feeds everything through one step at a
//! time.

use crate::error::{SimError, SimResult};
use crate::navmesh::NavWorld;
use crate::occluder::OccluderWorld;
use crate::scenario::{PlayerSpec, Scenario, ScheduledSound, SimulationSettings};
use glam::Vec3;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use stealth_ai::prelude::*;
use stealth_core::flatten;

/// Body radius of a guard for collision checks
pub const AGENT_RADIUS: f32 = 0.4;

/// Meter that logs whenever the shown tier changes
#[derive(Debug)]
struct TierMeter {
    name: String,
    tier: MeterTier,
}

impl TierMeter {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tier: MeterTier::Unaware,
        }
    }
}

impl DetectionMeter for TierMeter {
    fn is_ready(&self) -> bool {
        true
    }

    fn set_fill(&mut self, level: f32, threshold: f32) {
        let tier = MeterTier::from_level(level, threshold);
        if tier != self.tier {
            log::debug!("{} meter: {:?} -> {:?} ({:.2})", self.name, self.tier, tier, level);
            self.tier = tier;
        }
    }
}

/// The scripted player
#[derive(Debug, Clone)]
struct Player {
    target: Target,
    offsets: Vec<Vec3>,
    speed: f32,
    radius: f32,
    path: Vec<Vec3>,
    next: usize,
    footstep_interval: f32,
    footstep_timer: f32,
}

impl Player {
    fn new(spec: &PlayerSpec, disguises: &DisguiseTable) -> Self {
        let mut target = Target::new(spec.position);
        if !spec.landmarks.is_empty() {
            target = target.with_profile(TargetProfile::new());
        }
        if let Some(name) = spec.disguise.as_deref() {
            if let Err(err) = target.apply_disguise(disguises, name) {
                log::warn!("Player starts undisguised: {}", err);
            }
        }

        let mut player = Self {
            target,
            offsets: spec.landmarks.clone(),
            speed: spec.speed,
            radius: spec.radius,
            path: spec.path.clone(),
            next: 0,
            footstep_interval: spec.footstep_interval,
            footstep_timer: 0.0,
        };
        player.place_landmarks();
        player
    }

    fn position(&self) -> Vec3 {
        self.target.position
    }

    fn place_landmarks(&mut self) {
        let position = self.target.position;
        if let Some(profile) = self.target.profile.as_mut() {
            profile.landmarks = self.offsets.iter().map(|offset| position + *offset).collect();
        }
    }

    /// Walk toward the next path point; returns true if the player moved
    fn walk(&mut self, dt: f32) -> bool {
        let start = self.target.position;
        let mut budget = self.speed * dt;
        while budget > 0.0 {
            let Some(&goal) = self.path.get(self.next) else {
                break;
            };
            let offset = goal - self.target.position;
            let distance = offset.length();
            if distance <= budget {
                self.target.position = goal;
                budget -= distance;
                self.next += 1;
            } else {
                self.target.position += offset / distance * budget;
                budget = 0.0;
            }
        }

        let moved = self.target.position != start;
        if moved {
            self.place_landmarks();
        }
        moved
    }

    /// Count down to the next footstep; returns true when one lands
    fn footstep(&mut self, moved: bool, dt: f32) -> bool {
        if !moved || self.footstep_interval <= 0.0 {
            return false;
        }
        self.footstep_timer += dt;
        if self.footstep_timer >= self.footstep_interval {
            self.footstep_timer -= self.footstep_interval;
            return true;
        }
        false
    }
}

/// Final state of one guard
#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub state: StealthState,
    pub detection: f32,
    pub peak_detection: f32,
    pub position: Vec3,
    pub caught_target: bool,
}

/// Outcome of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimSummary {
    /// Simulated seconds
    pub elapsed: f32,
    /// Steps taken
    pub steps: u64,
    /// State changes across all guards
    pub transitions: usize,
    /// Ally alerts raised
    pub alerts: usize,
    /// Sounds and footsteps heard, counted per listener
    pub sounds_heard: usize,
    /// First time any guard caught the player
    pub first_caught_at: Option<f32>,
    /// Player's final position
    pub player_position: Vec3,
    pub agents: Vec<AgentSummary>,
}

/// A running scenario
#[derive(Debug)]
pub struct Simulation {
    settings: SimulationSettings,
    registry: AlertRegistry,
    world: OccluderWorld,
    nav: NavWorld,
    player: Player,
    sounds: Vec<ScheduledSound>,
    next_sound: usize,
    names: HashMap<AgentId, String>,
    peaks: HashMap<AgentId, f32>,
    touching: HashSet<AgentId>,
    summary: SimSummary,
    time: f32,
}

impl Simulation {
    /// Build the registry, worlds and player from a scenario
    pub fn new(scenario: Scenario) -> SimResult<Self> {
        let Scenario {
            simulation,
            registry: registry_config,
            mut world,
            grid,
            disguises,
            player,
            agents,
            sounds,
            ..
        } = scenario;

        let player = Player::new(&player, &disguises);
        world.set_target_collider(player.position(), player.radius);

        let mut registry = AlertRegistry::with_config(registry_config);
        let mut nav = NavWorld::new(grid);
        let mut names = HashMap::new();

        for spec in agents {
            let mut agent = Agent::new(spec.config, spec.position)
                .with_yaw(spec.yaw)
                .with_meter(Box::new(TierMeter::new(&spec.name)));
            if let Some(route) = spec.route {
                agent = agent.with_route(route);
            }
            let id = registry.register(agent)?;
            nav.add_agent(id, spec.position);
            names.insert(id, spec.name);
        }

        log::info!(
            "Scenario loaded: {} guards, {} occluders, {} scheduled sounds",
            registry.len(),
            world.occluders().len(),
            sounds.len()
        );

        Ok(Self {
            settings: simulation,
            registry,
            world,
            nav,
            player,
            sounds,
            next_sound: 0,
            names,
            peaks: HashMap::new(),
            touching: HashSet::new(),
            summary: SimSummary::default(),
            time: 0.0,
        })
    }

    /// Override the step length and duration
    ///
    /// The step must be positive and the duration non-negative.
    pub fn with_settings(mut self, settings: SimulationSettings) -> SimResult<Self> {
        if !settings.step.is_finite() || settings.step <= 0.0 {
            return Err(SimError::InvalidSettings(format!(
                "step must be positive, got {}",
                settings.step
            )));
        }
        if !settings.duration.is_finite() || settings.duration < 0.0 {
            return Err(SimError::InvalidSettings(format!(
                "duration must be non-negative, got {}",
                settings.duration
            )));
        }
        self.settings = settings;
        Ok(self)
    }

    /// Timing in use
    pub fn settings(&self) -> SimulationSettings {
        self.settings
    }

    /// Simulated seconds so far
    pub fn time(&self) -> f32 {
        self.time
    }

    /// The alert registry
    pub fn registry(&self) -> &AlertRegistry {
        &self.registry
    }

    /// The navigation world
    pub fn nav(&self) -> &NavWorld {
        &self.nav
    }

    /// The player as the guards perceive it
    pub fn target(&self) -> &Target {
        &self.player.target
    }

    /// Look up a guard by display name
    pub fn agent_id(&self, name: &str) -> Option<AgentId> {
        self.names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| *id)
    }

    /// Display name of a guard
    pub fn name_of(&self, id: AgentId) -> &str {
        self.names.get(&id).map_or("unknown", String::as_str)
    }

    /// Advance one fixed step; returns the events it produced
    pub fn step(&mut self) -> Vec<StealthEvent> {
        let dt = self.settings.step;
        self.time += dt;

        let moved = self.player.walk(dt);
        let position = self.player.position();
        self.world.set_target_collider(position, self.player.radius);

        if self.player.footstep(moved, dt) {
            self.registry
                .propagate_footstep(position, false, &self.world, &mut self.nav);
        }

        while let Some(sound) = self.sounds.get(self.next_sound).copied() {
            if sound.at > self.time {
                break;
            }
            self.next_sound += 1;
            let heard = self.registry.propagate_sound(
                sound.position,
                sound.volume,
                sound.penetrates_walls,
                &self.world,
                &mut self.nav,
            );
            log::info!("[{:6.2}s] sound at {:?} heard by {}", self.time, sound.position, heard);
        }

        self.registry
            .tick(&self.player.target, &self.world, &mut self.nav, dt);

        for (id, position, moved) in self.nav.advance(dt) {
            if let Some(agent) = self.registry.get_mut(id) {
                agent.set_position(position);
                if moved.length_squared() > 1e-8 {
                    agent.set_forward(flatten(moved));
                }
            }
        }

        self.check_collisions();

        for agent in self.registry.agents() {
            let peak = self.peaks.entry(agent.id()).or_insert(0.0);
            *peak = peak.max(agent.detection_level());
        }

        let events = self.registry.drain_events();
        for event in &events {
            self.record(event);
        }
        self.summary.steps += 1;
        events
    }

    /// Run until the configured duration; returns the summary
    pub fn run(&mut self) -> SimSummary {
        let steps = (self.settings.duration / self.settings.step).round() as u64;
        for _ in 0..steps {
            self.step();
        }
        self.summary()
    }

    /// Summary of the run so far
    pub fn summary(&self) -> SimSummary {
        let mut summary = self.summary.clone();
        summary.elapsed = self.time;
        summary.player_position = self.player.position();
        summary.agents = self
            .registry
            .agents()
            .map(|agent| AgentSummary {
                name: self.name_of(agent.id()).to_string(),
                state: agent.state(),
                detection: agent.detection_level(),
                peak_detection: self.peaks.get(&agent.id()).copied().unwrap_or(0.0),
                position: agent.position(),
                caught_target: agent.is_caught(),
            })
            .collect();
        summary
    }

    /// Report guards the player just bumped into
    fn check_collisions(&mut self) {
        let player = self.player.position();
        let reach = self.player.radius + AGENT_RADIUS;

        let touching: HashSet<AgentId> = self
            .registry
            .agents()
            .filter(|agent| flatten(agent.position() - player).length() < reach)
            .map(Agent::id)
            .collect();

        for &id in touching.difference(&self.touching) {
            if let Err(err) = self
                .registry
                .report_collision(id, &self.player.target, &mut self.nav)
            {
                log::warn!("Collision with {} ignored: {}", id, err);
            }
        }
        self.touching = touching;
    }

    fn record(&mut self, event: &StealthEvent) {
        let time = self.time;
        match *event {
            StealthEvent::StateChanged { agent, from, to } => {
                self.summary.transitions += 1;
                log::info!("[{:6.2}s] {}: {} -> {}", time, self.name_of(agent), from, to);
            }
            StealthEvent::AlliesAlerted { source, responders } => {
                self.summary.alerts += 1;
                log::info!(
                    "[{:6.2}s] {} alerted {} allies",
                    time,
                    self.name_of(source),
                    responders
                );
            }
            StealthEvent::SoundHeard { agent, position } => {
                self.summary.sounds_heard += 1;
                log::debug!("[{:6.2}s] {} heard {:?}", time, self.name_of(agent), position);
            }
            StealthEvent::TargetCaught { agent } => {
                if self.summary.first_caught_at.is_none() {
                    self.summary.first_caught_at = Some(time);
                }
                log::info!("[{:6.2}s] {} caught the player", time, self.name_of(agent));
            }
            StealthEvent::TargetReleased { agent } => {
                log::info!("[{:6.2}s] player slipped away from {}", time, self.name_of(agent));
            }
        }
    }
}
