//! Alert registry
//!
//! The registry owns the roster of live agents. It ticks them in roster order
//! and runs sound and ally-alert propagation synchronously, so every event is
//! fully resolved before the next agent updates.

use crate::agent::Agent;
use crate::error::{Result, StealthError};
use crate::events::StealthEvent;
use crate::services::{polyline_length, HitTag, Navigator, RaycastService};
use crate::state::{StealthState, Transition};
use crate::target::Target;
use glam::Vec3;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use stealth_core::{AgentId, IdGenerator};
use std::sync::Arc;

/// Registry-wide switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Keep agent events for the host to drain
    pub record_events: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            record_events: true,
        }
    }
}

/// A registry shared across threads
pub type SharedRegistry = Arc<Mutex<AlertRegistry>>;

/// How a sound reaches a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hearing {
    /// Direct or through a single penetrable wall only
    LineOnly,
    /// Also around corners along the navigation path
    AroundCorners,
}

/// Roster of agents plus sound and alert propagation
pub struct AlertRegistry {
    config: RegistryConfig,
    agents: Vec<Agent>,
    ids: IdGenerator,
    events: Vec<StealthEvent>,
}

impl std::fmt::Debug for AlertRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertRegistry")
            .field("config", &self.config)
            .field("agents", &self.agents)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl Default for AlertRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with a config
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            agents: Vec::new(),
            ids: IdGenerator::new(),
            events: Vec::new(),
        }
    }

    /// Wrap in a mutex for use from several threads
    pub fn shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Registry config
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Add an agent to the roster
    pub fn register(&mut self, mut agent: Agent) -> Result<AgentId> {
        agent.config().validate()?;
        let id = self.ids.next();
        agent.assign_id(id);
        log::info!("Registered {} at {:?}", id, agent.position());
        self.agents.push(agent);
        Ok(id)
    }

    /// Remove an agent from the roster and hand it back
    pub fn unregister(&mut self, id: AgentId) -> Result<Agent> {
        let index = self.index_of(id)?;
        let agent = self.agents.remove(index);
        log::info!("Unregistered {}", id);
        Ok(agent)
    }

    /// Remove every agent
    pub fn clear(&mut self) {
        if !self.agents.is_empty() {
            log::info!("Clearing {} agents", self.agents.len());
        }
        self.agents.clear();
        self.events.clear();
    }

    /// Number of registered agents
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Check if the roster is empty
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Check if an agent is registered
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.iter().any(|agent| agent.id() == id)
    }

    /// Get an agent
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    /// Get an agent mutably
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|agent| agent.id() == id)
    }

    /// Iterate agents in roster order
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Iterate agents mutably in roster order
    pub fn agents_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    /// Ids in roster order
    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.iter().map(Agent::id)
    }

    fn index_of(&self, id: AgentId) -> Result<usize> {
        self.agents
            .iter()
            .position(|agent| agent.id() == id)
            .ok_or(StealthError::AgentNotRegistered(id))
    }

    /// Advance every agent one step against `target`
    ///
    /// An ally alert raised by one agent is delivered before the next agent updates.
    pub fn tick(
        &mut self,
        target: &Target,
        rays: &dyn RaycastService,
        nav: &mut dyn Navigator,
        dt: f32,
    ) {
        for index in 0..self.agents.len() {
            self.agents[index].tick(target, rays, nav, dt);
            self.collect_events_from(index);
            self.settle(index, nav);
        }
    }

    /// Force an agent into a state
    pub fn set_state(
        &mut self,
        id: AgentId,
        transition: Transition,
        nav: &mut dyn Navigator,
    ) -> Result<()> {
        let index = self.index_of(id)?;
        self.agents[index].set_state(transition, nav);
        self.collect_events_from(index);
        self.settle(index, nav);
        Ok(())
    }

    /// The target bumped into an agent: search where the target is now
    pub fn report_collision(
        &mut self,
        id: AgentId,
        target: &Target,
        nav: &mut dyn Navigator,
    ) -> Result<()> {
        log::debug!("{} collided with the target", id);
        self.set_state(id, Transition::Search(target.position), nav)
    }

    /// Broadcast a sound to every patrolling or searching agent in earshot
    ///
    /// Returns how many agents heard it.
    pub fn propagate_sound(
        &mut self,
        position: Vec3,
        priority_volume: f32,
        penetrates_walls: bool,
        rays: &dyn RaycastService,
        nav: &mut dyn Navigator,
    ) -> usize {
        log::debug!(
            "Sound at {:?} (volume {}, penetrating: {})",
            position,
            priority_volume,
            penetrates_walls
        );
        self.propagate(position, penetrates_walls, Hearing::AroundCorners, rays, nav)
    }

    /// Broadcast a footstep: like a sound but never heard around corners
    pub fn propagate_footstep(
        &mut self,
        position: Vec3,
        penetrates_walls: bool,
        rays: &dyn RaycastService,
        nav: &mut dyn Navigator,
    ) -> usize {
        self.propagate(position, penetrates_walls, Hearing::LineOnly, rays, nav)
    }

    fn propagate(
        &mut self,
        position: Vec3,
        penetrates_walls: bool,
        hearing: Hearing,
        rays: &dyn RaycastService,
        nav: &mut dyn Navigator,
    ) -> usize {
        let mut heard = 0;
        for index in 0..self.agents.len() {
            let agent = &self.agents[index];
            if !matches!(agent.state(), StealthState::Patrol | StealthState::Search) {
                continue;
            }
            if hears(agent, position, penetrates_walls, hearing, rays, &*nav) {
                self.agents[index].hear(position, nav);
                self.collect_events_from(index);
                heard += 1;
            }
        }
        heard
    }

    /// Send allies of `source` within its alert range to search
    ///
    /// Each responder searches at its own last known target position.
    /// Returns how many agents responded.
    pub fn propagate_alert(&mut self, source: AgentId, nav: &mut dyn Navigator) -> Result<usize> {
        let index = self.index_of(source)?;
        Ok(self.alert_from(index, nav))
    }

    fn alert_from(&mut self, source: usize, nav: &mut dyn Navigator) -> usize {
        let source_id = self.agents[source].id();
        let origin = self.agents[source].position();
        let range = self.agents[source].config().ally_alert_range;

        let mut responders = 0;
        for index in 0..self.agents.len() {
            let agent = &mut self.agents[index];
            if index == source || agent.state() == StealthState::Chase {
                continue;
            }
            if origin.distance(agent.position()) < range {
                let at = agent.last_known_target().unwrap_or(agent.position());
                agent.set_state(Transition::Search(at), nav);
                self.collect_events_from(index);
                responders += 1;
            }
        }

        log::debug!("{} alerted {} allies", source_id, responders);
        self.record(StealthEvent::AlliesAlerted {
            source: source_id,
            responders,
        });
        responders
    }

    /// Length of the walkable path from an agent to `to`
    pub fn path_length(&self, id: AgentId, to: Vec3, nav: &dyn Navigator) -> Result<f32> {
        let index = self.index_of(id)?;
        Ok(path_length(&self.agents[index], to, nav))
    }

    /// Events recorded since the last drain
    pub fn events(&self) -> &[StealthEvent] {
        &self.events
    }

    /// Drain recorded events
    pub fn drain_events(&mut self) -> Vec<StealthEvent> {
        std::mem::take(&mut self.events)
    }

    fn settle(&mut self, index: usize, nav: &mut dyn Navigator) {
        if self.agents[index].take_alert_request() {
            self.alert_from(index, nav);
        }
    }

    fn collect_events_from(&mut self, index: usize) {
        let events = self.agents[index].drain_events();
        if self.config.record_events {
            self.events.extend(events);
        }
    }

    fn record(&mut self, event: StealthEvent) {
        if self.config.record_events {
            self.events.push(event);
        }
    }
}

fn path_length(agent: &Agent, to: Vec3, nav: &dyn Navigator) -> f32 {
    let from = agent.position();
    let corners = nav.shortest_path(agent.id(), from, to);
    polyline_length(from, &corners, to)
}

fn hears(
    agent: &Agent,
    position: Vec3,
    penetrates_walls: bool,
    hearing: Hearing,
    rays: &dyn RaycastService,
    nav: &dyn Navigator,
) -> bool {
    let ear = agent.eye();
    let audial = agent.config().audial_distance;
    let distance = ear.distance(position);
    if distance >= audial {
        return false;
    }

    let Some(direction) = (position - ear).try_normalize() else {
        return true;
    };

    let hits = rays.raycast_all(ear, direction, distance);
    if hits.iter().any(|hit| hit.tag.blocks_sound()) {
        log::trace!("{} cannot hear {:?}: sound blocked", agent.id(), position);
        return false;
    }

    let intervening = hits.iter().filter(|hit| hit.tag != HitTag::Target).count();
    match intervening {
        0 => true,
        1 if penetrates_walls => true,
        _ => match hearing {
            Hearing::AroundCorners => path_length(agent, position, nav) <= audial,
            Hearing::LineOnly => false,
        },
    }
}
