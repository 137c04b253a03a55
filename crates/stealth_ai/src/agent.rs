//! Stealth agents
//!
//! An [`Agent`] bundles configuration, pose, detection level and the current
//! [`BehaviorState`]. Agents are driven by the
//! [`AlertRegistry`](crate::registry::AlertRegistry) that owns them.

use crate::config::{AgentConfig, StateProfile};
use crate::detection::{DetectionInput, DetectionIntegrator};
use crate::events::StealthEvent;
use crate::meter::{DetectionMeter, MeterTier};
use crate::route::{PathRoute, RouteCursor};
use crate::services::{Navigator, RaycastService};
use crate::state::{
    BehaviorState, ChaseState, PatrolState, Perception, SearchState, StealthState, Transition,
};
use crate::target::Target;
use crate::vision::{Observer, VisibilityEvaluator};
use glam::Vec3;
use stealth_core::{heading_from_yaw, AgentId, UP};
use std::fmt;
use std::sync::Arc;

/// Everything about an agent except its behavior state
#[derive(Debug, Clone)]
pub(crate) struct AgentBody {
    pub id: AgentId,
    pub config: AgentConfig,
    pub position: Vec3,
    pub forward: Vec3,
    pub route: Option<Arc<PathRoute>>,
    pub cursor: RouteCursor,
    pub detection: DetectionIntegrator,
    pub last_known_target: Option<Vec3>,
    pub last_heard: Option<Vec3>,
    pub fov: f32,
    pub speed: f32,
    pub visibility: f32,
    pub alert_requested: bool,
    pub events: Vec<StealthEvent>,
}

impl AgentBody {
    pub fn apply_profile(&mut self, profile: StateProfile, nav: &mut dyn Navigator) {
        self.fov = profile.fov;
        self.set_speed(profile.speed, nav);
    }

    pub fn set_speed(&mut self, speed: f32, nav: &mut dyn Navigator) {
        self.speed = speed;
        nav.set_speed(self.id, speed);
    }

    /// Where to search when no better position is known
    pub fn search_fallback(&self) -> Vec3 {
        self.last_known_target.unwrap_or(self.position)
    }

    pub fn eye(&self) -> Vec3 {
        self.position + UP * self.config.eye_height
    }

    pub fn observer(&self) -> Observer {
        Observer {
            eye: self.eye(),
            forward: self.forward,
            fov: self.fov,
            vision_distance: self.config.vision_distance,
        }
    }
}

/// A stealth NPC
pub struct Agent {
    body: AgentBody,
    state: BehaviorState,
    started: bool,
    meter: Option<Box<dyn DetectionMeter>>,
}

impl Agent {
    /// Create an agent at `position` facing +Z
    pub fn new(config: AgentConfig, position: Vec3) -> Self {
        let fov = config.patrol.fov;
        let speed = config.patrol.speed;
        Self {
            body: AgentBody {
                id: AgentId::null(),
                config,
                position,
                forward: Vec3::Z,
                route: None,
                cursor: RouteCursor::default(),
                detection: DetectionIntegrator::new(),
                last_known_target: None,
                last_heard: None,
                fov,
                speed,
                visibility: 0.0,
                alert_requested: false,
                events: Vec::new(),
            },
            state: BehaviorState::default(),
            started: false,
            meter: None,
        }
    }

    /// Assign a patrol route (builder style)
    pub fn with_route(mut self, route: Arc<PathRoute>) -> Self {
        self.set_route(Some(route));
        self
    }

    /// Face a yaw angle in degrees (builder style)
    pub fn with_yaw(mut self, yaw_degrees: f32) -> Self {
        self.body.forward = heading_from_yaw(yaw_degrees);
        self
    }

    /// Attach a detection meter (builder style)
    pub fn with_meter(mut self, meter: Box<dyn DetectionMeter>) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Roster id (null until registered)
    pub fn id(&self) -> AgentId {
        self.body.id
    }

    pub(crate) fn assign_id(&mut self, id: AgentId) {
        self.body.id = id;
    }

    /// Configuration
    pub fn config(&self) -> &AgentConfig {
        &self.body.config
    }

    /// Body position
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    /// Move the body (the host reports navigator movement here)
    pub fn set_position(&mut self, position: Vec3) {
        self.body.position = position;
    }

    /// Facing direction
    pub fn forward(&self) -> Vec3 {
        self.body.forward
    }

    /// Override the facing direction; zero vectors are ignored
    pub fn set_forward(&mut self, forward: Vec3) {
        if let Some(forward) = forward.try_normalize() {
            self.body.forward = forward;
        }
    }

    /// Eye/ear position
    pub fn eye(&self) -> Vec3 {
        self.body.eye()
    }

    /// Assigned route
    pub fn route(&self) -> Option<&Arc<PathRoute>> {
        self.body.route.as_ref()
    }

    /// Replace the route and restart from its first waypoint
    pub fn set_route(&mut self, route: Option<Arc<PathRoute>>) {
        self.body.route = route;
        self.body.cursor = RouteCursor::default();
    }

    /// Position along the route
    pub fn cursor(&self) -> RouteCursor {
        self.body.cursor
    }

    /// Current behavior state kind
    pub fn state(&self) -> StealthState {
        self.state.kind()
    }

    /// Current behavior state with its data
    pub fn behavior(&self) -> &BehaviorState {
        &self.state
    }

    /// Detection level in `[0, 1]`
    pub fn detection_level(&self) -> f32 {
        self.body.detection.level()
    }

    /// Overwrite the detection level (clamped)
    pub fn set_detection_level(&mut self, level: f32) {
        self.body.detection.set_level(level);
    }

    /// Detection integrator, including quick-fill progress
    pub fn detection(&self) -> &DetectionIntegrator {
        &self.body.detection
    }

    /// Meter face for the current level
    pub fn meter_tier(&self) -> MeterTier {
        MeterTier::from_level(self.body.detection.level(), self.body.config.suspicion_threshold)
    }

    /// Visibility fraction computed on the last tick
    pub fn visibility(&self) -> f32 {
        self.body.visibility
    }

    /// Where this agent last saw the target
    pub fn last_known_target(&self) -> Option<Vec3> {
        self.body.last_known_target
    }

    /// Set where this agent believes the target is
    pub fn set_last_known_target(&mut self, position: Option<Vec3>) {
        self.body.last_known_target = position;
    }

    /// Where this agent last heard a sound
    pub fn last_heard(&self) -> Option<Vec3> {
        self.body.last_heard
    }

    /// Current field of view in degrees
    pub fn fov(&self) -> f32 {
        self.body.fov
    }

    /// Current speed as last handed to the navigator
    pub fn speed(&self) -> f32 {
        self.body.speed
    }

    /// Position being searched, if searching
    pub fn search_position(&self) -> Option<Vec3> {
        self.state.as_search().map(|search| search.destination)
    }

    /// Check if a chasing agent has the target within capture radius
    pub fn is_caught(&self) -> bool {
        self.state.as_chase().is_some_and(|chase| chase.caught)
    }

    /// Leave the current state and enter the requested one
    ///
    /// Always runs exit and enter, even when the state kind does not change.
    /// Hosts go through [`AlertRegistry::set_state`](crate::registry::AlertRegistry::set_state)
    /// so a Chase entry alerts allies right away.
    pub(crate) fn set_state(&mut self, transition: Transition, nav: &mut dyn Navigator) {
        self.started = true;
        let from = self.state.kind();

        if from == StealthState::Chase {
            self.body.detection.cancel_quick_fill();
        }

        self.state = match transition {
            Transition::Patrol => BehaviorState::Patrol(PatrolState::enter(&mut self.body, nav)),
            Transition::Search(destination) => {
                BehaviorState::Search(SearchState::enter(&mut self.body, nav, destination))
            }
            Transition::Chase => BehaviorState::Chase(ChaseState::enter(&mut self.body, nav)),
        };

        let to = self.state.kind();
        log::debug!("{} {} -> {}", self.body.id, from, to);
        self.body.events.push(StealthEvent::state_changed(self.body.id, from, to));
    }

    /// Run one simulation step against `target`
    pub(crate) fn tick(
        &mut self,
        target: &Target,
        rays: &dyn RaycastService,
        nav: &mut dyn Navigator,
        dt: f32,
    ) {
        if !self.started {
            self.started = true;
            self.state = BehaviorState::Patrol(PatrolState::enter(&mut self.body, nav));
        }

        let visibility = VisibilityEvaluator::new(rays).visibility(&self.body.observer(), target);
        self.body.visibility = visibility;
        if visibility > 0.0 {
            self.body.last_known_target = Some(target.position);
        }

        let config = &self.body.config;
        let input = DetectionInput {
            visibility,
            distance: self.body.position.distance(target.position),
            vision_distance: config.vision_distance,
            perception_rate: config.perception_rate,
            decay_rate: config.decay_rate,
            disguise: target.profile.as_ref().map(|profile| profile.modifier()),
        };
        self.body.detection.integrate(&input, dt);

        let seen = Perception {
            target: target.position,
            visibility,
            modifier: target.disguise_modifier(),
        };
        let from = self.state.kind();
        let transition = match &mut self.state {
            BehaviorState::Patrol(patrol) => patrol.update(&mut self.body, nav, &seen, dt),
            BehaviorState::Search(search) => search.update(&mut self.body, &seen, dt),
            BehaviorState::Chase(chase) => chase.update(&mut self.body, nav, &seen, dt),
        };

        if let Some(transition) = transition {
            self.set_state(transition, nav);
            if from == StealthState::Search && transition == Transition::Chase {
                self.body.detection.start_quick_fill();
            }
        }

        if self.state.kind() == StealthState::Chase {
            let rate = self.body.config.perception_rate;
            self.body.detection.step_quick_fill(rate, seen.modifier, dt);
        } else {
            self.body.detection.cancel_quick_fill();
        }

        if let Some(meter) = self.meter.as_deref_mut() {
            let threshold = self.body.config.suspicion_threshold;
            self.body.detection.publish(meter, threshold);
        }
    }

    /// Record a heard sound and start searching at it
    pub(crate) fn hear(&mut self, position: Vec3, nav: &mut dyn Navigator) {
        self.body.last_heard = Some(position);
        self.body.events.push(StealthEvent::SoundHeard {
            agent: self.body.id,
            position,
        });
        self.set_state(Transition::Search(position), nav);
    }

    /// Consume a pending ally-alert request
    pub(crate) fn take_alert_request(&mut self) -> bool {
        std::mem::take(&mut self.body.alert_requested)
    }

    /// Drain events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<StealthEvent> {
        std::mem::take(&mut self.body.events)
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.body.id)
            .field("state", &self.state)
            .field("position", &self.body.position)
            .field("detection", &self.body.detection.level())
            .field("has_meter", &self.meter.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{RouteMode, Waypoint};
    use crate::services::RaycastHit;
    use stealth_core::angle_between_degrees;

    #[derive(Default)]
    struct RecordingNav {
        destinations: Vec<Vec3>,
        speeds: Vec<f32>,
    }

    impl Navigator for RecordingNav {
        fn set_destination(&mut self, _agent: AgentId, destination: Vec3) {
            self.destinations.push(destination);
        }

        fn set_speed(&mut self, _agent: AgentId, speed: f32) {
            self.speeds.push(speed);
        }

        fn shortest_path(&self, _agent: AgentId, _from: Vec3, _to: Vec3) -> Vec<Vec3> {
            Vec::new()
        }
    }

    struct OpenSky;

    impl RaycastService for OpenSky {
        fn raycast_all(&self, _origin: Vec3, _direction: Vec3, _max: f32) -> Vec<RaycastHit> {
            Vec::new()
        }
    }

    struct Wall;

    impl RaycastService for Wall {
        fn raycast_all(&self, origin: Vec3, direction: Vec3, _max: f32) -> Vec<RaycastHit> {
            vec![RaycastHit::new(crate::services::HitTag::Solid, origin + direction, 1.0)]
        }
    }

    fn hidden_target() -> Target {
        Target::new(Vec3::new(0.0, 0.0, -40.0))
    }

    #[test]
    fn test_first_tick_enters_patrol() {
        let mut agent = Agent::new(AgentConfig::default().with_speed(3.0), Vec3::ZERO);
        let mut nav = RecordingNav::default();
        agent.tick(&hidden_target(), &OpenSky, &mut nav, 0.1);
        assert_eq!(agent.state(), StealthState::Patrol);
        assert_eq!(nav.speeds, vec![3.0]);
        assert_eq!(agent.fov(), 70.0);
    }

    #[test]
    fn test_patrol_dwell_then_advance() {
        let route = PathRoute::new(RouteMode::Loop)
            .with_waypoint(Waypoint::new(Vec3::ZERO).with_dwell(0.25).with_facing(90.0))
            .with_waypoint(Waypoint::new(Vec3::new(10.0, 0.0, 0.0)));
        let mut agent = Agent::new(AgentConfig::default(), Vec3::ZERO).with_route(Arc::new(route));
        let mut nav = RecordingNav::default();

        for _ in 0..3 {
            agent.tick(&hidden_target(), &OpenSky, &mut nav, 0.1);
        }
        assert_eq!(agent.cursor().index(), 0);
        assert!(agent.forward().x > 0.0);

        agent.tick(&hidden_target(), &OpenSky, &mut nav, 0.1);
        assert_eq!(agent.cursor().index(), 1);
        assert_eq!(agent.behavior().as_patrol().map(|p| p.waiting), Some(0.0));

        agent.tick(&hidden_target(), &OpenSky, &mut nav, 0.1);
        assert_eq!(nav.destinations.last(), Some(&Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_empty_route_idles() {
        let route = Arc::new(PathRoute::new(RouteMode::PingPong));
        let mut agent = Agent::new(AgentConfig::default(), Vec3::ZERO).with_route(route);
        let mut nav = RecordingNav::default();
        agent.tick(&hidden_target(), &OpenSky, &mut nav, 0.1);
        assert!(nav.destinations.is_empty());
        assert_eq!(agent.state(), StealthState::Patrol);
    }

    #[test]
    fn test_seen_at_close_range_leads_to_chase() {
        let mut agent = Agent::new(AgentConfig::default().with_ally_alert_range(0.0), Vec3::ZERO);
        let target = Target::new(Vec3::new(0.0, 0.0, 5.0));
        let mut nav = RecordingNav::default();

        agent.tick(&target, &OpenSky, &mut nav, 0.6);
        assert_eq!(agent.state(), StealthState::Search);
        assert_eq!(agent.search_position(), Some(target.position));

        agent.tick(&target, &OpenSky, &mut nav, 1.0);
        assert_eq!(agent.state(), StealthState::Chase);
        assert!(!agent.take_alert_request());
    }

    #[test]
    fn test_chase_enter_requests_alert() {
        let mut agent = Agent::new(AgentConfig::default(), Vec3::ZERO);
        let mut nav = RecordingNav::default();
        agent.set_state(Transition::Chase, &mut nav);
        assert!(agent.take_alert_request());
        assert!(!agent.take_alert_request());
        assert_eq!(agent.fov(), 90.0);
    }

    #[test]
    fn test_capture_and_release() {
        let mut agent = Agent::new(AgentConfig::default().with_speed(4.0), Vec3::ZERO);
        let mut nav = RecordingNav::default();
        agent.set_state(Transition::Chase, &mut nav);

        agent.tick(&Target::new(Vec3::new(0.0, 0.0, 1.0)), &OpenSky, &mut nav, 0.1);
        assert!(agent.is_caught());
        assert_eq!(agent.speed(), 0.0);

        agent.tick(&Target::new(Vec3::new(0.0, 0.0, 3.0)), &OpenSky, &mut nav, 0.1);
        assert!(!agent.is_caught());
        assert_eq!(agent.speed(), 4.0);

        let events = agent.drain_events();
        assert!(events.contains(&StealthEvent::TargetCaught { agent: agent.id() }));
        assert!(events.contains(&StealthEvent::TargetReleased { agent: agent.id() }));
    }

    #[test]
    fn test_chase_loses_target() {
        let mut agent = Agent::new(AgentConfig::default(), Vec3::ZERO);
        let mut nav = RecordingNav::default();
        agent.set_last_known_target(Some(Vec3::new(2.0, 0.0, 8.0)));
        agent.set_state(Transition::Chase, &mut nav);

        agent.tick(&Target::new(Vec3::new(0.0, 0.0, 8.0)), &Wall, &mut nav, 0.1);
        assert_eq!(agent.state(), StealthState::Search);
        assert_eq!(agent.search_position(), Some(Vec3::new(2.0, 0.0, 8.0)));
    }

    #[test]
    fn test_search_sweeps_then_returns_to_patrol() {
        let mut agent = Agent::new(AgentConfig::default(), Vec3::ZERO);
        let mut nav = RecordingNav::default();
        agent.set_state(Transition::Search(Vec3::new(0.0, 0.0, 1.0)), &mut nav);

        agent.tick(&hidden_target(), &Wall, &mut nav, 0.5);
        let search = agent.behavior().as_search().copied().unwrap();
        assert!(search.reached());
        assert!(agent.forward().x < 0.0);

        for _ in 0..6 {
            agent.tick(&hidden_target(), &Wall, &mut nav, 0.5);
        }
        assert_eq!(agent.state(), StealthState::Patrol);
    }

    #[test]
    fn test_search_sweep_turns_back_past_bound() {
        let mut config = AgentConfig::default();
        config.sweep_speed = 40.0;
        config.sweep_angle = 90.0;
        config.decay_rate = 0.0;
        let mut agent = Agent::new(config, Vec3::ZERO);
        agent.set_detection_level(0.5);
        let mut nav = RecordingNav::default();
        agent.set_state(Transition::Search(Vec3::new(0.0, 0.0, 1.0)), &mut nav);

        let sweep_of = |agent: &Agent| agent.behavior().as_search().and_then(|s| s.sweep).unwrap();
        let swing = |agent: &Agent| angle_between_degrees(Vec3::Z, agent.forward());

        for _ in 0..2 {
            agent.tick(&hidden_target(), &Wall, &mut nav, 1.0);
        }
        assert!(!sweep_of(&agent).clockwise);
        assert!((swing(&agent) - 80.0).abs() < 1e-3);

        agent.tick(&hidden_target(), &Wall, &mut nav, 1.0);
        assert!((swing(&agent) - 120.0).abs() < 1e-3);
        assert!(agent.forward().x < 0.0);
        assert!(sweep_of(&agent).clockwise);

        agent.tick(&hidden_target(), &Wall, &mut nav, 1.0);
        assert!((swing(&agent) - 80.0).abs() < 1e-3);
        assert!(agent.forward().x < 0.0);

        for _ in 0..5 {
            agent.tick(&hidden_target(), &Wall, &mut nav, 1.0);
        }
        assert!(agent.forward().x > 0.0);
        assert!((swing(&agent) - 120.0).abs() < 1e-3);
        assert!(!sweep_of(&agent).clockwise);
        assert_eq!(agent.state(), StealthState::Search);
    }

    #[test]
    fn test_search_reacquire_starts_quick_fill() {
        let mut agent = Agent::new(AgentConfig::default().with_ally_alert_range(0.0), Vec3::ZERO);
        let mut nav = RecordingNav::default();
        agent.set_state(Transition::Search(Vec3::new(0.0, 0.0, 20.0)), &mut nav);

        agent.tick(&Target::new(Vec3::new(0.0, 0.0, 25.0)), &OpenSky, &mut nav, 0.1);
        assert_eq!(agent.state(), StealthState::Chase);
        assert!(agent.detection().quick_fill().is_active());
        assert!(agent.detection_level() > 0.0);

        agent.tick(&hidden_target(), &Wall, &mut nav, 0.1);
        assert_eq!(agent.state(), StealthState::Search);
        assert!(!agent.detection().quick_fill().is_active());
    }

    #[test]
    fn test_set_forward_ignores_zero() {
        let mut agent = Agent::new(AgentConfig::default(), Vec3::ZERO).with_yaw(90.0);
        agent.set_forward(Vec3::ZERO);
        assert!((agent.forward() - Vec3::X).length() < 1e-5);
    }
}
