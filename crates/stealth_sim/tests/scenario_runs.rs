//! End-to-end runs of the bundled scenarios

use std::path::PathBuf;
use stealth_ai::prelude::{StealthEvent, StealthState};
use stealth_sim::{load_scenario, parse_scenario, Simulation};

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

#[test]
fn test_alarm_brings_allies() {
    let scenario = load_scenario(scenario_path("alarm.toml")).unwrap();
    let mut sim = Simulation::new(scenario).unwrap();
    let lookout = sim.agent_id("lookout").unwrap();
    let resting_a = sim.agent_id("resting-a").unwrap();
    let resting_b = sim.agent_id("resting-b").unwrap();

    let mut events = Vec::new();
    for _ in 0..100 {
        events.extend(sim.step());
    }

    let first_alert = events.iter().find_map(|event| match *event {
        StealthEvent::AlliesAlerted { source, responders } => Some((source, responders)),
        _ => None,
    });
    assert_eq!(first_alert, Some((lookout, 2)));

    for ally in [resting_a, resting_b] {
        assert!(events
            .iter()
            .any(|e| e.agent() == ally && e.is_entering(StealthState::Search)));
    }

    let summary = sim.run();
    let lookout = summary.agents.iter().find(|a| a.name == "lookout").unwrap();
    assert_eq!(lookout.state, StealthState::Chase);
    assert!(lookout.caught_target);
    assert!(summary.first_caught_at.is_some());
}

#[test]
fn test_courtyard_runs_and_stays_in_bounds() {
    let scenario = load_scenario(scenario_path("courtyard.toml")).unwrap();
    let mut sim = Simulation::new(scenario).unwrap();
    assert_eq!(sim.registry().len(), 3);

    let steps = (sim.settings().duration / sim.settings().step).round() as usize;
    for _ in 0..steps {
        sim.step();
        for agent in sim.registry().agents() {
            let level = agent.detection_level();
            assert!((0.0..=1.0).contains(&level));
            assert!(sim.nav().grid().cell_of(agent.position()).is_some());
        }
    }

    let summary = sim.summary();
    assert_eq!(summary.agents.len(), 3);
    assert_eq!(summary.steps as usize, steps);
}

#[test]
fn test_runs_are_deterministic() {
    let run = || {
        let scenario = load_scenario(scenario_path("courtyard.toml")).unwrap();
        let summary = Simulation::new(scenario).unwrap().run();
        serde_json::to_string(&summary).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_footsteps_wake_a_blind_guard() {
    let content = r#"
        [simulation]
        duration = 3.0
        step = 0.1

        [registry]

        [navmesh]
        width = 20.0
        depth = 20.0

        [target]
        position = [2.0, 0.0, 10.0]
        speed = 2.0
        footstep_interval = 0.5
        path = [[8.0, 0.0, 10.0]]

        [[agents]]
        name = "blind"
        position = [12.0, 0.0, 10.0]

        [agents.config]
        vision_distance = 0.0
        audial_distance = 6.0
    "#;

    let mut sim = Simulation::new(parse_scenario(content).unwrap()).unwrap();
    let summary = sim.run();
    assert!(summary.sounds_heard > 0);

    let blind = sim.agent_id("blind").unwrap();
    let heard = sim.registry().get(blind).unwrap().last_heard().unwrap();
    assert!(heard.x > 6.0);
}
