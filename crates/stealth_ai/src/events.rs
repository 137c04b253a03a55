//! Stealth events

use crate::state::StealthState;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use stealth_core::AgentId;

/// Something observable that happened to an agent during a tick or propagation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StealthEvent {
    /// Agent left one behavior state for another (or re-entered the same one)
    StateChanged {
        /// The agent
        agent: AgentId,
        /// State before the change
        from: StealthState,
        /// State after the change
        to: StealthState,
    },
    /// A chasing agent shouted for help
    AlliesAlerted {
        /// The shouting agent
        source: AgentId,
        /// How many roster members responded
        responders: usize,
    },
    /// Agent heard a sound and will search for it
    SoundHeard {
        /// The listening agent
        agent: AgentId,
        /// Where the sound came from
        position: Vec3,
    },
    /// Chasing agent got within capture radius
    TargetCaught {
        /// The agent
        agent: AgentId,
    },
    /// Target slipped back out of capture radius
    TargetReleased {
        /// The agent
        agent: AgentId,
    },
}

impl StealthEvent {
    /// Create a state change event
    pub fn state_changed(agent: AgentId, from: StealthState, to: StealthState) -> Self {
        Self::StateChanged { agent, from, to }
    }

    /// The agent this event is about
    pub fn agent(&self) -> AgentId {
        match *self {
            Self::StateChanged { agent, .. }
            | Self::SoundHeard { agent, .. }
            | Self::TargetCaught { agent }
            | Self::TargetReleased { agent } => agent,
            Self::AlliesAlerted { source, .. } => source,
        }
    }

    /// Check if this is a state change into `state`
    pub fn is_entering(&self, state: StealthState) -> bool {
        matches!(*self, Self::StateChanged { to, .. } if to == state)
    }
}
