//! Fixed behavior constants shared by every agent
//!
//! Per-agent tunables live in [`AgentConfig`](crate::config::AgentConfig).

/// Distance to the target below which a chasing agent has caught it
pub const CAPTURE_RADIUS: f32 = 1.5;

/// Distance to the search position below which the search point is reached
pub const SEARCH_ARRIVAL_RADIUS: f32 = 2.5;

/// Distance to a waypoint below which a patrolling agent starts dwelling
pub const WAYPOINT_ARRIVAL_RADIUS: f32 = 1.5;

/// Seconds an agent stays in Search before it may return to Patrol
pub const MIN_SEARCH_TIME: f32 = 3.0;

/// Seconds between repeated ally alerts while chasing
pub const SHOUT_INTERVAL: f32 = 3.0;

/// Detection levels below this count as zero
pub const NEAR_ZERO: f32 = 1e-5;

/// Disguises with a lower modifier cannot be re-acquired from Search
pub const MIN_REACQUIRE_MODIFIER: f32 = 0.1;

/// Heading blend rate toward a waypoint's facing while dwelling (per second)
pub const FACING_BLEND_RATE: f32 = 2.0;

/// Quick-fill ramp speed multiplier over the perception rate
pub const QUICK_FILL_RATE: f32 = 2.0;
