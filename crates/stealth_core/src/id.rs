//! Agent identifiers with generation counters

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Identifies one agent in a registry roster
///
/// Lower 32 bits hold the index, upper 32 bits the generation, so an id
/// handed out for a destroyed agent never aliases a later one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId {
    bits: u64,
}

impl AgentId {
    /// Create a new id from index and generation
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            bits: (generation as u64) << 32 | index as u64,
        }
    }

    /// Create a null/invalid id
    #[inline]
    pub const fn null() -> Self {
        Self { bits: u64::MAX }
    }

    /// Check if this id is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.bits == u64::MAX
    }

    /// Get the index portion
    #[inline]
    pub const fn index(&self) -> u32 {
        self.bits as u32
    }

    /// Get the generation portion
    #[inline]
    pub const fn generation(&self) -> u32 {
        (self.bits >> 32) as u32
    }

    /// Get the raw bits
    #[inline]
    pub const fn to_bits(&self) -> u64 {
        self.bits
    }

    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "AgentId(null)")
        } else {
            write!(f, "AgentId({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "agent:null")
        } else {
            write!(f, "agent:{}v{}", self.index(), self.generation())
        }
    }
}

/// Thread-safe agent id generator
///
/// Each generator stamps its ids with its own generation so two registries
/// built one after another hand out distinguishable ids.
pub struct IdGenerator {
    next: AtomicU64,
    generation: u32,
}

impl IdGenerator {
    /// Create a new generator for generation zero
    pub const fn new() -> Self {
        Self::with_generation(0)
    }

    /// Create a generator stamping ids with `generation`
    pub const fn with_generation(generation: u32) -> Self {
        Self {
            next: AtomicU64::new(0),
            generation,
        }
    }

    /// Generate the next unique id
    pub fn next(&self) -> AgentId {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        AgentId::new(index as u32, self.generation)
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
