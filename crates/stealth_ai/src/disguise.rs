//! Disguises and the disguise lookup table

use crate::error::{Result, StealthError};
use serde::{Deserialize, Serialize};

/// A named detection modifier worn by the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disguise {
    /// Unique name (empty for "no disguise")
    pub name: String,
    /// Detection modifier in `[0, 1]`; 1 = fully visible, lower = harder to detect
    pub modifier: f32,
}

impl Disguise {
    /// Create a disguise, clamping the modifier into `[0, 1]`
    pub fn new(name: impl Into<String>, modifier: f32) -> Self {
        Self {
            name: name.into(),
            modifier: modifier.clamp(0.0, 1.0),
        }
    }

    /// The "no disguise" sentinel
    pub fn none() -> Self {
        Self {
            name: String::new(),
            modifier: 1.0,
        }
    }

    /// Check if this is the "no disguise" sentinel
    pub fn is_none(&self) -> bool {
        self.name.is_empty()
    }
}

impl Default for Disguise {
    fn default() -> Self {
        Self::none()
    }
}

/// Session-wide list of accepted disguises
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisguiseTable {
    disguises: Vec<Disguise>,
}

impl DisguiseTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a disguise (builder style); a later entry with the same name replaces the earlier one
    pub fn with_disguise(mut self, disguise: Disguise) -> Self {
        self.insert(disguise);
        self
    }

    /// Add or replace a disguise
    pub fn insert(&mut self, disguise: Disguise) {
        match self.disguises.iter_mut().find(|d| d.name == disguise.name) {
            Some(existing) => *existing = disguise,
            None => self.disguises.push(disguise),
        }
    }

    /// Look up a disguise by exact name
    pub fn get(&self, name: &str) -> Option<&Disguise> {
        self.disguises.iter().find(|d| d.name == name)
    }

    /// Put the named disguise on `worn`
    ///
    /// An unknown name is reported and leaves `worn` untouched.
    pub fn apply(&self, worn: &mut Disguise, name: &str) -> Result<()> {
        match self.get(name) {
            Some(disguise) => {
                log::debug!("Applied disguise '{}' (modifier {})", disguise.name, disguise.modifier);
                *worn = disguise.clone();
                Ok(())
            }
            None => {
                log::error!("{} is not a valid disguise name", name);
                Err(StealthError::UnknownDisguise(name.to_string()))
            }
        }
    }

    /// Take off whatever `worn` is, resetting it to the sentinel
    pub fn remove(&self, worn: &mut Disguise) {
        *worn = Disguise::none();
    }

    /// Number of accepted disguises
    pub fn len(&self) -> usize {
        self.disguises.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.disguises.is_empty()
    }

    /// Iterate over accepted disguises
    pub fn iter(&self) -> impl Iterator<Item = &Disguise> {
        self.disguises.iter()
    }
}
