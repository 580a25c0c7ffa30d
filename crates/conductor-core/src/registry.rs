//! Engine registry boundary — the closed set of engines a kernel runs.
//!
//! A registry is consulted exactly once, when the kernel is built. The kernel
//! copies the descriptors and keeps no reference, so membership cannot change
//! afterwards.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Name and scheduling weight of one engine.
///
/// The weight is a percentage share. Weights need not sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineDescriptor {
    pub name: String,
    pub weight: f64,
}

impl EngineDescriptor {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }

    /// Reject empty names and weights that are negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("engine name must not be empty".into()));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(Error::Config(format!(
                "engine {} has invalid weight {}",
                self.name, self.weight
            )));
        }
        Ok(())
    }
}

/// Source of engine descriptors.
pub trait EngineRegistry {
    /// Enumerate every engine, in registration order.
    fn descriptors(&self) -> Vec<EngineDescriptor>;
}

impl EngineRegistry for [EngineDescriptor] {
    fn descriptors(&self) -> Vec<EngineDescriptor> {
        self.to_vec()
    }
}

impl EngineRegistry for Vec<EngineDescriptor> {
    fn descriptors(&self) -> Vec<EngineDescriptor> {
        self.clone()
    }
}

/// Fixed registry, usually loaded from a JSON file of the form
/// `{"engines": [{"name": "planner", "weight": 60}]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticRegistry {
    pub engines: Vec<EngineDescriptor>,
}

impl StaticRegistry {
    pub fn new(engines: Vec<EngineDescriptor>) -> Self {
        Self { engines }
    }

    /// Load and validate a registry file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let registry: StaticRegistry = serde_json::from_str(&data)?;
        registry.validate()?;
        info!(
            "Loaded {} engines from {}",
            registry.engines.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Every descriptor must be valid and names must be unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for engine in &self.engines {
            engine.validate()?;
            if !seen.insert(engine.name.as_str()) {
                return Err(Error::DuplicateEngine(engine.name.clone()));
            }
        }
        Ok(())
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.engines.iter().map(|e| e.weight).sum()
    }
}

impl EngineRegistry for StaticRegistry {
    fn descriptors(&self) -> Vec<EngineDescriptor> {
        self.engines.clone()
    }
}
