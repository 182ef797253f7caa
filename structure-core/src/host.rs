//! Collaborators owned by the host simulation.
//!
//! The structure model reads (and in a few places writes) these through
//! the traits below; it never owns them.

/// The plant-level population record.
///
/// The population is co-owned: the host sets it at sowing and the model
/// reduces it through plant mortality and thinning.
pub trait PopulationSource {
    /// Plants per m².
    fn population(&self) -> f64;
    fn set_population(&mut self, population: f64);
    fn is_alive(&self) -> bool;
}

/// Phenology: has a named developmental stage been reached today.
pub trait StageTracker {
    fn on_day_of(&self, stage: &str) -> bool;
}

/// The leaf-cohort subsystem.
pub trait LeafCohorts {
    fn cohorts_initialised(&self) -> bool;
    /// Appeared leaves across all axes, per m².
    fn plant_appeared_leaf_number(&self) -> f64;
    fn thin(&mut self, proportion_removed: f64);
}
