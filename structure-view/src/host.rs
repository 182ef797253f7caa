//! A minimal host for the viewer: weather, phenology, plant population and
//! leaf cohorts, just enough to drive a [`structure_core::Structure`]
//! through a season.

use rand::Rng;
use structure_core::host::{LeafCohorts, PopulationSource, StageTracker};

/// Plant population record.
#[derive(Clone, Debug)]
pub struct DemoPlant {
    pub population: f64,
    pub alive: bool,
}

impl PopulationSource for DemoPlant {
    fn population(&self) -> f64 {
        self.population
    }

    fn set_population(&mut self, population: f64) {
        self.population = population;
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Single-stage phenology: the named stage is reached on the day the
/// accumulated thermal time first crosses `stage_thermal_time`.
#[derive(Clone, Debug)]
pub struct DemoPhenology {
    pub stage: String,
    pub stage_thermal_time: f64,
    accumulated: f64,
    reached_today: bool,
}

impl DemoPhenology {
    pub fn new(stage: impl Into<String>, stage_thermal_time: f64) -> Self {
        Self {
            stage: stage.into(),
            stage_thermal_time,
            accumulated: 0.0,
            reached_today: false,
        }
    }

    /// Accumulates today's thermal time.
    ///
    /// ### Returns
    /// `true` if the stage is reached today.
    pub fn advance(&mut self, thermal_time: f64) -> bool {
        let before = self.accumulated;
        self.accumulated += thermal_time;
        self.reached_today =
            before < self.stage_thermal_time && self.accumulated >= self.stage_thermal_time;
        self.reached_today
    }

    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }
}

impl StageTracker for DemoPhenology {
    fn on_day_of(&self, stage: &str) -> bool {
        self.reached_today && stage == self.stage
    }
}

/// Leaf cohorts reduced to one number: appeared leaves per m², taken as
/// main-stem nodes on every stem.
#[derive(Clone, Debug, Default)]
pub struct DemoLeaf {
    pub initialised: bool,
    appeared: f64,
}

impl DemoLeaf {
    pub fn update(&mut self, main_stem_node_number: f64, total_stem_population: f64) {
        if self.initialised {
            self.appeared = main_stem_node_number * total_stem_population.max(0.0);
        }
    }
}

impl LeafCohorts for DemoLeaf {
    fn cohorts_initialised(&self) -> bool {
        self.initialised
    }

    fn plant_appeared_leaf_number(&self) -> f64 {
        self.appeared
    }

    fn thin(&mut self, proportion_removed: f64) {
        self.appeared *= 1.0 - proportion_removed;
    }
}

/// Daily mean temperature drawn uniformly around `mean_temperature`.
///
/// ### Fields
/// - `mean_temperature` - °C.
/// - `amplitude` - Half-width of the daily draw (°C).
/// - `base_temperature` - Temperature below which no development occurs.
#[derive(Clone, Copy, Debug)]
pub struct Weather {
    pub mean_temperature: f64,
    pub amplitude: f64,
    pub base_temperature: f64,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            mean_temperature: 18.0,
            amplitude: 6.0,
            base_temperature: 0.0,
        }
    }
}

impl Weather {
    /// Draws today's thermal time (°Cd), never negative.
    pub fn thermal_time(&self, rng: &mut impl Rng) -> f64 {
        let amplitude = self.amplitude.abs();
        let t = if amplitude > 0.0 {
            let low = self.mean_temperature - amplitude;
            let high = self.mean_temperature + amplitude;
            rng.random_range(low..=high)
        } else {
            self.mean_temperature
        };
        (t - self.base_temperature).max(0.0)
    }
}
