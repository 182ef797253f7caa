//! Season transitions for one plant: commencing, sowing, ending, thinning,
//! and the start of main-stem node appearance.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{Result, StructureError},
    host::LeafCohorts,
    state::DevelopmentalState,
    types::PlantId,
};

/// Coarse season state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Season {
    #[default]
    Inactive,
    Active,
}

/// Sowing data delivered by the host.
///
/// ### Fields
/// - `plant` - The plant being sown.
/// - `population` - Plants per m².
/// - `bud_number` - Main-stem axes per sown unit.
/// - `max_cover` - Maximum canopy cover; must exceed zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SowingRecord {
    pub plant: PlantId,
    pub population: f64,
    pub bud_number: f64,
    pub max_cover: f64,
}

impl Default for SowingRecord {
    fn default() -> Self {
        Self {
            plant: 0,
            population: 0.0,
            bud_number: 1.0,
            max_cover: 1.0,
        }
    }
}

/// Applies lifecycle events to a [`DevelopmentalState`] on behalf of one
/// plant.
#[derive(Clone, Copy, Debug)]
pub struct LifecycleController {
    plant: PlantId,
    season: Season,
}

impl LifecycleController {
    pub fn new(plant: PlantId) -> Self {
        Self {
            plant,
            season: Season::Inactive,
        }
    }

    pub fn plant(&self) -> PlantId {
        self.plant
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn is_active(&self) -> bool {
        self.season == Season::Active
    }

    /// Simulation start: clears the state. Any season → Inactive.
    pub fn on_simulation_commencing(&mut self, state: &mut DevelopmentalState) {
        state.clear();
        self.season = Season::Inactive;
        debug!(plant = self.plant, "Structure cleared at simulation start");
    }

    /// Starts a season from sowing data.
    ///
    /// Records addressed to another plant are ignored. Otherwise the state
    /// is cleared, then the record validated; on failure the state stays
    /// cleared and the season stays Inactive.
    ///
    /// ### Errors
    /// - [`StructureError::InvalidMaxCover`] when `max_cover <= 0`.
    /// - [`StructureError::InvalidBudNumber`] when `bud_number <= 0`.
    pub fn on_sowing(
        &mut self,
        state: &mut DevelopmentalState,
        sowing: &SowingRecord,
    ) -> Result<()> {
        if sowing.plant != self.plant {
            return Ok(());
        }

        state.clear();
        self.season = Season::Inactive;

        if !(sowing.max_cover > 0.0) {
            warn!(
                plant = self.plant,
                max_cover = sowing.max_cover,
                "Sowing rejected"
            );
            return Err(StructureError::InvalidMaxCover {
                max_cover: sowing.max_cover,
            });
        }
        if !(sowing.bud_number > 0.0) {
            warn!(
                plant = self.plant,
                bud_number = sowing.bud_number,
                "Sowing rejected"
            );
            return Err(StructureError::InvalidBudNumber {
                bud_number: sowing.bud_number,
            });
        }

        state.primary_bud_number = sowing.bud_number;
        state.total_stem_population = sowing.population * state.primary_bud_number;
        self.season = Season::Active;

        info!(
            plant = self.plant,
            population = sowing.population,
            bud_number = sowing.bud_number,
            "Plant sown"
        );
        Ok(())
    }

    /// Plant termination. Only acts on this controller's plant.
    ///
    /// ### Returns
    /// `true` if the state was cleared.
    pub fn on_plant_ending(&mut self, state: &mut DevelopmentalState, plant: PlantId) -> bool {
        if plant != self.plant {
            return false;
        }
        state.clear();
        self.season = Season::Inactive;
        info!(plant = self.plant, "Plant ended");
        true
    }

    /// Removes a proportion of plants and their stems, and forwards the
    /// same proportion to the leaf cohorts.
    ///
    /// ### Errors
    /// - [`StructureError::SeasonInactive`] outside a season.
    /// - [`StructureError::InvalidThinProportion`] unless
    ///   `0 <= proportion_removed <= 1`.
    ///
    /// Both are checked before anything is mutated.
    pub fn thin(
        &self,
        state: &mut DevelopmentalState,
        proportion_removed: f64,
        population: &mut f64,
        leaf: &mut impl LeafCohorts,
    ) -> Result<()> {
        if !self.is_active() {
            return Err(StructureError::SeasonInactive { operation: "thin" });
        }
        if !(0.0..=1.0).contains(&proportion_removed) {
            warn!(plant = self.plant, proportion_removed, "Thinning rejected");
            return Err(StructureError::InvalidThinProportion {
                proportion: proportion_removed,
            });
        }

        let retained = 1.0 - proportion_removed;
        *population *= retained;
        state.total_stem_population *= retained;
        leaf.thin(proportion_removed);

        info!(plant = self.plant, proportion_removed, "Plant thinned");
        Ok(())
    }

    /// Moves the main-stem node number into positive territory so that
    /// daily node accrual can begin. Called by the leaf subsystem when its
    /// cohorts are initialised.
    ///
    /// ### Errors
    /// - [`StructureError::SeasonInactive`] outside a season.
    /// - [`StructureError::InvalidInitialNodeNumber`] unless
    ///   `node_number > 0`.
    pub fn start_node_appearance(
        &self,
        state: &mut DevelopmentalState,
        node_number: f64,
    ) -> Result<()> {
        if !self.is_active() {
            return Err(StructureError::SeasonInactive {
                operation: "start node appearance",
            });
        }
        if !(node_number > 0.0) {
            return Err(StructureError::InvalidInitialNodeNumber { node_number });
        }
        state.main_stem_node_number = node_number;
        debug!(
            plant = self.plant,
            node_number,
            "Main-stem node appearance started"
        );
        Ok(())
    }
}
