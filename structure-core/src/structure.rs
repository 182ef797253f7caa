use crate::{
    config::StructureConfig,
    error::Result,
    functions::StructureFunctions,
    host::{LeafCohorts, PopulationSource, StageTracker},
    lifecycle::{LifecycleController, Season, SowingRecord},
    phases::{self, BranchingTrigger, GrowthOutcome, PotentialGrowthInputs},
    state::DevelopmentalState,
    types::PlantId,
};

/// Structural development model for one plant.
///
/// Owns the [`DevelopmentalState`], the rate providers and the season
/// state. The host drives it with explicit calls; within a day the order
/// must be [`Structure::do_potential_growth`] then
/// [`Structure::do_actual_growth`]. Height refreshes and lifecycle events
/// happen wherever the host schedules them.
#[derive(Debug)]
pub struct Structure {
    config: StructureConfig,
    branching_trigger: BranchingTrigger,
    functions: StructureFunctions,
    state: DevelopmentalState,
    lifecycle: LifecycleController,
}

impl Structure {
    pub fn new(plant: PlantId, config: StructureConfig, functions: StructureFunctions) -> Self {
        Self {
            config,
            branching_trigger: BranchingTrigger::default(),
            functions,
            state: DevelopmentalState::default(),
            lifecycle: LifecycleController::new(plant),
        }
    }

    /// Selects how the branching test snapshots the start-of-day node number.
    pub fn with_branching_trigger(mut self, trigger: BranchingTrigger) -> Self {
        self.branching_trigger = trigger;
        self
    }

    /// Reads today's rates from the providers.
    fn potential_inputs(&self, phenology: &impl StageTracker) -> PotentialGrowthInputs {
        let f = &self.functions;
        PotentialGrowthInputs {
            thermal_time: f.thermal_time.value(),
            primordia_initiation_rate: f.primordia_initiation_rate.value(),
            node_appearance_rate: f.node_appearance_rate.value(),
            final_node_number: f.final_node_number.value(),
            branching_rate: f.branching_rate.value(),
            branch_mortality: f.branch_mortality.value(),
            plant_mortality: f.plant_mortality.as_ref().map(|m| m.value()),
            on_initialise_day: phenology.on_day_of(&self.config.initialise_stage),
            branching_trigger: self.branching_trigger,
        }
    }

    /// First daily event. See [`phases::potential_growth_phase`].
    ///
    /// The host population is written back only when the plant mortality
    /// pathway is present.
    pub fn do_potential_growth(
        &mut self,
        plant: &mut impl PopulationSource,
        phenology: &impl StageTracker,
    ) -> GrowthOutcome {
        let inputs = self.potential_inputs(phenology);
        let mut population = plant.population();
        let outcome = phases::potential_growth_phase(&mut self.state, &inputs, &mut population);
        if inputs.plant_mortality.is_some() {
            plant.set_population(population);
        }
        outcome
    }

    /// Second daily event. See [`phases::actual_growth_phase`].
    pub fn do_actual_growth(&mut self, plant: &impl PopulationSource, leaf: &impl LeafCohorts) {
        phases::actual_growth_phase(
            &mut self.state,
            plant.is_alive(),
            leaf.plant_appeared_leaf_number(),
            plant.population(),
        );
    }

    /// Caches the current value of the height provider.
    pub fn update_height(&mut self) {
        phases::refresh_height(&mut self.state, self.functions.height.value());
    }

    pub fn reset_stem_population(&mut self, plant: &impl PopulationSource) {
        phases::reset_stem_population(&mut self.state, plant.population());
    }

    pub fn on_simulation_commencing(&mut self) {
        self.lifecycle.on_simulation_commencing(&mut self.state);
    }

    pub fn on_sowing(&mut self, sowing: &SowingRecord) -> Result<()> {
        self.lifecycle.on_sowing(&mut self.state, sowing)
    }

    pub fn on_plant_ending(&mut self, plant: PlantId) -> bool {
        self.lifecycle.on_plant_ending(&mut self.state, plant)
    }

    /// See [`LifecycleController::thin`]. The host population is only
    /// written on success.
    pub fn thin(
        &mut self,
        proportion_removed: f64,
        plant: &mut impl PopulationSource,
        leaf: &mut impl LeafCohorts,
    ) -> Result<()> {
        let mut population = plant.population();
        self.lifecycle
            .thin(&mut self.state, proportion_removed, &mut population, leaf)?;
        plant.set_population(population);
        Ok(())
    }

    pub fn start_node_appearance(&mut self, node_number: f64) -> Result<()> {
        self.lifecycle
            .start_node_appearance(&mut self.state, node_number)
    }

    // Outputs.

    pub fn plant(&self) -> PlantId {
        self.lifecycle.plant()
    }

    pub fn season(&self) -> Season {
        self.lifecycle.season()
    }

    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    pub fn state(&self) -> &DevelopmentalState {
        &self.state
    }

    pub fn primary_bud_number(&self) -> f64 {
        self.state.primary_bud_number
    }

    /// Main plus branch stems per m².
    pub fn total_stem_population(&self) -> f64 {
        self.state.total_stem_population
    }

    pub fn main_stem_primordia_number(&self) -> f64 {
        self.state.main_stem_primordia_number
    }

    pub fn main_stem_node_number(&self) -> f64 {
        self.state.main_stem_node_number
    }

    /// Appeared nodes per plant, all axes.
    pub fn plant_total_node_number(&self) -> f64 {
        self.state.plant_total_node_number
    }

    /// Main stems per m² at the host's current population.
    pub fn main_stem_population(&self, plant: &impl PopulationSource) -> f64 {
        self.state.main_stem_population(plant.population())
    }

    pub fn main_stem_final_node_number(&self) -> f64 {
        self.functions.final_node_number.value()
    }

    pub fn remaining_node_number(&self) -> f64 {
        self.state
            .remaining_node_number(self.main_stem_final_node_number())
    }

    /// Last refreshed height (mm).
    pub fn height(&self) -> f64 {
        self.state.height
    }

    pub fn primary_bud_total_node_number(&self) -> Result<f64> {
        self.state.primary_bud_total_node_number()
    }

    /// Progress toward the final main-stem node (0-1).
    pub fn relative_node_appearance(&self, leaf: &impl LeafCohorts) -> f64 {
        let final_node_number = self.main_stem_final_node_number();
        self.state
            .relative_node_appearance(leaf.cohorts_initialised(), final_node_number)
    }

    pub fn branch_number(&self) -> f64 {
        self.state.branch_number
    }

    pub fn proportion_branch_mortality(&self) -> f64 {
        self.state.proportion_branch_mortality
    }

    pub fn proportion_plant_mortality(&self) -> f64 {
        self.state.proportion_plant_mortality
    }

    pub fn delta_node_number(&self) -> f64 {
        self.state.delta_node_number
    }
}
