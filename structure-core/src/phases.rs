//! Daily growth phases for the plant structure.
//!
//! The host calls these once per simulated day, in order:
//! 1. [`potential_growth_phase`] — primordia and node appearance,
//!    branching, then plant and branch mortality.
//! 2. [`actual_growth_phase`] — total nodes per plant from the leaf count.
//!
//! [`refresh_height`] and [`reset_stem_population`] are called at
//! host-determined points outside that sequence.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::state::DevelopmentalState;

/// How the start-of-day node number is snapshotted for the branching test.
///
/// A branching cohort appears when the main-stem node number has grown by
/// at least one relative to the snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchingTrigger {
    /// Compare against the raw start-of-day node number: only a single
    /// day's increment of one node or more branches.
    #[default]
    DailyIncrement,
    /// Compare against the start-of-day node number truncated to a whole
    /// node: branches whenever a whole-node boundary is crossed.
    WholeNodeCrossing,
}

impl BranchingTrigger {
    fn snapshot(self, node_number: f64) -> f64 {
        match self {
            BranchingTrigger::DailyIncrement => node_number,
            BranchingTrigger::WholeNodeCrossing => node_number.trunc(),
        }
    }
}

/// Rate values for one potential growth step, read once at the start of
/// the step.
///
/// ### Fields
/// - `thermal_time` - Today's thermal time (°Cd).
/// - `primordia_initiation_rate` - Plastochron (°Cd per primordium).
/// - `node_appearance_rate` - Phyllochron (°Cd per node).
/// - `final_node_number` - Cap for primordia and node numbers.
/// - `branching_rate` - New branches per plant per appeared node.
/// - `branch_mortality` - Daily drought + shade branch mortality (0-1).
/// - `plant_mortality` - Daily whole-plant mortality; `None` skips the
///   pathway entirely.
/// - `on_initialise_day` - Whether today is the initialisation stage day.
/// - `branching_trigger` - Snapshot rule for the branching test.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PotentialGrowthInputs {
    pub thermal_time: f64,
    pub primordia_initiation_rate: f64,
    pub node_appearance_rate: f64,
    pub final_node_number: f64,
    pub branching_rate: f64,
    pub branch_mortality: f64,
    pub plant_mortality: Option<f64>,
    pub on_initialise_day: bool,
    pub branching_trigger: BranchingTrigger,
}

/// What a potential growth step did, for host logging.
///
/// ### Fields
/// - `branched` - A branching cohort appeared today.
/// - `plants_killed` - Plants per m² removed by plant mortality.
/// - `stems_killed_by_plant_mortality` - Stems per m² lost with those plants.
/// - `stems_killed_by_branch_mortality` - Stems per m² lost to drought/shade.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrowthOutcome {
    pub branched: bool,
    pub plants_killed: f64,
    pub stems_killed_by_plant_mortality: f64,
    pub stems_killed_by_branch_mortality: f64,
}

/// Advances primordia, nodes and stem population by one day.
///
/// Strictly in this order:
///
/// 1. Unless today is the initialisation day, accrue primordia at
///    `thermal_time / primordia_initiation_rate` (skipped for a
///    non-positive rate).
/// 2. Snapshot the node number (see [`BranchingTrigger`]).
/// 3. Cap primordia at `final_node_number`.
/// 4. If node appearance has started (`main_stem_node_number > 0`),
///    accrue `thermal_time / node_appearance_rate` (zero for a
///    non-positive rate) and cap at `final_node_number`.
/// 5. On the initialisation day, re-baseline the total stem population to
///    the main-stem population.
/// 6. If the node number grew by at least one against the snapshot, add a
///    branching cohort of `branching_rate` branches per main stem.
/// 7. If a plant mortality rate is supplied, remove that proportion of
///    plants from `population` and the stems they carried.
/// 8. Remove `branch_mortality` of the branch stems, never taking the
///    total stem population below `population`.
///
/// Plant mortality comes before branch mortality: whole-plant death takes
/// entire stem bundles, while drought and shade only thin what is left.
///
/// ### Parameters
/// - `state` - Structure state to advance.
/// - `inputs` - Today's rate values.
/// - `population` - Host-owned plant population (plants per m²); reduced
///   in place by plant mortality.
///
/// ### Returns
/// A [`GrowthOutcome`] describing branching and mortality this step.
pub fn potential_growth_phase(
    state: &mut DevelopmentalState,
    inputs: &PotentialGrowthInputs,
    population: &mut f64,
) -> GrowthOutcome {
    let mut outcome = GrowthOutcome::default();

    if !inputs.on_initialise_day && inputs.primordia_initiation_rate > 0.0 {
        state.main_stem_primordia_number += inputs.thermal_time / inputs.primordia_initiation_rate;
    }

    let start_of_day_node_number = inputs
        .branching_trigger
        .snapshot(state.main_stem_node_number);

    state.main_stem_primordia_number = state
        .main_stem_primordia_number
        .min(inputs.final_node_number);

    if state.main_stem_node_number > 0.0 {
        state.delta_node_number = if inputs.node_appearance_rate > 0.0 {
            inputs.thermal_time / inputs.node_appearance_rate
        } else {
            0.0
        };
        let node_number = state.main_stem_node_number + state.delta_node_number;
        state.main_stem_node_number = node_number.min(inputs.final_node_number);
    }

    if inputs.on_initialise_day {
        state.total_stem_population = state.main_stem_population(*population);
        debug!(
            total_stem_population = state.total_stem_population,
            "Stem population re-baselined at initialisation"
        );
    }

    if state.main_stem_node_number - start_of_day_node_number >= 1.0 {
        state.total_stem_population +=
            inputs.branching_rate * state.main_stem_population(*population);
        state.branch_number += inputs.branching_rate;
        outcome.branched = true;
        debug!(
            node_number = state.main_stem_node_number,
            branch_number = state.branch_number,
            "Branching cohort appeared"
        );
    }

    if let Some(rate) = inputs.plant_mortality {
        let delta_population = *population * rate;
        *population -= delta_population;
        let stems_removed = if *population > 0.0 {
            delta_population * state.total_stem_population / *population
        } else {
            state.total_stem_population
        };
        state.total_stem_population -= stems_removed;
        state.proportion_plant_mortality = rate;
        outcome.plants_killed = delta_population;
        outcome.stems_killed_by_plant_mortality = stems_removed;
        debug!(
            plants_killed = delta_population,
            stems_removed,
            "Plant mortality applied"
        );
    }

    let main_stem_population = state.main_stem_population(*population);
    let branch_stems = state.total_stem_population - main_stem_population;
    let floor = state.total_stem_population - *population;
    let stems_removed = (inputs.branch_mortality * branch_stems).min(floor);
    state.total_stem_population -= stems_removed;
    state.proportion_branch_mortality = inputs.branch_mortality;
    outcome.stems_killed_by_branch_mortality = stems_removed;
    if stems_removed != 0.0 {
        debug!(stems_removed, "Branch mortality applied");
    }

    trace!(
        primordia = state.main_stem_primordia_number,
        nodes = state.main_stem_node_number,
        total_stem_population = state.total_stem_population,
        population = *population,
        "Potential growth step complete"
    );

    outcome
}

/// Updates appeared nodes per plant from the leaf count.
///
/// Leaves the state unchanged when the plant is not alive.
///
/// ### Parameters
/// - `appeared_leaf_number` - Appeared leaves across all axes, per m².
/// - `population` - Plants per m².
pub fn actual_growth_phase(
    state: &mut DevelopmentalState,
    is_alive: bool,
    appeared_leaf_number: f64,
    population: f64,
) {
    if is_alive {
        state.plant_total_node_number = appeared_leaf_number / population;
    }
}

/// Overwrites the cached plant height.
pub fn refresh_height(state: &mut DevelopmentalState, height: f64) {
    state.height = height;
}

/// Re-baselines the total stem population to the main-stem population.
pub fn reset_stem_population(state: &mut DevelopmentalState, population: f64) {
    state.total_stem_population = state.main_stem_population(population);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    /// Quiet day: no accrual, no mortality, generous cap.
    fn quiet_inputs() -> PotentialGrowthInputs {
        PotentialGrowthInputs {
            thermal_time: 0.0,
            primordia_initiation_rate: 50.0,
            node_appearance_rate: 100.0,
            final_node_number: 20.0,
            branching_rate: 0.0,
            branch_mortality: 0.0,
            plant_mortality: None,
            on_initialise_day: false,
            branching_trigger: BranchingTrigger::DailyIncrement,
        }
    }

    fn sown_state(bud_number: f64, total_stem_population: f64) -> DevelopmentalState {
        DevelopmentalState {
            primary_bud_number: bud_number,
            total_stem_population,
            ..DevelopmentalState::default()
        }
    }

    #[test]
    fn primordia_accrue_from_thermal_time() {
        let mut s = sown_state(1.0, 10.0);
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            thermal_time: 20.0,
            primordia_initiation_rate: 40.0,
            ..quiet_inputs()
        };

        potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_close(s.main_stem_primordia_number, 0.5);
    }

    #[test]
    fn primordia_do_not_accrue_on_initialise_day() {
        let mut s = sown_state(1.0, 10.0);
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            thermal_time: 20.0,
            on_initialise_day: true,
            ..quiet_inputs()
        };

        potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_eq!(s.main_stem_primordia_number, 0.0);
    }

    #[test]
    fn non_positive_primordia_rate_is_skipped() {
        let mut s = sown_state(1.0, 10.0);
        s.main_stem_primordia_number = 3.0;
        let mut pop = 10.0;
        for rate in [0.0, -5.0] {
            let inputs = PotentialGrowthInputs {
                thermal_time: 20.0,
                primordia_initiation_rate: rate,
                ..quiet_inputs()
            };
            potential_growth_phase(&mut s, &inputs, &mut pop);
            assert_eq!(s.main_stem_primordia_number, 3.0);
        }
    }

    #[test]
    fn primordia_and_nodes_are_capped_by_final_node_number() {
        let mut s = sown_state(1.0, 10.0);
        s.main_stem_primordia_number = 7.9;
        s.main_stem_node_number = 7.5;
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            thermal_time: 100.0,
            primordia_initiation_rate: 10.0,
            node_appearance_rate: 20.0,
            final_node_number: 8.0,
            ..quiet_inputs()
        };

        potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_eq!(s.main_stem_primordia_number, 8.0);
        assert_eq!(s.main_stem_node_number, 8.0);
        assert_close(s.delta_node_number, 5.0);
    }

    #[test]
    fn lowered_cap_pulls_counters_down() {
        let mut s = sown_state(1.0, 10.0);
        s.main_stem_primordia_number = 10.0;
        s.main_stem_node_number = 9.0;
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            final_node_number: 8.5,
            ..quiet_inputs()
        };

        potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_eq!(s.main_stem_primordia_number, 8.5);
        assert_eq!(s.main_stem_node_number, 8.5);
    }

    #[test]
    fn nodes_stay_at_zero_until_appearance_has_started() {
        let mut s = sown_state(1.0, 10.0);
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            thermal_time: 500.0,
            node_appearance_rate: 1.0,
            ..quiet_inputs()
        };

        potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_eq!(s.main_stem_node_number, 0.0);
        assert_eq!(s.delta_node_number, 0.0);
    }

    #[test]
    fn non_positive_node_rate_gives_zero_delta() {
        let mut s = sown_state(1.0, 10.0);
        s.main_stem_node_number = 2.0;
        s.delta_node_number = 0.4;
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            thermal_time: 20.0,
            node_appearance_rate: 0.0,
            ..quiet_inputs()
        };

        potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_eq!(s.delta_node_number, 0.0);
        assert_eq!(s.main_stem_node_number, 2.0);
    }

    #[test]
    fn sub_one_node_increase_does_not_branch() {
        let mut s = sown_state(1.0, 10.0);
        s.main_stem_node_number = 4.5;
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            thermal_time: 90.0,
            branching_rate: 2.0,
            ..quiet_inputs()
        };

        let outcome = potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_close(s.main_stem_node_number, 5.4);
        assert!(!outcome.branched);
        assert_eq!(s.total_stem_population, 10.0);
        assert_eq!(s.branch_number, 0.0);
    }

    #[test]
    fn one_node_increase_adds_exactly_one_branching_cohort() {
        let mut s = sown_state(1.0, 10.0);
        s.main_stem_node_number = 4.5;
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            thermal_time: 110.0,
            branching_rate: 2.0,
            ..quiet_inputs()
        };

        let outcome = potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_close(s.main_stem_node_number, 5.6);
        assert!(outcome.branched);
        // 2 branches per main stem, 10 main stems per m².
        assert_close(s.total_stem_population, 30.0);
        assert_close(s.branch_number, 2.0);
    }

    #[test]
    fn whole_node_crossing_branches_on_boundary() {
        let mut s = sown_state(1.0, 10.0);
        s.main_stem_node_number = 4.9;
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            thermal_time: 20.0,
            branching_rate: 1.0,
            branching_trigger: BranchingTrigger::WholeNodeCrossing,
            ..quiet_inputs()
        };

        let outcome = potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_close(s.main_stem_node_number, 5.1);
        assert!(outcome.branched);
        assert_close(s.total_stem_population, 20.0);

        // Same boundary under the daily-increment rule does nothing.
        let mut s = sown_state(1.0, 10.0);
        s.main_stem_node_number = 4.9;
        let inputs = PotentialGrowthInputs {
            branching_trigger: BranchingTrigger::DailyIncrement,
            ..inputs
        };
        let outcome = potential_growth_phase(&mut s, &inputs, &mut pop);
        assert!(!outcome.branched);
    }

    #[test]
    fn initialise_day_rebaselines_stem_population() {
        let mut s = sown_state(2.0, 3.0);
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            on_initialise_day: true,
            ..quiet_inputs()
        };

        potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_eq!(s.total_stem_population, 20.0);
    }

    #[test]
    fn plant_mortality_then_branch_mortality_matches_reference() {
        let mut s = sown_state(1.0, 15.0);
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            plant_mortality: Some(0.1),
            branch_mortality: 0.2,
            ..quiet_inputs()
        };

        let outcome = potential_growth_phase(&mut s, &inputs, &mut pop);

        // Plant mortality: 1 plant lost, stems reduced by 1 * 15 / 9.
        assert_close(pop, 9.0);
        assert_close(outcome.plants_killed, 1.0);
        assert_close(outcome.stems_killed_by_plant_mortality, 15.0 / 9.0);
        // Branch mortality: 0.2 * (120/9 - 9), below the 120/9 - 9 floor.
        assert_close(outcome.stems_killed_by_branch_mortality, 0.2 * 39.0 / 9.0);
        assert_close(s.total_stem_population, 112.2 / 9.0);
        assert_eq!(s.proportion_plant_mortality, 0.1);
        assert_eq!(s.proportion_branch_mortality, 0.2);
    }

    #[test]
    fn mortality_order_matters() {
        let mut s = sown_state(1.0, 15.0);
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            plant_mortality: Some(0.1),
            branch_mortality: 0.2,
            ..quiet_inputs()
        };
        potential_growth_phase(&mut s, &inputs, &mut pop);

        // Branch mortality first: 15 - min(0.2 * 5, 5) = 14, then 14 - 14 / 9.
        let reversed = 14.0 - 14.0 / 9.0;
        assert!((s.total_stem_population - reversed).abs() > 1e-3);
    }

    #[test]
    fn absent_plant_mortality_differs_from_zero_rate() {
        let mut absent = sown_state(1.0, 15.0);
        absent.proportion_plant_mortality = 0.3;
        let mut zero = absent;
        let mut pop_absent = 10.0;
        let mut pop_zero = 10.0;

        potential_growth_phase(&mut absent, &quiet_inputs(), &mut pop_absent);
        potential_growth_phase(
            &mut zero,
            &PotentialGrowthInputs {
                plant_mortality: Some(0.0),
                ..quiet_inputs()
            },
            &mut pop_zero,
        );

        assert_eq!(absent.proportion_plant_mortality, 0.3);
        assert_eq!(zero.proportion_plant_mortality, 0.0);
        assert_eq!(pop_absent, 10.0);
        assert_eq!(pop_zero, 10.0);
    }

    #[test]
    fn branch_mortality_is_floored_at_plant_population() {
        // Half a main stem per plant: main stems sit below the plant count.
        let mut s = sown_state(0.5, 12.0);
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            branch_mortality: 1.0,
            ..quiet_inputs()
        };

        let outcome = potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_close(outcome.stems_killed_by_branch_mortality, 2.0);
        assert_close(s.total_stem_population, 10.0);
    }

    #[test]
    fn branch_mortality_above_one_can_drop_below_main_stems() {
        let mut s = sown_state(2.0, 30.0);
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            branch_mortality: 1.5,
            ..quiet_inputs()
        };

        potential_growth_phase(&mut s, &inputs, &mut pop);
        // min(1.5 * (30 - 20), 30 - 10) = 15; the floor is the plant
        // population, not the main-stem population.
        assert_close(s.total_stem_population, 15.0);
        assert!(s.total_stem_population < s.main_stem_population(pop));
    }

    #[test]
    fn extreme_plant_mortality_overshoot_is_restored_by_branch_floor() {
        let mut s = sown_state(1.0, 15.0);
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            plant_mortality: Some(0.6),
            ..quiet_inputs()
        };

        let outcome = potential_growth_phase(&mut s, &inputs, &mut pop);
        // Plant mortality takes 6 * 15 / 4 = 22.5 stems, leaving -7.5.
        assert_close(pop, 4.0);
        assert_close(outcome.stems_killed_by_plant_mortality, 22.5);
        // min(0 * (-7.5 - 4), -7.5 - 4) is negative, so the floor adds the
        // stems back up to the plant population.
        assert_close(outcome.stems_killed_by_branch_mortality, -11.5);
        assert_close(s.total_stem_population, 4.0);
    }

    #[test]
    fn total_plant_mortality_clears_stems() {
        let mut s = sown_state(1.0, 15.0);
        let mut pop = 10.0;
        let inputs = PotentialGrowthInputs {
            plant_mortality: Some(1.0),
            ..quiet_inputs()
        };

        potential_growth_phase(&mut s, &inputs, &mut pop);
        assert_eq!(pop, 0.0);
        assert_eq!(s.total_stem_population, 0.0);
    }

    #[test]
    fn actual_growth_sets_total_nodes_only_when_alive() {
        let mut s = sown_state(1.0, 10.0);
        actual_growth_phase(&mut s, true, 120.0, 10.0);
        assert_eq!(s.plant_total_node_number, 12.0);

        actual_growth_phase(&mut s, false, 500.0, 10.0);
        assert_eq!(s.plant_total_node_number, 12.0);
    }

    #[test]
    fn refresh_height_and_reset_stem_population() {
        let mut s = sown_state(2.0, 55.0);
        refresh_height(&mut s, 420.0);
        assert_eq!(s.height, 420.0);

        reset_stem_population(&mut s, 8.0);
        assert_eq!(s.total_stem_population, 16.0);
    }

    proptest! {
        #[test]
        fn counters_are_monotone_and_capped(
            days in prop::collection::vec(
                (0.0f64..40.0, 1.0f64..200.0, 1.0f64..200.0, 1.0f64..30.0),
                1..60,
            )
        ) {
            let mut s = sown_state(1.0, 10.0);
            s.main_stem_node_number = 1.0;
            let mut pop = 10.0;
            let mut cap = 1.0f64;

            for (thermal_time, plastochron, phyllochron, final_node) in days {
                cap = cap.max(final_node);
                let before = s;
                let inputs = PotentialGrowthInputs {
                    thermal_time,
                    primordia_initiation_rate: plastochron,
                    node_appearance_rate: phyllochron,
                    final_node_number: cap,
                    ..quiet_inputs()
                };
                potential_growth_phase(&mut s, &inputs, &mut pop);

                prop_assert!(s.main_stem_primordia_number >= before.main_stem_primordia_number);
                prop_assert!(s.main_stem_node_number >= before.main_stem_node_number);
                prop_assert!(s.main_stem_primordia_number <= cap);
                prop_assert!(s.main_stem_node_number <= cap);
            }
        }

        #[test]
        fn node_gate_holds_for_any_rate(
            thermal_time in 0.0f64..1000.0,
            phyllochron in -10.0f64..200.0,
        ) {
            let mut s = sown_state(1.0, 10.0);
            let mut pop = 10.0;
            let inputs = PotentialGrowthInputs {
                thermal_time,
                node_appearance_rate: phyllochron,
                ..quiet_inputs()
            };
            potential_growth_phase(&mut s, &inputs, &mut pop);
            prop_assert_eq!(s.main_stem_node_number, 0.0);
        }
    }
}
