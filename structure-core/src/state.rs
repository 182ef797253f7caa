use crate::error::{Result, StructureError};

/// Cumulative structural counters for one plant.
///
/// Mutated only by the growth [`crate::phases`] and the
/// [`crate::lifecycle`] transitions. Everything else reads it through
/// [`crate::structure::Structure`].
///
/// ### Fields
/// - `primary_bud_number` - Main-stem axes per sown unit; set at sowing.
/// - `total_stem_population` - Main plus branch stems per m².
/// - `main_stem_primordia_number` - Primordia initiated on the main stem.
/// - `main_stem_node_number` - Nodes appeared on the main stem.
/// - `plant_total_node_number` - Appeared nodes per plant, all axes.
/// - `branch_number` - Branching events per plant, not population weighted.
/// - `proportion_branch_mortality` - Last daily branch mortality rate.
/// - `proportion_plant_mortality` - Last daily plant mortality rate.
/// - `delta_node_number` - Last daily increment of `main_stem_node_number`.
/// - `height` - Last refreshed plant height (mm).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DevelopmentalState {
    pub primary_bud_number: f64,
    pub total_stem_population: f64,
    pub main_stem_primordia_number: f64,
    pub main_stem_node_number: f64,
    pub plant_total_node_number: f64,
    pub branch_number: f64,
    pub proportion_branch_mortality: f64,
    pub proportion_plant_mortality: f64,
    pub delta_node_number: f64,
    pub height: f64,
}

impl DevelopmentalState {
    /// Resets every counter and cached value to zero.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Main stems per m² for the given plant population.
    #[inline]
    pub fn main_stem_population(&self, population: f64) -> f64 {
        population * self.primary_bud_number
    }

    /// Nodes yet to appear on the main stem.
    ///
    /// Not clamped: a transient overshoot shows up as a negative value.
    #[inline]
    pub fn remaining_node_number(&self, final_node_number: f64) -> f64 {
        final_node_number - self.main_stem_node_number
    }

    /// Appeared nodes per primary bud, all axes.
    ///
    /// ### Errors
    /// [`StructureError::ZeroPrimaryBudNumber`] when no season has set the
    /// primary bud number.
    pub fn primary_bud_total_node_number(&self) -> Result<f64> {
        if self.primary_bud_number == 0.0 {
            return Err(StructureError::ZeroPrimaryBudNumber);
        }
        Ok(self.plant_total_node_number / self.primary_bud_number)
    }

    /// Progress of the main stem toward its final node (0-1).
    ///
    /// Returns `0.0` until leaf cohorts are initialised, since the final
    /// node number is not meaningful before then.
    pub fn relative_node_appearance(
        &self,
        cohorts_initialised: bool,
        final_node_number: f64,
    ) -> f64 {
        if !cohorts_initialised {
            return 0.0;
        }
        self.main_stem_node_number / final_node_number
    }
}
