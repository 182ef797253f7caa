use serde::{Deserialize, Serialize};

use crate::functions::{Constant, ScalarFunction, StructureFunctions, Sum};

/// Per-plant settings that are not rates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Phenological stage on whose day node appearance is initialised and
    /// the stem population is re-baselined.
    pub initialise_stage: String,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            initialise_stage: "Emergence".to_string(),
        }
    }
}

/// Constant parameterisation of every rate provider.
///
/// Rates are thermal-time intervals (°Cd per primordium / node); mortality
/// values are daily proportions (0-1).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateParameters {
    /// Plastochron, °Cd per primordium.
    pub primordia_initiation_rate: f64,
    /// Phyllochron, °Cd per node.
    pub node_appearance_rate: f64,
    pub final_node_number: f64,
    /// New branches per plant each time a main-stem node appears.
    pub branching_rate: f64,
    pub drought_branch_mortality: f64,
    pub shade_branch_mortality: f64,
    /// `None` disables the whole-plant mortality pathway.
    pub plant_mortality: Option<f64>,
    /// mm
    pub height: f64,
}

impl Default for RateParameters {
    fn default() -> Self {
        Self {
            primordia_initiation_rate: 60.0,
            node_appearance_rate: 100.0,
            final_node_number: 12.0,
            branching_rate: 1.0,
            drought_branch_mortality: 0.0,
            shade_branch_mortality: 0.0,
            plant_mortality: None,
            height: 0.0,
        }
    }
}

impl RateParameters {
    /// Builds a provider set from these constants.
    ///
    /// Thermal time is always host-driven, so it is passed in. Branch
    /// mortality is the sum of the drought and shade components.
    pub fn into_functions(self, thermal_time: impl ScalarFunction + 'static) -> StructureFunctions {
        StructureFunctions {
            thermal_time: Box::new(thermal_time),
            primordia_initiation_rate: Box::new(Constant(self.primordia_initiation_rate)),
            node_appearance_rate: Box::new(Constant(self.node_appearance_rate)),
            final_node_number: Box::new(Constant(self.final_node_number)),
            height: Box::new(Constant(self.height)),
            branching_rate: Box::new(Constant(self.branching_rate)),
            branch_mortality: Box::new(Sum(vec![
                Box::new(Constant(self.drought_branch_mortality)),
                Box::new(Constant(self.shade_branch_mortality)),
            ])),
            plant_mortality: self
                .plant_mortality
                .map(|m| Box::new(Constant(m)) as Box<dyn ScalarFunction>),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let cfg: StructureConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, StructureConfig::default());

        let rates: RateParameters = serde_json::from_str("{}").unwrap();
        assert_eq!(rates, RateParameters::default());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let rates: RateParameters =
            serde_json::from_str(r#"{"final_node_number": 20.0, "plant_mortality": 0.01}"#)
                .unwrap();
        assert_eq!(rates.final_node_number, 20.0);
        assert_eq!(rates.plant_mortality, Some(0.01));
        assert_eq!(rates.node_appearance_rate, 100.0);
    }

    #[test]
    fn into_functions_sums_branch_mortality_components() {
        let rates = RateParameters {
            drought_branch_mortality: 0.05,
            shade_branch_mortality: 0.15,
            ..RateParameters::default()
        };
        let f = rates.into_functions(Constant(10.0));
        assert!((f.branch_mortality.value() - 0.2).abs() < 1e-12);
        assert_eq!(f.thermal_time.value(), 10.0);
        assert!(f.plant_mortality.is_none());
    }

    #[test]
    fn into_functions_keeps_optional_plant_mortality() {
        let rates = RateParameters {
            plant_mortality: Some(0.0),
            ..RateParameters::default()
        };
        let f = rates.into_functions(Constant(0.0));
        assert_eq!(f.plant_mortality.map(|m| m.value()), Some(0.0));
    }
}
