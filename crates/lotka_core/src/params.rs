use crate::error::ParameterError;
use serde::{Deserialize, Serialize};

/// One immutable parameter snapshot per simulation run.
///
/// A hosting UI collects these from its controls and hands them over on each
/// trigger; the engine reads them and never mutates or retains them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Intrinsic growth rate of species 1 (> 0).
    pub r1: f64,
    /// Intrinsic growth rate of species 2 (> 0).
    pub r2: f64,
    /// Carrying capacity of species 1 (> 0).
    pub k1: f64,
    /// Carrying capacity of species 2 (> 0).
    pub k2: f64,
    /// Competitive impact of species 2 on species 1 (>= 0).
    pub a: f64,
    /// Competitive impact of species 1 on species 2 (>= 0).
    pub b: f64,
    /// Initial population of species 1 (> 0).
    pub x0: f64,
    /// Initial population of species 2 (> 0).
    pub y0: f64,
    /// Simulation horizon (> 0); the trajectory covers [0, t_max].
    pub t_max: f64,
    /// Number of evenly spaced output samples (>= 2).
    pub sample_count: usize,
}

impl Default for SimulationParameters {
    /// The reference control-panel defaults: mild competition relative to
    /// the carrying capacities, which ends in coexistence.
    fn default() -> Self {
        Self {
            r1: 0.13,
            r2: 0.98,
            k1: 600.0,
            k2: 500.0,
            a: 0.1,
            b: 0.4,
            x0: 100.0,
            y0: 70.0,
            t_max: 100.0,
            sample_count: 101,
        }
    }
}

impl SimulationParameters {
    /// Checks every constraint in the field docs above. `integrate` does not
    /// re-validate, so callers outside the `run` pipeline should call this
    /// themselves before integrating.
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (name, value) in [
            ("r1", self.r1),
            ("r2", self.r2),
            ("k1", self.k1),
            ("k2", self.k2),
            ("x0", self.x0),
            ("y0", self.y0),
            ("t_max", self.t_max),
        ] {
            if !(value > 0.0) {
                return Err(ParameterError::NotPositive { name, value });
            }
        }
        for (name, value) in [("a", self.a), ("b", self.b)] {
            if !(value >= 0.0) {
                return Err(ParameterError::Negative { name, value });
            }
        }
        if self.sample_count < 2 {
            return Err(ParameterError::SampleCount {
                value: self.sample_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SimulationParameters;
    use crate::error::ParameterError;

    #[test]
    fn defaults_are_valid() {
        SimulationParameters::default()
            .validate()
            .expect("reference defaults should validate");
    }

    #[test]
    fn rejects_non_positive_rates_and_capacities() {
        let mut params = SimulationParameters::default();
        params.r1 = 0.0;
        assert_eq!(
            params.validate(),
            Err(ParameterError::NotPositive {
                name: "r1",
                value: 0.0
            })
        );

        let mut params = SimulationParameters::default();
        params.k2 = -5.0;
        assert!(matches!(
            params.validate(),
            Err(ParameterError::NotPositive { name: "k2", .. })
        ));
    }

    #[test]
    fn rejects_negative_competition_coefficients() {
        let mut params = SimulationParameters::default();
        params.b = -0.1;
        assert!(matches!(
            params.validate(),
            Err(ParameterError::Negative { name: "b", .. })
        ));
    }

    #[test]
    fn rejects_nan_fields() {
        let mut params = SimulationParameters::default();
        params.t_max = f64::NAN;
        assert!(params.validate().is_err());

        let mut params = SimulationParameters::default();
        params.a = f64::NAN;
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_degenerate_sample_count() {
        let mut params = SimulationParameters::default();
        params.sample_count = 1;
        assert_eq!(
            params.validate(),
            Err(ParameterError::SampleCount { value: 1 })
        );
    }
}
