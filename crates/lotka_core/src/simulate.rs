use crate::error::{IntegrationFailure, SimulationError};
use crate::model::CompetitionModel;
use crate::params::SimulationParameters;
use crate::solver::{Dopri5, SolverSettings};
use serde::{Deserialize, Serialize};

/// Populations below one individual count as extinct. Callers working in
/// other units (biomass, densities) should pass their own threshold to
/// [`classify`] instead.
pub const EXTINCTION_THRESHOLD: f64 = 1.0;

/// Both populations sampled on a shared, evenly spaced time grid.
///
/// The integrator does not clamp populations to non-negative values; samples
/// slightly below zero can occur near extinction and are left as-is for the
/// classification threshold to absorb.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub population1: Vec<f64>,
    pub population2: Vec<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The last sampled populations, the only values the classification
    /// reads.
    pub fn final_populations(&self) -> (f64, f64) {
        (
            self.population1[self.population1.len() - 1],
            self.population2[self.population2.len() - 1],
        )
    }
}

/// Qualitative long-run outcome, judged from the final sample only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeClassification {
    BothExtinct,
    Species1ExtinctOnly,
    Species2ExtinctOnly,
    Coexistence,
}

/// A finished run: the sampled trajectory and its classification under the
/// reference extinction threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub trajectory: Trajectory,
    pub outcome: OutcomeClassification,
}

/// Integrates the competition model over `[0, t_max]` and samples it at
/// `sample_count` evenly spaced times, endpoints included.
///
/// Parameters are taken as already validated (see
/// [`SimulationParameters::validate`]); out-of-range values are integrated
/// as given and may yield numerically degenerate output. A solver that runs
/// out of step budget surfaces as [`IntegrationFailure`] rather than partial
/// data.
pub fn integrate(params: &SimulationParameters) -> Result<Trajectory, IntegrationFailure> {
    let model = CompetitionModel::from(params);
    let mut solver = Dopri5::new(2, SolverSettings::default());
    let path = solver.solve(&model, 0.0, params.t_max, &[params.x0, params.y0])?;

    let n = params.sample_count;
    let mut times = Vec::with_capacity(n);
    let mut population1 = Vec::with_capacity(n);
    let mut population2 = Vec::with_capacity(n);
    let mut state = [0.0; 2];
    for i in 0..n {
        let t = params.t_max * (i as f64) / ((n - 1) as f64);
        path.sample_into(t, &mut state);
        times.push(t);
        population1.push(state[0]);
        population2.push(state[1]);
    }

    Ok(Trajectory {
        times,
        population1,
        population2,
    })
}

/// Classifies the long-run outcome from the final sample of a trajectory.
/// Pure and total: any populated trajectory classifies to exactly one
/// variant.
pub fn classify(trajectory: &Trajectory, threshold: f64) -> OutcomeClassification {
    let (final1, final2) = trajectory.final_populations();
    match (final1 < threshold, final2 < threshold) {
        (true, true) => OutcomeClassification::BothExtinct,
        (true, false) => OutcomeClassification::Species1ExtinctOnly,
        (false, true) => OutcomeClassification::Species2ExtinctOnly,
        (false, false) => OutcomeClassification::Coexistence,
    }
}

/// The validated pipeline: checks the parameter constraints, integrates,
/// and classifies with [`EXTINCTION_THRESHOLD`].
pub fn run(params: &SimulationParameters) -> Result<SimulationReport, SimulationError> {
    params.validate()?;
    let trajectory = integrate(params)?;
    let outcome = classify(&trajectory, EXTINCTION_THRESHOLD);
    Ok(SimulationReport {
        trajectory,
        outcome,
    })
}
