pub mod equilibrium;
pub mod error;
pub mod model;
pub mod params;
pub mod simulate;
pub mod solver;
/// The `lotka_core` crate is the simulation engine behind an interactive
/// two-species competition explorer. A hosting UI snapshots a
/// `SimulationParameters` value per run; the engine integrates the
/// competitive Lotka-Volterra equations over the requested horizon and hands
/// back a sampled `Trajectory` plus a qualitative `OutcomeClassification`.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `VectorField` (ODE right-hand sides).
/// - **Model**: `CompetitionModel`, the coupled logistic equations and their Jacobian.
/// - **Solver**: `Dopri5`, an adaptive Dormand-Prince 5(4) stepper with dense output.
/// - **Simulate**: `integrate`, `classify`, and the validated `run` pipeline.
/// - **Equilibrium**: fixed points of the model with eigenvalue stability.
///
/// The engine is stateless and reentrant: concurrent runs with independent
/// parameter sets share nothing.
pub mod traits;

pub use error::{IntegrationFailure, ParameterError, SimulationError};
pub use params::SimulationParameters;
pub use simulate::{
    classify, integrate, run, OutcomeClassification, SimulationReport, Trajectory,
    EXTINCTION_THRESHOLD,
};
