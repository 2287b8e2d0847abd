use thiserror::Error;

/// A caller-side validation failure: a parameter violates the constraints
/// documented on [`crate::params::SimulationParameters`]. The integrator
/// itself never raises this; `run` enforces it before integrating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("sample_count must be at least 2, got {value}")]
    SampleCount { value: usize },
}

/// The adaptive solver could not produce a solution within its tolerance
/// and step budget. Carries the time reached so a caller can report how far
/// the integration got before giving up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationFailure {
    #[error("step budget of {max_steps} exhausted at t = {t}")]
    StepBudgetExhausted { max_steps: usize, t: f64 },
    #[error("step size underflow at t = {t} (h = {h:e})")]
    StepSizeUnderflow { t: f64, h: f64 },
}

/// Umbrella error for the validated `run` pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ParameterError),
    #[error("integration failed: {0}")]
    IntegrationFailure(#[from] IntegrationFailure),
}
