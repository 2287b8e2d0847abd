use crate::model::CompetitionModel;
use anyhow::{bail, Result};
use nalgebra::{Complex, DMatrix};
use serde::{Deserialize, Serialize};

/// Real parts at or inside this band around zero count as marginal rather
/// than strictly stable/unstable.
const MARGINAL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexNumber {
    pub re: f64,
    pub im: f64,
}

impl From<Complex<f64>> for ComplexNumber {
    fn from(value: Complex<f64>) -> Self {
        Self {
            re: value.re,
            im: value.im,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stability {
    /// All eigenvalues have negative real part; nearby trajectories converge.
    Stable,
    /// All eigenvalues have positive real part.
    Unstable,
    /// Real parts of both signs.
    Saddle,
    /// At least one real part within tolerance of zero.
    Marginal,
}

/// A fixed point of the competition model with its linearization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Equilibrium {
    pub state: [f64; 2],
    pub eigenvalues: Vec<ComplexNumber>,
    pub stability: Stability,
}

/// Enumerates the fixed points of the competitive Lotka-Volterra field and
/// classifies each by the eigenvalues of the analytic Jacobian.
///
/// The candidates are the total-extinction origin, the two single-species
/// capacity points, and the interior coexistence point
/// `((K1 - a*K2) / (1 - a*b), (K2 - b*K1) / (1 - a*b))`, which is included
/// only when the denominator is non-degenerate and both coordinates are
/// positive.
pub fn analyze(model: &CompetitionModel) -> Result<Vec<Equilibrium>> {
    if !(model.k1 > 0.0) || !(model.k2 > 0.0) {
        bail!(
            "Carrying capacities must be positive, got K1 = {}, K2 = {}.",
            model.k1,
            model.k2
        );
    }
    if !(model.r1 > 0.0) || !(model.r2 > 0.0) {
        bail!(
            "Growth rates must be positive, got r1 = {}, r2 = {}.",
            model.r1,
            model.r2
        );
    }

    let mut states = vec![[0.0, 0.0], [model.k1, 0.0], [0.0, model.k2]];

    let denom = 1.0 - model.a * model.b;
    if denom.abs() > f64::EPSILON {
        let x_star = (model.k1 - model.a * model.k2) / denom;
        let y_star = (model.k2 - model.b * model.k1) / denom;
        if x_star > 0.0 && y_star > 0.0 {
            states.push([x_star, y_star]);
        }
    }

    states
        .into_iter()
        .map(|state| {
            let jacobian = model.jacobian(state[0], state[1]);
            let matrix = DMatrix::from_row_slice(2, 2, &jacobian);
            let eigenvalues: Vec<ComplexNumber> = matrix
                .complex_eigenvalues()
                .iter()
                .map(|&lambda| ComplexNumber::from(lambda))
                .collect();
            let stability = classify_stability(&eigenvalues);
            Ok(Equilibrium {
                state,
                eigenvalues,
                stability,
            })
        })
        .collect()
}

fn classify_stability(eigenvalues: &[ComplexNumber]) -> Stability {
    if eigenvalues
        .iter()
        .any(|lambda| lambda.re.abs() <= MARGINAL_TOLERANCE)
    {
        return Stability::Marginal;
    }
    let negatives = eigenvalues.iter().filter(|lambda| lambda.re < 0.0).count();
    if negatives == eigenvalues.len() {
        Stability::Stable
    } else if negatives == 0 {
        Stability::Unstable
    } else {
        Stability::Saddle
    }
}
