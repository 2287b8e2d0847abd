use crate::params::SimulationParameters;
use crate::traits::VectorField;

/// The competitive Lotka-Volterra vector field for two species:
///
/// ```text
/// dx/dt = r1 * x * (1 - (x + a*y) / K1)
/// dy/dt = r2 * y * (1 - (y + b*x) / K2)
/// ```
///
/// Each species grows logistically toward its own carrying capacity, reduced
/// by the other species' population weighted by a competition coefficient.
/// The field is defined for all real states; the adaptive stepper may probe
/// slightly negative populations near zero and callers must tolerate that.
#[derive(Debug, Clone, Copy)]
pub struct CompetitionModel {
    pub r1: f64,
    pub r2: f64,
    pub k1: f64,
    pub k2: f64,
    pub a: f64,
    pub b: f64,
}

impl CompetitionModel {
    /// The Jacobian of the vector field at `(x, y)`, row-major.
    /// Used by the equilibrium stability analysis.
    pub fn jacobian(&self, x: f64, y: f64) -> [f64; 4] {
        [
            self.r1 * (1.0 - (2.0 * x + self.a * y) / self.k1),
            -self.r1 * self.a * x / self.k1,
            -self.r2 * self.b * y / self.k2,
            self.r2 * (1.0 - (2.0 * y + self.b * x) / self.k2),
        ]
    }
}

impl From<&SimulationParameters> for CompetitionModel {
    fn from(params: &SimulationParameters) -> Self {
        Self {
            r1: params.r1,
            r2: params.r2,
            k1: params.k1,
            k2: params.k2,
            a: params.a,
            b: params.b,
        }
    }
}

impl VectorField<f64> for CompetitionModel {
    fn dimension(&self) -> usize {
        2
    }

    fn eval(&self, _t: f64, state: &[f64], out: &mut [f64]) {
        let (x, y) = (state[0], state[1]);
        out[0] = self.r1 * x * (1.0 - (x + self.a * y) / self.k1);
        out[1] = self.r2 * y * (1.0 - (y + self.b * x) / self.k2);
    }
}
