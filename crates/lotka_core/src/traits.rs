use num_traits::{Float, FromPrimitive, ToPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the integrator.
/// Must support floating-point arithmetic, debug printing, and conversion
/// to/from f64 (failure diagnostics are reported as f64).
pub trait Scalar: Float + FromPrimitive + ToPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + ToPrimitive + Debug + 'static> Scalar for T {}

/// The right-hand side of an ODE system, y' = f(t, y).
///
/// `t` is passed through for interface compatibility with the stepper even
/// when the system is autonomous and ignores it.
pub trait VectorField<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// state: current state
    /// out: buffer to write the derivative into
    fn eval(&self, t: T, state: &[T], out: &mut [T]);
}
